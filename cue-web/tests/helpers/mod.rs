//! Test Helper Utilities
//!
//! Shared fixtures for the cue-web integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod http;

pub use fixtures::{docx_from_paragraphs, round_workbook, MatchRow, RoundTable, STANDINGS_TXT};
pub use http::{multipart_body, session_cookie, MULTIPART_BOUNDARY};
