//! # Cue Tools Common Library
//!
//! Shared code for the Cue Tools conversion services:
//! - Error type used by configuration and file helpers
//! - Service configuration resolution (CLI → TOML → compiled defaults)
//! - Date-stamped download filenames

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
