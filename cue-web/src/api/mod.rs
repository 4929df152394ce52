//! HTTP API handlers for cue-web

pub mod buildinfo;
pub mod cumulated;
pub mod health;
pub mod ui;

pub use buildinfo::get_build_info;
pub use cumulated::cumulated_routes;
pub use health::health_routes;
pub use ui::{serve_app_js, serve_index};
