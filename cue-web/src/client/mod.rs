//! Client side of the upload workflow
//!
//! [`UploadController`] holds the page state; [`CueClient`] drives it against
//! a running server.

pub mod controller;
pub mod transport;

pub use controller::{download_filename, parse_error_body, ControllerError, SlotUiState, UploadController};
pub use transport::{ClientError, CueClient, Download, RemoteStatus};
