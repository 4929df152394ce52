//! HTTP error type for cue-web
//!
//! Upload failures answer with JSON `{code, message}` so the browser can show
//! the message next to the slot; export failures answer with plain text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::ExportError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Slot name not declared (404)
    #[error("Onbekend uploadslot: {0}")]
    UnknownSlot(String),

    /// Multipart body without a `file` field (400)
    #[error("Geen bestand ontvangen.")]
    NoFile,

    /// Malformed request (400)
    #[error("Ongeldig verzoek: {0}")]
    BadRequest(String),

    /// Upload parsed but rejected by validation or the converter (422)
    #[error("{message}")]
    Upload { code: String, message: String },

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::UnknownSlot(_) => (StatusCode::NOT_FOUND, "UNKNOWN_SLOT"),
            ApiError::NoFile => (StatusCode::BAD_REQUEST, "NO_FILE"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Upload { code, .. } => {
                let body = Json(json!({ "code": code, "message": self.to_string() }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            ApiError::Export(ExportError::NotReady) => {
                return (StatusCode::CONFLICT, self.to_string()).into_response();
            }
            ApiError::Export(ExportError::Conversion { .. }) => {
                return (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response();
            }
        };

        let body = Json(json!({
            "code": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
