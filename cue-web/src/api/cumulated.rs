//! Cumulative top-scorers workflow endpoints
//!
//! Upload `bron` and `uitslagen` one at a time, then export once both are
//! parsed. All handlers work on the caller's session, attached by the session
//! middleware.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::export::ExportError;
use crate::models::{SlotId, SlotOutcome, SlotSnapshot};
use crate::session::SessionHandle;
use crate::slots::interrupted_failure;
use crate::AppState;

/// Route prefix of the workflow
pub const CUMULATED_PREFIX: &str = "/convert/topscorers-cumulated";

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ready: bool,
    pub slots: Vec<SlotSnapshot>,
}

/// Uploaded file pulled out of the multipart body
struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

async fn read_file_field(multipart: &mut Multipart) -> ApiResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        return Ok(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::NoFile)
}

/// POST /convert/topscorers-cumulated/upload/:slot
pub async fn upload_slot(
    Path(slot): Path<String>,
    Extension(session): Extension<SessionHandle>,
    mut multipart: Multipart,
) -> ApiResult<Json<SlotOutcome>> {
    let slot_id: SlotId = slot.parse().map_err(|_| ApiError::UnknownSlot(slot.clone()))?;
    let file = read_file_field(&mut multipart).await?;

    tracing::info!(
        session_id = %session.id,
        slot = %slot_id,
        filename = %file.filename,
        size = file.bytes.len(),
        "Upload received"
    );

    let mut manager = session.manager.clone().lock_owned().await;
    let outcome = tokio::task::spawn_blocking(move || {
        manager.submit_upload(slot_id, &file.bytes, &file.filename)
    })
    .await
    .map_err(|e| {
        tracing::error!(session_id = %session.id, slot = %slot_id, "Upload task failed: {}", e);
        let failure = interrupted_failure();
        ApiError::Upload {
            code: failure.code,
            message: failure.message,
        }
    })?;

    match outcome {
        SlotOutcome::Rejected { code, message, .. } => Err(ApiError::Upload { code, message }),
        accepted => Ok(Json(accepted)),
    }
}

/// GET /convert/topscorers-cumulated/status
pub async fn slot_status(Extension(session): Extension<SessionHandle>) -> Json<StatusResponse> {
    let manager = session.manager.lock().await;
    Json(StatusResponse {
        ready: manager.is_ready_for_export(),
        slots: manager.snapshot(),
    })
}

/// POST /convert/topscorers-cumulated/reset
pub async fn reset_slots(Extension(session): Extension<SessionHandle>) -> StatusCode {
    session.manager.lock().await.reset();
    tracing::info!(session_id = %session.id, "Upload slots reset on request");
    StatusCode::NO_CONTENT
}

/// POST /convert/topscorers-cumulated/export
///
/// The session lock is held until conversion finishes, so a second export or
/// upload for the same session waits for this one.
pub async fn export_document(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> ApiResult<Response> {
    let mut manager = session.manager.clone().lock_owned().await;
    let orchestrator = state.orchestrator.clone();

    let result = tokio::task::spawn_blocking(move || orchestrator.export_cumulated(&mut manager))
        .await
        .map_err(|e| {
            tracing::error!(session_id = %session.id, "Export task failed: {}", e);
            ExportError::Conversion {
                message: "Onverwachte fout tijdens verwerken.".to_string(),
            }
        })?;

    let document = match result {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(session_id = %session.id, "Export refused: {}", err);
            return Err(err.into());
        }
    };

    tracing::info!(
        session_id = %session.id,
        filename = %document.filename,
        size = document.bytes.len(),
        "Export finished"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.filename),
            ),
        ],
        document.bytes,
    )
        .into_response())
}

/// Workflow routes; expects the session middleware on top
pub fn cumulated_routes() -> Router<AppState> {
    Router::new()
        .route(
            &format!("{}/upload/:slot", CUMULATED_PREFIX),
            post(upload_slot),
        )
        .route(&format!("{}/status", CUMULATED_PREFIX), get(slot_status))
        .route(&format!("{}/reset", CUMULATED_PREFIX), post(reset_slots))
        .route(&format!("{}/export", CUMULATED_PREFIX), post(export_document))
}
