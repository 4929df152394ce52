//! HTTP client for the cumulative top-scorers workflow
//!
//! Drives an [`UploadController`] through a real upload/export round trip.
//! The session cookie issued on the first request is kept in the client's
//! cookie store, so both uploads and the export share one server session.

use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

use super::controller::{ControllerError, UploadController};
use crate::api::cumulated::CUMULATED_PREFIX;
use crate::models::{SlotId, SlotStatus};

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection or protocol failure; shown as-is
    #[error("Verbinding met de server mislukt: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error status
    #[error("{message} (HTTP {status})")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Document returned by an export
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Slot row of the status endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSlot {
    pub slot: SlotId,
    pub status: SlotStatus,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub records: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStatus {
    pub ready: bool,
    pub slots: Vec<RemoteSlot>,
}

pub struct CueClient {
    http: reqwest::Client,
    base_url: String,
    controller: UploadController,
}

impl CueClient {
    /// Client for a server at `base_url`, e.g. `http://127.0.0.1:8000`
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            controller: UploadController::new(),
        })
    }

    pub fn controller(&self) -> &UploadController {
        &self.controller
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, CUMULATED_PREFIX, path)
    }

    /// Upload one file into a slot
    pub async fn upload(
        &mut self,
        slot: SlotId,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ClientError> {
        self.controller.begin_upload(slot, filename);

        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()));
        let response = match self
            .http
            .post(self.url(&format!("/upload/{}", slot)))
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.controller.reset();
                return Err(e.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            self.controller.upload_succeeded(slot)?;
            tracing::info!(slot = %slot, filename = %filename, "Upload accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        self.controller.upload_failed(slot, status.as_u16(), &body);
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message: self.controller.message().unwrap_or_default().to_string(),
        })
    }

    /// Export the merged standings; the controller resets whatever the outcome
    pub async fn export(&mut self) -> Result<Download, ClientError> {
        self.controller.begin_export()?;
        let endpoint = format!("{}/export", CUMULATED_PREFIX);

        let response = match self.http.post(self.url("/export")).send().await {
            Ok(response) => response,
            Err(e) => {
                self.controller.reset();
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.controller.export_failed(status.as_u16(), &body);
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message: self.controller.message().unwrap_or_default().to_string(),
            });
        }

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                self.controller.reset();
                return Err(e.into());
            }
        };

        let filename = self.controller.export_succeeded(
            content_disposition.as_deref(),
            &endpoint,
            cue_common::time::today(),
        );
        tracing::info!(filename = %filename, size = bytes.len(), "Export downloaded");

        Ok(Download { filename, bytes })
    }

    /// Server-side view of this client's session
    pub async fn status(&self) -> Result<RemoteStatus, ClientError> {
        let response = self.http.get(self.url("/status")).send().await?;
        Ok(response.error_for_status()?.json::<RemoteStatus>().await?)
    }

    /// Clear the slots on both sides
    pub async fn reset(&mut self) -> Result<(), ClientError> {
        self.controller.reset();
        self.http
            .post(self.url("/reset"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
