//! Upload page state machine
//!
//! Every slot is `Empty`, `Uploading` or `Selected`; the export action is
//! enabled only when every slot is `Selected` and no export is running. The
//! browser script in `ui/app.js` follows the same transitions.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::SlotId;

/// Per-slot state as shown on the upload page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotUiState {
    Empty,
    Uploading { filename: String },
    Selected { filename: String },
}

/// Fallback download names per endpoint when no `Content-Disposition` is sent
const FALLBACK_TEMPLATES: &[(&str, &str)] = &[(
    "/convert/topscorers-cumulated/export",
    "{date}_cue_word_gecumuleerde_topscorers_amateurs.docx",
)];

const DEFAULT_TEMPLATE: &str = "{date}_cue_download.bin";

/// Default label of an empty slot
pub fn default_label(slot: SlotId) -> &'static str {
    match slot {
        SlotId::Bron => "Kies bronbestand (.txt, .docx, .doc)",
        SlotId::Uitslagen => "Kies uitslagenbestand (.xlsx, .xls)",
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Message to show for a failed request
///
/// JSON `{code, message}` bodies yield their message; anything else is shown
/// as text, with a generic fallback for an empty body.
pub fn parse_error_body(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(code) = parsed.code.as_deref() {
            tracing::debug!(code, "Request rejected");
        }
        return parsed.message;
    }
    let text = body.trim();
    if text.is_empty() {
        format!("Verzoek mislukt (HTTP {}).", status)
    } else {
        text.to_string()
    }
}

/// `filename` parameter of a `Content-Disposition` header
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .filter_map(|part| part.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// Name for a downloaded file: the server's choice, else the endpoint template
pub fn download_filename(content_disposition: Option<&str>, endpoint: &str, date: NaiveDate) -> String {
    if let Some(name) = content_disposition.and_then(filename_from_content_disposition) {
        return name;
    }
    let template = FALLBACK_TEMPLATES
        .iter()
        .find(|(path, _)| *path == endpoint)
        .map(|(_, template)| *template)
        .unwrap_or(DEFAULT_TEMPLATE);
    template.replace("{date}", &cue_common::time::date_stamp(date))
}

/// Transition attempted from a state that does not allow it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("Upload eerst beide bestanden.")]
    ExportDisabled,
    #[error("Slot {0} is niet aan het uploaden.")]
    NotUploading(SlotId),
}

#[derive(Debug, Clone)]
pub struct UploadController {
    /// One entry per slot, in `SlotId::ALL` order
    slots: Vec<(SlotId, SlotUiState)>,
    exporting: bool,
    message: Option<String>,
}

impl UploadController {
    pub fn new() -> Self {
        Self {
            slots: SlotId::ALL.iter().map(|id| (*id, SlotUiState::Empty)).collect(),
            exporting: false,
            message: None,
        }
    }

    fn index(slot: SlotId) -> usize {
        SlotId::ALL.iter().position(|s| *s == slot).unwrap_or(0)
    }

    pub fn state(&self, slot: SlotId) -> &SlotUiState {
        &self.slots[Self::index(slot)].1
    }

    fn state_mut(&mut self, slot: SlotId) -> &mut SlotUiState {
        &mut self.slots[Self::index(slot)].1
    }

    /// Text next to the slot's file picker
    pub fn label(&self, slot: SlotId) -> String {
        match self.state(slot) {
            SlotUiState::Empty => default_label(slot).to_string(),
            SlotUiState::Uploading { filename } => format!("{} (bezig met uploaden...)", filename),
            SlotUiState::Selected { filename } => filename.clone(),
        }
    }

    pub fn export_enabled(&self) -> bool {
        !self.exporting
            && self
                .slots
                .iter()
                .all(|(_, state)| matches!(state, SlotUiState::Selected { .. }))
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Last error or status message
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn begin_upload(&mut self, slot: SlotId, filename: &str) {
        self.message = None;
        *self.state_mut(slot) = SlotUiState::Uploading {
            filename: filename.to_string(),
        };
    }

    pub fn upload_succeeded(&mut self, slot: SlotId) -> Result<(), ControllerError> {
        let state = self.state_mut(slot);
        match std::mem::replace(state, SlotUiState::Empty) {
            SlotUiState::Uploading { filename } => {
                *state = SlotUiState::Selected { filename };
                Ok(())
            }
            previous => {
                *state = previous;
                Err(ControllerError::NotUploading(slot))
            }
        }
    }

    /// Back to `Empty` with the server's message surfaced
    pub fn upload_failed(&mut self, slot: SlotId, status: u16, body: &str) {
        *self.state_mut(slot) = SlotUiState::Empty;
        self.message = Some(parse_error_body(status, body));
    }

    pub fn begin_export(&mut self) -> Result<(), ControllerError> {
        if !self.export_enabled() {
            return Err(ControllerError::ExportDisabled);
        }
        self.exporting = true;
        self.message = None;
        Ok(())
    }

    /// The server resets its slots on any started export, so the page does too
    pub fn export_failed(&mut self, status: u16, body: &str) {
        self.reset();
        self.message = Some(parse_error_body(status, body));
    }

    /// Returns the name to save the document under
    pub fn export_succeeded(
        &mut self,
        content_disposition: Option<&str>,
        endpoint: &str,
        date: NaiveDate,
    ) -> String {
        self.reset();
        download_filename(content_disposition, endpoint, date)
    }

    /// All slots empty, labels back to default, export disabled
    pub fn reset(&mut self) {
        for (_, state) in &mut self.slots {
            *state = SlotUiState::Empty;
        }
        self.exporting = false;
        self.message = None;
    }
}

impl Default for UploadController {
    fn default() -> Self {
        Self::new()
    }
}
