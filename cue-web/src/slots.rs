//! Per-session upload slot manager
//!
//! Owns the `bron` and `uitslagen` slots of one session. Every upload attempt
//! overwrites its slot: validation and parsing either leave the slot `Parsed`
//! or `Failed`, never half-updated. Other slots are never touched by an upload.

use std::collections::HashMap;

use crate::converters::{parser_for, ConvertError, SourceParser};
use crate::models::{ParsedSource, SlotFailure, SlotId, SlotOutcome, SlotSnapshot, SlotState, UploadSlot};

/// Failure recorded while a parse is in progress; it remains if the parser panics
pub fn interrupted_failure() -> SlotFailure {
    SlotFailure {
        code: "PARSE_ERROR".to_string(),
        message: "Onverwachte fout tijdens verwerken van het bestand.".to_string(),
    }
}

pub struct UploadSlotManager {
    slots: Vec<UploadSlot>,
    parsers: HashMap<SlotId, Box<dyn SourceParser>>,
}

impl UploadSlotManager {
    /// Manager with the default parser for every slot
    pub fn new() -> Self {
        let parsers = SlotId::ALL
            .iter()
            .map(|id| (*id, parser_for(id.input_kind())))
            .collect();
        Self::with_parsers(parsers)
    }

    /// Manager with explicit parsers; slots without a parser use the default
    pub fn with_parsers(mut parsers: HashMap<SlotId, Box<dyn SourceParser>>) -> Self {
        for id in SlotId::ALL {
            parsers
                .entry(id)
                .or_insert_with(|| parser_for(id.input_kind()));
        }
        Self {
            slots: SlotId::ALL.iter().map(|id| UploadSlot::new(*id)).collect(),
            parsers,
        }
    }

    pub fn slot(&self, id: SlotId) -> &UploadSlot {
        // Slots are created for every SlotId in the constructor
        &self.slots[Self::index(id)]
    }

    fn index(id: SlotId) -> usize {
        SlotId::ALL.iter().position(|s| *s == id).unwrap_or(0)
    }

    /// Validate, parse and store one upload
    pub fn submit_upload(&mut self, id: SlotId, bytes: &[u8], filename: &str) -> SlotOutcome {
        let index = Self::index(id);
        self.slots[index].filename = Some(filename.to_string());
        self.slots[index].state = SlotState::Failed(interrupted_failure());

        let result = self.validate_and_parse(id, bytes, filename);
        let slot = &mut self.slots[index];

        match result {
            Ok(source) => {
                let records = source.len();
                slot.state = SlotState::Parsed(source);
                tracing::info!(slot = %id, filename = %filename, records, "Upload parsed");
                SlotOutcome::accepted(id, records)
            }
            Err(err) => {
                let failure = SlotFailure {
                    code: err.code().to_string(),
                    message: err.to_string(),
                };
                tracing::warn!(
                    slot = %id,
                    filename = %filename,
                    code = %failure.code,
                    "Upload rejected: {}",
                    failure.message
                );
                let outcome = SlotOutcome::rejected(id, &failure);
                slot.state = SlotState::Failed(failure);
                outcome
            }
        }
    }

    fn validate_and_parse(
        &self,
        id: SlotId,
        bytes: &[u8],
        filename: &str,
    ) -> Result<ParsedSource, ConvertError> {
        if bytes.is_empty() {
            return Err(ConvertError::EmptyFile);
        }

        let kind = id.input_kind();
        if !kind.accepts_filename(filename) {
            return Err(ConvertError::UnsupportedFile {
                filename: filename.to_string(),
                expected: kind.accepted_extensions().join(", "),
            });
        }

        match self.parsers.get(&id) {
            Some(parser) => parser.parse(bytes, filename),
            None => parser_for(kind).parse(bytes, filename),
        }
    }

    /// True when every slot holds parsed data
    pub fn is_ready_for_export(&self) -> bool {
        self.slots.iter().all(|slot| slot.parsed().is_some())
    }

    /// Parsed sources in merge order, only when every slot is ready
    pub fn parsed_sources(&self) -> Option<Vec<&ParsedSource>> {
        self.slots.iter().map(UploadSlot::parsed).collect()
    }

    /// Return every slot to `Empty`
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }

    pub fn snapshot(&self) -> Vec<SlotSnapshot> {
        self.slots.iter().map(UploadSlot::snapshot).collect()
    }
}

impl Default for UploadSlotManager {
    fn default() -> Self {
        Self::new()
    }
}
