//! Upload slots of the cumulative top-scorers workflow
//!
//! Each slot moves through Empty → Parsed | Failed on every upload attempt and
//! back to Empty after an export attempt or explicit reset.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::scorer::{InputKind, ParsedSource};

/// Named upload position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotId {
    /// Standings up to and including the previous round
    Bron,
    /// Results of the current round
    Uitslagen,
}

impl SlotId {
    /// Declared slots, in merge order
    pub const ALL: [SlotId; 2] = [SlotId::Bron, SlotId::Uitslagen];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotId::Bron => "bron",
            SlotId::Uitslagen => "uitslagen",
        }
    }

    pub fn input_kind(&self) -> InputKind {
        match self {
            SlotId::Bron => InputKind::StandingsDocument,
            SlotId::Uitslagen => InputKind::RoundWorkbook,
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bron" => Ok(SlotId::Bron),
            "uitslagen" => Ok(SlotId::Uitslagen),
            other => Err(format!("Onbekend uploadslot: {}", other)),
        }
    }
}

/// Coarse slot status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotStatus {
    Empty,
    Parsed,
    Failed,
}

/// Failure recorded for a slot: stable machine code plus user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFailure {
    pub code: String,
    pub message: String,
}

/// Slot contents; parsed data exists only in `Parsed`, failure detail only in `Failed`
#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    Empty,
    Parsed(ParsedSource),
    Failed(SlotFailure),
}

/// One upload position owned by a session's slot manager
#[derive(Debug, Clone)]
pub struct UploadSlot {
    pub id: SlotId,
    pub state: SlotState,
    /// Filename of the most recent upload attempt
    pub filename: Option<String>,
}

impl UploadSlot {
    pub fn new(id: SlotId) -> Self {
        Self {
            id,
            state: SlotState::Empty,
            filename: None,
        }
    }

    pub fn status(&self) -> SlotStatus {
        match self.state {
            SlotState::Empty => SlotStatus::Empty,
            SlotState::Parsed(_) => SlotStatus::Parsed,
            SlotState::Failed(_) => SlotStatus::Failed,
        }
    }

    pub fn parsed(&self) -> Option<&ParsedSource> {
        match &self.state {
            SlotState::Parsed(source) => Some(source),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.state = SlotState::Empty;
        self.filename = None;
    }

    pub fn snapshot(&self) -> SlotSnapshot {
        let (records, error) = match &self.state {
            SlotState::Empty => (None, None),
            SlotState::Parsed(source) => (Some(source.len()), None),
            SlotState::Failed(failure) => (None, Some(failure.clone())),
        };

        SlotSnapshot {
            slot: self.id,
            kind: self.id.input_kind(),
            status: self.status(),
            filename: self.filename.clone(),
            records,
            error,
        }
    }
}

/// Result of a single upload attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SlotOutcome {
    Accepted { ok: bool, slot: SlotId, records: usize },
    Rejected { ok: bool, slot: SlotId, code: String, message: String },
}

impl SlotOutcome {
    pub fn accepted(slot: SlotId, records: usize) -> Self {
        SlotOutcome::Accepted {
            ok: true,
            slot,
            records,
        }
    }

    pub fn rejected(slot: SlotId, failure: &SlotFailure) -> Self {
        SlotOutcome::Rejected {
            ok: false,
            slot,
            code: failure.code.clone(),
            message: failure.message.clone(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SlotOutcome::Accepted { .. })
    }
}

/// Serializable view of a slot for the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSnapshot {
    pub slot: SlotId,
    pub kind: InputKind,
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SlotFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_id_round_trips_through_path_names() {
        for id in SlotId::ALL {
            assert_eq!(id.as_str().parse::<SlotId>().unwrap(), id);
        }
        assert_eq!("UITSLAGEN".parse::<SlotId>().unwrap(), SlotId::Uitslagen);
        assert!("derde".parse::<SlotId>().is_err());
    }

    #[test]
    fn test_new_slot_is_empty() {
        let slot = UploadSlot::new(SlotId::Bron);
        assert_eq!(slot.status(), SlotStatus::Empty);
        assert!(slot.parsed().is_none());
        assert_eq!(slot.snapshot().records, None);
    }

    #[test]
    fn test_rejected_outcome_serializes_code_and_message() {
        let failure = SlotFailure {
            code: "EMPTY_FILE".to_string(),
            message: "Leeg bestand".to_string(),
        };
        let json = serde_json::to_value(SlotOutcome::rejected(SlotId::Bron, &failure)).unwrap();

        assert_eq!(json["ok"], false);
        assert_eq!(json["slot"], "bron");
        assert_eq!(json["code"], "EMPTY_FILE");
        assert_eq!(json["message"], "Leeg bestand");
    }
}
