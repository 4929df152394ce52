//! Data models for cue-web

pub mod scorer;
pub mod slot;

pub use scorer::{InputKind, ParsedSource, ScorerRecord};
pub use slot::{SlotFailure, SlotId, SlotOutcome, SlotSnapshot, SlotState, SlotStatus, UploadSlot};
