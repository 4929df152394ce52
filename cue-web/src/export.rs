//! Export orchestration: merge both slots, render `.docx`, reset the session
//!
//! Once the readiness check passes, the session's slots are reset exactly once
//! on every exit path, including conversion errors and panics.

use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

use crate::converters::{AggregatedResult, DocumentConverter, TopscorersDocxConverter};
use crate::slots::UploadSlotManager;

/// MIME type of the exported document
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Filename stem of the cumulative top-scorers export
pub const EXPORT_STEM: &str = "cue_word_gecumuleerde_topscorers_amateurs";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Upload eerst beide bestanden (bron en uitslagen) voordat je exporteert.")]
    NotReady,

    #[error("{message}")]
    Conversion { message: String },
}

/// Finished export ready for download
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

/// `<YYYYMMDD>_cue_word_gecumuleerde_topscorers_amateurs.docx`
pub fn export_filename(date: NaiveDate) -> String {
    cue_common::time::dated_filename(date, EXPORT_STEM, "docx")
}

/// Resets the borrowed manager when dropped
struct ResetGuard<'a> {
    manager: &'a mut UploadSlotManager,
}

impl<'a> ResetGuard<'a> {
    fn new(manager: &'a mut UploadSlotManager) -> Self {
        Self { manager }
    }

    fn manager(&self) -> &UploadSlotManager {
        self.manager
    }
}

impl Drop for ResetGuard<'_> {
    fn drop(&mut self) {
        self.manager.reset();
        tracing::debug!("Upload slots reset after export");
    }
}

pub struct ExportOrchestrator {
    converter: Arc<dyn DocumentConverter>,
}

impl ExportOrchestrator {
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self { converter }
    }

    /// Merge, convert and name the export using today's local date
    pub fn export_cumulated(
        &self,
        manager: &mut UploadSlotManager,
    ) -> Result<DocumentResult, ExportError> {
        self.export_cumulated_on(manager, cue_common::time::today())
    }

    /// As [`export_cumulated`](Self::export_cumulated) with an explicit date
    pub fn export_cumulated_on(
        &self,
        manager: &mut UploadSlotManager,
        date: NaiveDate,
    ) -> Result<DocumentResult, ExportError> {
        if !manager.is_ready_for_export() {
            return Err(ExportError::NotReady);
        }

        let guard = ResetGuard::new(manager);

        let merged = match guard.manager().parsed_sources() {
            Some(sources) => AggregatedResult::from_sources(sources),
            None => return Err(ExportError::NotReady),
        };
        tracing::info!(players = merged.len(), "Merged cumulative top scorers");

        let bytes = self
            .converter
            .convert(&merged)
            .map_err(|e| ExportError::Conversion {
                message: e.to_string(),
            })?;

        drop(guard);

        Ok(DocumentResult {
            bytes,
            filename: export_filename(date),
            content_type: DOCX_CONTENT_TYPE,
        })
    }
}

impl Default for ExportOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(TopscorersDocxConverter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::ConvertError;
    use crate::models::{SlotId, SlotStatus};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Mutex;

    const STANDINGS: &[u8] = b"Eerste klasse\n1. Jansen (Heer) - 3 doelpunten\n";

    /// Captures the merged result instead of writing a document
    #[derive(Default)]
    struct RecordingConverter {
        seen: Mutex<Option<AggregatedResult>>,
    }

    impl DocumentConverter for RecordingConverter {
        fn convert(&self, result: &AggregatedResult) -> Result<Vec<u8>, ConvertError> {
            *self.seen.lock().unwrap() = Some(result.clone());
            Ok(b"docx".to_vec())
        }
    }

    struct FailingConverter;

    impl DocumentConverter for FailingConverter {
        fn convert(&self, _result: &AggregatedResult) -> Result<Vec<u8>, ConvertError> {
            Err(ConvertError::Document("schijf vol".to_string()))
        }
    }

    struct PanickingConverter;

    impl DocumentConverter for PanickingConverter {
        fn convert(&self, _result: &AggregatedResult) -> Result<Vec<u8>, ConvertError> {
            panic!("converter crashed");
        }
    }

    /// Both slots parsed; the round slot is a second standings-shaped parse
    fn ready_manager() -> UploadSlotManager {
        use crate::converters::{SourceParser, StandingsParser};
        use crate::models::{InputKind, ParsedSource};
        use std::collections::HashMap;

        struct RoundFromText;
        impl SourceParser for RoundFromText {
            fn kind(&self) -> InputKind {
                InputKind::RoundWorkbook
            }
            fn parse(&self, raw: &[u8], _filename: &str) -> Result<ParsedSource, ConvertError> {
                let parsed = StandingsParser.parse(raw, "ronde.txt")?;
                Ok(ParsedSource::new(InputKind::RoundWorkbook, parsed.records().to_vec()))
            }
        }

        let mut parsers: HashMap<SlotId, Box<dyn SourceParser>> = HashMap::new();
        parsers.insert(SlotId::Uitslagen, Box::new(RoundFromText));
        let mut manager = UploadSlotManager::with_parsers(parsers);

        manager.submit_upload(SlotId::Bron, STANDINGS, "stand.txt");
        manager.submit_upload(
            SlotId::Uitslagen,
            b"Eerste klasse\n1. Jansen (Heer) - 2 doelpunten\n2. Bakker (Bunde) - 1 doelpunt\n",
            "ronde.xlsx",
        );
        assert!(manager.is_ready_for_export());
        manager
    }

    fn all_empty(manager: &UploadSlotManager) -> bool {
        manager
            .snapshot()
            .iter()
            .all(|s| s.status == SlotStatus::Empty)
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(
            export_filename(date),
            "20250309_cue_word_gecumuleerde_topscorers_amateurs.docx"
        );
    }

    #[test]
    fn test_not_ready_keeps_parsed_slots() {
        let mut manager = UploadSlotManager::new();
        manager.submit_upload(SlotId::Bron, STANDINGS, "stand.txt");

        let err = ExportOrchestrator::default()
            .export_cumulated(&mut manager)
            .unwrap_err();

        assert_eq!(err, ExportError::NotReady);
        assert_eq!(manager.slot(SlotId::Bron).status(), SlotStatus::Parsed);
    }

    #[test]
    fn test_successful_export_merges_and_resets() {
        let converter = Arc::new(RecordingConverter::default());
        let orchestrator = ExportOrchestrator::new(converter.clone());
        let mut manager = ready_manager();
        let date = NaiveDate::from_ymd_opt(2024, 11, 2).unwrap();

        let document = orchestrator.export_cumulated_on(&mut manager, date).unwrap();

        assert_eq!(document.bytes, b"docx");
        assert_eq!(
            document.filename,
            "20241102_cue_word_gecumuleerde_topscorers_amateurs.docx"
        );
        assert_eq!(document.content_type, DOCX_CONTENT_TYPE);

        let seen = converter.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.goals_for("Jansen", Some("Heer")), Some(5));
        assert_eq!(seen.goals_for("Bakker", Some("Bunde")), Some(1));
        assert!(all_empty(&manager));
    }

    #[test]
    fn test_conversion_failure_still_resets() {
        let orchestrator = ExportOrchestrator::new(Arc::new(FailingConverter));
        let mut manager = ready_manager();

        let err = orchestrator.export_cumulated(&mut manager).unwrap_err();

        assert!(matches!(err, ExportError::Conversion { ref message } if message.contains("schijf vol")));
        assert!(all_empty(&manager));
    }

    #[test]
    fn test_panicking_converter_still_resets() {
        let orchestrator = ExportOrchestrator::new(Arc::new(PanickingConverter));
        let mut manager = ready_manager();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _ = orchestrator.export_cumulated(&mut manager);
        }));

        assert!(outcome.is_err());
        assert!(all_empty(&manager));
    }

    #[test]
    fn test_real_converter_produces_docx() {
        let mut manager = ready_manager();
        let document = ExportOrchestrator::default()
            .export_cumulated(&mut manager)
            .unwrap();

        assert!(document.bytes.starts_with(b"PK"));
        assert!(document.filename.ends_with("_cue_word_gecumuleerde_topscorers_amateurs.docx"));
    }
}
