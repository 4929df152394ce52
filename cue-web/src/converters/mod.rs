//! Format converters for the cumulative top-scorers workflow
//!
//! Pure functions behind two narrow contracts:
//! - [`SourceParser`]: uploaded bytes + filename in, [`ParsedSource`] out
//! - [`DocumentConverter`]: [`AggregatedResult`] in, Word document bytes out
//!
//! No converter touches shared state or the filesystem.

pub mod docx;
pub mod merge;
pub mod render;
pub mod round;
pub mod standings;
pub mod text;

use thiserror::Error;

use crate::models::{InputKind, ParsedSource};

pub use merge::AggregatedResult;

/// Converter failure with a stable machine-readable code
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Het bestand is leeg.")]
    EmptyFile,

    #[error("Verkeerd bestandstype '{filename}'. Toegestaan: {expected}.")]
    UnsupportedFile { filename: String, expected: String },

    #[error("{0}")]
    Parse(String),

    #[error("Tabblad '{0}' ontbreekt in het Excelbestand.")]
    MissingSheet(String),

    #[error("De bron-stand bevat '{player}' meerdere keren bij {team}. Pas dit aan en probeer opnieuw.")]
    DuplicatePlayer { player: String, team: String },

    #[error("Kon .doc niet betrouwbaar uitlezen. Sla het bestand op als .docx en upload opnieuw.")]
    UnreadableDoc,

    #[error("Kon Word-document niet opbouwen: {0}")]
    Document(String),
}

impl ConvertError {
    /// Stable identifier reported to clients next to the message
    pub fn code(&self) -> &'static str {
        match self {
            ConvertError::EmptyFile => "EMPTY_FILE",
            ConvertError::UnsupportedFile { .. } => "UNSUPPORTED_FILE",
            ConvertError::Parse(_) => "PARSE_ERROR",
            ConvertError::MissingSheet(_) => "MISSING_SHEET",
            ConvertError::DuplicatePlayer { .. } => "DUPLICATE_PLAYER",
            ConvertError::UnreadableDoc => "UNREADABLE_DOC",
            ConvertError::Document(_) => "DOCUMENT_ERROR",
        }
    }
}

/// Parses one uploaded file into scorer records
pub trait SourceParser: Send + Sync {
    /// Input family this parser understands
    fn kind(&self) -> InputKind;

    /// Parse raw upload bytes; `filename` selects the container format
    fn parse(&self, raw: &[u8], filename: &str) -> Result<ParsedSource, ConvertError>;
}

/// Renders the merged standings as a Word document
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, result: &AggregatedResult) -> Result<Vec<u8>, ConvertError>;
}

/// Standings list from `.txt`, `.docx` or `.doc`
#[derive(Debug, Default, Clone, Copy)]
pub struct StandingsParser;

impl SourceParser for StandingsParser {
    fn kind(&self) -> InputKind {
        InputKind::StandingsDocument
    }

    fn parse(&self, raw: &[u8], filename: &str) -> Result<ParsedSource, ConvertError> {
        let text = text::extract_text_from_upload(raw, filename)?;
        let records = standings::parse_standings_text(&text)?;
        Ok(ParsedSource::new(self.kind(), records))
    }
}

/// Round results from the `INVOER` sheet of an Excel workbook
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundParser;

impl SourceParser for RoundParser {
    fn kind(&self) -> InputKind {
        InputKind::RoundWorkbook
    }

    fn parse(&self, raw: &[u8], _filename: &str) -> Result<ParsedSource, ConvertError> {
        let records = round::parse_round_workbook(raw)?;
        Ok(ParsedSource::new(self.kind(), records))
    }
}

/// Top-scorers standings as `.docx`
#[derive(Debug, Default, Clone, Copy)]
pub struct TopscorersDocxConverter;

impl DocumentConverter for TopscorersDocxConverter {
    fn convert(&self, result: &AggregatedResult) -> Result<Vec<u8>, ConvertError> {
        let sections = render::build_sections(result);
        docx::write_topscorers_docx(&sections)
    }
}

/// Default parser for an input kind
pub fn parser_for(kind: InputKind) -> Box<dyn SourceParser> {
    match kind {
        InputKind::StandingsDocument => Box::new(StandingsParser),
        InputKind::RoundWorkbook => Box::new(RoundParser),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ConvertError::EmptyFile.code(), "EMPTY_FILE");
        assert_eq!(ConvertError::Parse("x".into()).code(), "PARSE_ERROR");
        assert_eq!(ConvertError::MissingSheet("INVOER".into()).code(), "MISSING_SHEET");
        assert_eq!(ConvertError::UnreadableDoc.code(), "UNREADABLE_DOC");
    }

    #[test]
    fn test_parser_for_matches_kind() {
        for kind in [InputKind::StandingsDocument, InputKind::RoundWorkbook] {
            assert_eq!(parser_for(kind).kind(), kind);
        }
    }

    #[test]
    fn test_standings_parser_reads_plain_text() {
        let raw = "Eerste klasse\n1. Jansen (Heer) - 3 doelpunten\n".as_bytes();
        let source = StandingsParser.parse(raw, "stand.txt").unwrap();

        assert_eq!(source.kind(), InputKind::StandingsDocument);
        assert_eq!(source.records()[0].player, "Jansen");
        assert_eq!(source.records()[0].goals, 3);
    }

    #[test]
    fn test_round_parser_rejects_non_workbook_bytes() {
        let err = RoundParser.parse(b"not a workbook", "ronde.xlsx").unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }
}
