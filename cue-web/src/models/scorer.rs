//! Top-scorer records and parsed sources

use serde::Serialize;

/// Input family a slot expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Current standings as text or Word document (.txt/.docx/.doc)
    StandingsDocument,
    /// Current round results as Excel workbook (.xlsx/.xls)
    RoundWorkbook,
}

impl InputKind {
    /// Lower-case extensions accepted for this kind
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            InputKind::StandingsDocument => &["txt", "docx", "doc"],
            InputKind::RoundWorkbook => &["xlsx", "xls"],
        }
    }

    /// Check a declared filename against the accepted extensions
    pub fn accepts_filename(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        self.accepted_extensions()
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)))
    }
}

/// One player's goal tally from a single source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScorerRecord {
    pub player: String,
    pub team: Option<String>,
    pub goals: u32,
    /// Class or division heading the player is listed under
    pub group: Option<String>,
    /// Remainder of the parenthesised club text, e.g. a former club
    pub extra: Option<String>,
}

impl ScorerRecord {
    pub fn new(player: impl Into<String>, team: Option<&str>, goals: u32) -> Self {
        Self {
            player: player.into(),
            team: team.map(str::to_string),
            goals,
            group: None,
            extra: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }
}

/// Ordered records extracted from one uploaded file
///
/// Immutable once produced by a converter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSource {
    kind: InputKind,
    records: Vec<ScorerRecord>,
}

impl ParsedSource {
    pub fn new(kind: InputKind, records: Vec<ScorerRecord>) -> Self {
        Self { kind, records }
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn records(&self) -> &[ScorerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
