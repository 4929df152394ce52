//! Merge of two parsed sources into cumulative totals
//!
//! Identity is (player, team), compared case-insensitively with whitespace
//! collapsed. The first record seen for an identity keeps its spelling, group
//! and extra text; later records only add goals (and fill a missing group).

use std::collections::HashMap;

use crate::models::{ParsedSource, ScorerRecord};

/// Placeholder scorer name used in match reports; never counted
pub const UNKNOWN_SCORER: &str = "onbekend";

/// Collapse whitespace and lower-case for identity comparison
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized (player, team) identity
pub type ScorerKey = (String, String);

fn key_of(record: &ScorerRecord) -> ScorerKey {
    (
        normalize_name(&record.player),
        normalize_name(record.team.as_deref().unwrap_or("")),
    )
}

/// Summed goal counts across sources, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedResult {
    entries: Vec<ScorerRecord>,
}

impl AggregatedResult {
    /// Merge `first` then `second`
    pub fn merge(first: &ParsedSource, second: &ParsedSource) -> Self {
        Self::from_sources([first, second])
    }

    /// Merge any number of sources in the given order
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = &'a ParsedSource>) -> Self {
        let mut entries: Vec<ScorerRecord> = Vec::new();
        let mut index: HashMap<ScorerKey, usize> = HashMap::new();

        for record in sources.into_iter().flat_map(|s| s.records()) {
            if normalize_name(&record.player) == UNKNOWN_SCORER {
                continue;
            }

            match index.get(&key_of(record)) {
                Some(&position) => {
                    let existing = &mut entries[position];
                    existing.goals = existing.goals.saturating_add(record.goals);
                    if existing.group.is_none() {
                        existing.group = record.group.clone();
                    }
                }
                None => {
                    index.insert(key_of(record), entries.len());
                    entries.push(record.clone());
                }
            }
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[ScorerRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Goal totals keyed by normalized identity
    pub fn totals(&self) -> HashMap<ScorerKey, u32> {
        self.entries
            .iter()
            .map(|record| (key_of(record), record.goals))
            .collect()
    }

    /// Total for one player, matched like the merge itself
    pub fn goals_for(&self, player: &str, team: Option<&str>) -> Option<u32> {
        let key = (normalize_name(player), normalize_name(team.unwrap_or("")));
        self.entries
            .iter()
            .find(|record| key_of(record) == key)
            .map(|record| record.goals)
    }
}
