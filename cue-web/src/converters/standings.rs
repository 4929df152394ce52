//! Standings parser for the `bron` upload
//!
//! Expected shape, one block per class:
//!
//! ```text
//! Eerste klasse
//!
//! 1. Jansen (Heer) - 7 doelpunten
//! Bakker (Bunde, v/h Caesar)
//! 2. De Vries (Born) - 5 doelpunten
//! ```
//!
//! Lines without a goal suffix share the count of the previous ranked line.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::merge::{normalize_name, UNKNOWN_SCORER};
use super::ConvertError;
use crate::models::ScorerRecord;

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:(\d+)\.\s*)?(.+?)(?:\s*-\s*(\d+)\s+doelpunt(?:en)?)?\s*$")
        .expect("valid regex")
});

/// Map a class or division heading onto its canonical group name
pub fn canonical_group(header: &str) -> String {
    let h = header.trim();
    let hl = h.to_lowercase();

    if hl.contains("derde en vierde divisie") {
        return "Derde en vierde divisie".to_string();
    }
    for class in [
        "Eerste klasse",
        "Tweede klasse",
        "Derde klasse",
        "Vierde klasse",
        "Vijfde klasse",
    ] {
        if hl.starts_with(&class.to_lowercase()) {
            return class.to_string();
        }
    }
    h.to_string()
}

/// Split `Name (Club, extra, ...)` at the last parenthesis pair
///
/// Returns name, club and the remaining comma-separated parts as extra.
pub fn split_name_club(raw: &str) -> (String, Option<String>, Option<String>) {
    let raw = raw.trim();
    let (Some(open), Some(close)) = (raw.rfind('('), raw.rfind(')')) else {
        return (raw.to_string(), None, None);
    };
    if close < open {
        return (raw.to_string(), None, None);
    }

    let name = raw[..open].trim().to_string();
    let inside = raw[open + 1..close].trim();
    let mut parts = inside.split(',').map(str::trim);
    let club = parts
        .next()
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    let extra = parts.collect::<Vec<_>>().join(", ");
    let extra = if extra.is_empty() { None } else { Some(extra) };

    (name, club, extra)
}

/// Parse standings text into records in source order
///
/// Fails with `PARSE_ERROR` when no player line is found and with
/// `DUPLICATE_PLAYER` when a player is listed twice at the same club.
pub fn parse_standings_text(text: &str) -> Result<Vec<ScorerRecord>, ConvertError> {
    let mut records: Vec<ScorerRecord> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut current_group: Option<String> = None;
    let mut last_goals: Option<u32> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if !line.contains('(') {
            current_group = Some(canonical_group(line));
            last_goals = None;
            continue;
        }

        let Some(caps) = LINE_RE.captures(line) else {
            continue;
        };
        let Some(name_club) = caps.get(2) else {
            continue;
        };
        if let Some(goals) = caps.get(3).and_then(|g| g.as_str().parse::<u32>().ok()) {
            last_goals = Some(goals);
        }
        let Some(goals) = last_goals else {
            tracing::debug!(line = %line, "Skipping player line without goal count");
            continue;
        };

        let (player, team, extra) = split_name_club(name_club.as_str());
        let key = (
            normalize_name(&player),
            normalize_name(team.as_deref().unwrap_or("")),
        );
        // Placeholder scorers may repeat
        if key.0 != UNKNOWN_SCORER && !seen.insert(key) {
            return Err(ConvertError::DuplicatePlayer {
                player,
                team: team.unwrap_or_else(|| "onbekende club".to_string()),
            });
        }

        records.push(ScorerRecord {
            player,
            team,
            goals,
            group: current_group.clone(),
            extra,
        });
    }

    if records.is_empty() {
        return Err(ConvertError::Parse(
            "Geen topscorers gevonden in het bronbestand.".to_string(),
        ));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Derde en vierde divisie

1. Peters (EVV) - 9 doelpunten

EERSTE KLASSE ZONDAG

1. Jansen (Heer) - 7 doelpunten
Bakker (Bunde, v/h Caesar)
2. De Vries (Born) - 1 doelpunt
";

    #[test]
    fn test_canonical_group() {
        assert_eq!(canonical_group("EERSTE KLASSE ZONDAG"), "Eerste klasse");
        assert_eq!(canonical_group("vijfde klasse E"), "Vijfde klasse");
        assert_eq!(
            canonical_group("Topscorers derde en vierde divisie"),
            "Derde en vierde divisie"
        );
        assert_eq!(canonical_group(" Hoofdklasse "), "Hoofdklasse");
    }

    #[test]
    fn test_split_name_club() {
        assert_eq!(
            split_name_club("Bakker (Bunde, v/h Caesar, 2x)"),
            (
                "Bakker".to_string(),
                Some("Bunde".to_string()),
                Some("v/h Caesar, 2x".to_string())
            )
        );
        assert_eq!(
            split_name_club("Jansen"),
            ("Jansen".to_string(), None, None)
        );
        assert_eq!(
            split_name_club("Odd ) name ("),
            ("Odd ) name (".to_string(), None, None)
        );
    }

    #[test]
    fn test_parse_sample() {
        let records = parse_standings_text(SAMPLE).unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].player, "Peters");
        assert_eq!(records[0].group.as_deref(), Some("Derde en vierde divisie"));
        assert_eq!(records[0].goals, 9);

        // Unranked line inherits the count of the line above
        assert_eq!(records[2].player, "Bakker");
        assert_eq!(records[2].team.as_deref(), Some("Bunde"));
        assert_eq!(records[2].extra.as_deref(), Some("v/h Caesar"));
        assert_eq!(records[2].goals, 7);
        assert_eq!(records[2].group.as_deref(), Some("Eerste klasse"));

        assert_eq!(records[3].goals, 1);
    }

    #[test]
    fn test_line_without_any_count_is_skipped() {
        let text = "Tweede klasse\nLos (Heer)\n1. Vast (Born) - 2 doelpunten\n";
        let records = parse_standings_text(text).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].player, "Vast");
    }

    #[test]
    fn test_header_resets_inherited_count() {
        let text = "Eerste klasse\n1. A (Heer) - 4 doelpunten\nTweede klasse\nB (Born)\n";
        let records = parse_standings_text(text).unwrap();

        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_duplicate_player_same_club_is_rejected() {
        let text = "Eerste klasse\n1. Jansen (Heer) - 4 doelpunten\n2. JANSEN  (heer) - 2 doelpunten\n";
        let err = parse_standings_text(text).unwrap_err();

        assert_eq!(err.code(), "DUPLICATE_PLAYER");
    }

    #[test]
    fn test_repeated_unknown_scorer_is_not_a_duplicate() {
        let text = "Eerste klasse\n1. Onbekend (Heer) - 4 doelpunten\n2. onbekend (Heer) - 2 doelpunten\n3. Jansen (Heer) - 1 doelpunt\n";
        let records = parse_standings_text(text).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[2].player, "Jansen");
    }

    #[test]
    fn test_same_name_different_club_is_allowed() {
        let text = "Eerste klasse\n1. Jansen (Heer) - 4 doelpunten\n2. Jansen (Born) - 2 doelpunten\n";
        assert_eq!(parse_standings_text(text).unwrap().len(), 2);
    }

    #[test]
    fn test_no_player_lines_is_parse_error() {
        let err = parse_standings_text("Eerste klasse\nGeen uitslagen\n").unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }
}
