//! Layout of the cumulative standings: sections, rank groups and lines

use std::collections::HashMap;

use super::merge::AggregatedResult;
use crate::models::ScorerRecord;

/// Group used for players without a class heading
pub const FALLBACK_GROUP: &str = "Overig";

/// Sections that come first, in this order; others follow alphabetically
const PREFERRED_ORDER: [&str; 6] = [
    "Derde en vierde divisie",
    "Eerste klasse",
    "Tweede klasse",
    "Derde klasse",
    "Vierde klasse",
    "Vijfde klasse",
];

/// One class heading with its ranked groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub groups: Vec<RankGroup>,
}

/// Players sharing one rank number (same goal count)
///
/// The first line carries the rank and goal count, following lines only the
/// player and club.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankGroup {
    pub rank: usize,
    pub goals: u32,
    pub lines: Vec<String>,
}

/// Split merged totals into ordered sections
pub fn build_sections(result: &AggregatedResult) -> Vec<Section> {
    let mut per_group: HashMap<&str, Vec<&ScorerRecord>> = HashMap::new();
    for record in result.entries() {
        let group = record.group.as_deref().unwrap_or(FALLBACK_GROUP);
        per_group.entry(group).or_default().push(record);
    }

    let mut titles: Vec<&str> = PREFERRED_ORDER
        .iter()
        .copied()
        .filter(|g| per_group.contains_key(g))
        .collect();
    let mut others: Vec<&str> = per_group
        .keys()
        .copied()
        .filter(|g| !PREFERRED_ORDER.contains(g))
        .collect();
    others.sort_unstable();
    titles.extend(others);

    titles
        .into_iter()
        .map(|title| Section {
            title: title.to_string(),
            groups: rank_groups(per_group.remove(title).unwrap_or_default()),
        })
        .collect()
}

fn rank_groups(mut players: Vec<&ScorerRecord>) -> Vec<RankGroup> {
    players.sort_by(|a, b| {
        b.goals
            .cmp(&a.goals)
            .then_with(|| a.team.as_deref().unwrap_or("").cmp(b.team.as_deref().unwrap_or("")))
            .then_with(|| a.player.cmp(&b.player))
    });

    let mut groups: Vec<RankGroup> = Vec::new();
    for player in players {
        match groups.last_mut() {
            Some(group) if group.goals == player.goals => {
                group.lines.push(player_label(player));
            }
            _ => {
                let rank = groups.len() + 1;
                groups.push(RankGroup {
                    rank,
                    goals: player.goals,
                    lines: vec![format!(
                        "{} - {} {}",
                        player_label(player),
                        player.goals,
                        goals_word(player.goals)
                    )],
                });
            }
        }
    }
    groups
}

/// `Name (Club, extra)`; parentheses omitted when there is no club
pub fn player_label(record: &ScorerRecord) -> String {
    let inside = match (record.team.as_deref(), record.extra.as_deref()) {
        (Some(team), Some(extra)) => format!("{}, {}", team, extra),
        (Some(team), None) => team.to_string(),
        _ => String::new(),
    };
    if inside.is_empty() {
        record.player.clone()
    } else {
        format!("{} ({})", record.player, inside)
    }
}

fn goals_word(goals: u32) -> &'static str {
    if goals == 1 {
        "doelpunt"
    } else {
        "doelpunten"
    }
}
