//! Round results parser for the `uitslagen` upload
//!
//! Reads the `INVOER` sheet: division header rows (text in column B,
//! `EINDSTAND` in column F) followed by match rows with home club in B, away
//! club in D and the goal sequence in L, e.g. `Jansen 1-0, Bakker 1-1, en 2-1`.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::Cursor;

use super::merge::{normalize_name, UNKNOWN_SCORER};
use super::standings::canonical_group;
use super::ConvertError;
use crate::models::ScorerRecord;

/// Sheet holding the round results
pub const RESULTS_SHEET: &str = "INVOER";

const COL_HOME: u32 = 2;
const COL_AWAY: u32 = 4;
const COL_MARKER: u32 = 6;
const COL_GOALS: u32 = 12;

static GOAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^,\.]+?)\s+(\d+)-(\d+)").expect("valid regex"));

static REPEAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+-\d+\s+en$").expect("valid regex"));

/// Clubs whose scorers are counted; everything else is an opponent from
/// outside the region
pub const REGION_CLUBS: &[&str] = &[
    "Abdissenbosch", "Achates", "Alfa Sport", "America", "Amstenrade", "BEVO", "BMR",
    "BSV Limburgia", "BVV'27", "Baarlo", "Bekkerveld", "Belfeldia", "Berg'28", "Bieslo",
    "Blerick", "Boekel Sport", "Born", "Brevendia", "Bunde", "Caesar", "Chevremont",
    "Conventus'03", "DBSV", "DES Swalmen", "DESM", "DEV-Arcen", "DFO'20", "DVC'16", "DVO",
    "Daalhof", "De Dem", "De Leeuw", "De Ster", "EMS", "EVV", "Eijsden", "Eikenderveld",
    "Eindse Boys", "FC Bemelen", "FC Geleen Zuid", "FC Gulpen", "FC Hoensbroek",
    "FC Kerkrade-West", "FC Maasgouw", "FC ODA", "FC RIA", "FC Roerdalen", "FCV-Venlo", "FSG",
    "GSV'28", "Geertruidse Boys", "Geulsche Boys", "Geusselt Sport", "Grashoek", "Groene Ster",
    "H.B.S.V.", "Haelen", "Haslou", "Heer", "Hegelsom", "Heijen", "Helden", "Hellas",
    "Holthees-Smakt", "IVO", "IVS", "KSV Horn", "KVC Oranje", "Kakertse Boys", "Keer",
    "Koningslust", "Kronenberg", "Langeberg", "Leonidas-W", "Leunen", "Leveroy",
    "Lindenheuvel-Heidebloem Combinatie", "Linne", "Lottum-GFC'33", "MBC'13", "MMC Weert",
    "MSH Maasduinen", "MVC'19", "Melderslo", "Merefeldia", "Merselo", "Meterik", "Milsbeek",
    "Minor", "Neerbeek", "Oostrum", "PEC'20", "Partij", "Passart-VKC", "RIOS'31", "RKASV",
    "RKAVC", "RKDSO", "RKHBS", "RKHSV", "RKIVV", "RKMSV", "RKMVC", "RKSVB", "RKSVN", "RKSVO",
    "RKSVV", "RKTSV", "RKUVC", "RKVB", "RKVVM", "RVU", "Reuver", "Rimburg", "Roggel",
    "Rood Groen LVC'01", "Roosteren", "SCG", "SHH", "SNA", "SNC'14", "SSS'18", "SV Brunssum",
    "SV Geuldal", "SV Heythuysen", "SV Hulsberg", "SV Laar", "SV Meerssen", "SV Simpelveld",
    "SV United", "SV Venray", "SVC 2000", "SVEB-Sporting S.T.", "SVH'39", "SVM", "SVME",
    "SVOC'01", "Sanderbout", "Schaesberg", "Scharn", "Schimmert", "Schinveld", "Sittard",
    "Slekker Boys", "Sparta'18", "Spaubeek", "Sportclub Jekerdal", "Sportclub Leeuwen",
    "Sportclub Susteren", "Sportclub'25", "Sporting H.A.C.", "Sporting Heerlen", "St. Joost",
    "TSC Irene", "UOW'02", "Urmondia", "VV Hebes", "VV Kessel", "VV Maastricht West",
    "VV Schaesberg", "Vaesrade", "Venlosche Boys", "Veritas", "Vijlen", "Vitesse'08",
    "Voerendaal", "Walram", "Weltania", "Wijnandia", "Willem I", "Wittenhorst",
    "Woander Forest", "Ysselsteyn", "Zwart-Wit'19", "Zwentibold",
];

pub fn is_region_club(club: &str) -> bool {
    REGION_CLUBS.contains(&club)
}

/// Cell content as seen by the round parser
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    /// Numbers, dates, booleans: rendered but never treated as headers
    Other(String),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Rendered value, empty for an empty cell
    pub fn display(&self) -> &str {
        match self {
            Cell::Empty => "",
            Cell::Text(s) | Cell::Other(s) => s,
        }
    }
}

/// 1-indexed read access to a worksheet
pub trait SheetGrid {
    fn max_row(&self) -> u32;
    fn cell(&self, row: u32, col: u32) -> Cell;
}

impl SheetGrid for Range<Data> {
    fn max_row(&self) -> u32 {
        self.end().map(|(row, _)| row + 1).unwrap_or(0)
    }

    fn cell(&self, row: u32, col: u32) -> Cell {
        if row == 0 || col == 0 {
            return Cell::Empty;
        }
        match self.get_value((row - 1, col - 1)) {
            None | Some(Data::Empty) => Cell::Empty,
            Some(Data::String(s)) if s.is_empty() => Cell::Empty,
            Some(Data::String(s)) => Cell::Text(s.clone()),
            Some(other) => Cell::Other(other.to_string()),
        }
    }
}

fn is_cup_marker(cell: &Cell) -> bool {
    cell.as_text()
        .map(|s| s.trim().eq_ignore_ascii_case("beker"))
        .unwrap_or(false)
}

/// Fold third and fourth division headings into one group
pub fn normalize_division_name(division: &str) -> String {
    let upper = division.to_uppercase();
    if upper.contains("DERDE DIVISIE") || upper.contains("VIERDE DIVISIE") {
        "Derde en vierde divisie".to_string()
    } else {
        division.to_string()
    }
}

/// Credit the goals in a match's goal sequence to (player, club, goals)
///
/// One entry per scoring step; a player scoring twice in separate steps
/// appears twice, a multi-goal jump is one entry carrying the jump.
pub fn parse_goals_cell(text: &str, home: &str, away: &str) -> Vec<(String, String, u32)> {
    let mut credited = Vec::new();
    let mut last_player: Option<String> = None;
    let mut last_end = 0;
    let (mut prev_home, mut prev_away) = (0u32, 0u32);

    for caps in GOAL_RE.captures_iter(text) {
        let (Some(name_match), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        let score = (
            caps[2].parse::<u32>().ok(),
            caps[3].parse::<u32>().ok(),
        );
        let context = text[last_end..whole.end()].to_lowercase();
        last_end = whole.end();

        let (Some(home_goals), Some(away_goals)) = score else {
            tracing::debug!(sequence = %text, "Unreadable score in goal sequence");
            continue;
        };

        if context.contains("eigen doelpunt") || context.contains("ed.") {
            prev_home = home_goals;
            prev_away = away_goals;
            continue;
        }

        let raw_name = name_match.as_str().trim();
        if !home.is_empty() && !away.is_empty() && raw_name.contains(home) && raw_name.contains(away)
        {
            continue;
        }

        let mut name = raw_name;
        while name.starts_with('(') {
            match name.find(')') {
                Some(close) => name = name[close + 1..].trim(),
                None => break,
            }
        }

        let lower = name.to_lowercase();
        let name = if lower == "en" || REPEAT_RE.is_match(&lower) {
            match &last_player {
                Some(previous) => previous.clone(),
                None => {
                    tracing::debug!(sequence = %text, "'en' without a previous scorer");
                    continue;
                }
            }
        } else {
            let stripped = if lower.starts_with("en ") {
                name[3..].trim()
            } else {
                name
            };
            last_player = Some(stripped.to_string());
            stripped.to_string()
        };

        if normalize_name(&name) == UNKNOWN_SCORER {
            prev_home = home_goals;
            prev_away = away_goals;
            continue;
        }

        let repeat = last_player.as_deref() == Some(name.as_str());
        let scored = match (
            home_goals.checked_sub(prev_home),
            away_goals.checked_sub(prev_away),
        ) {
            (Some(1), Some(0)) => Some((home, 1)),
            (Some(0), Some(1)) => Some((away, 1)),
            (Some(steps), Some(0)) if steps > 1 && repeat => Some((home, steps)),
            (Some(0), Some(steps)) if steps > 1 && repeat => Some((away, steps)),
            _ => None,
        };

        match scored {
            Some((club, steps)) => credited.push((name.clone(), club.to_string(), steps)),
            None => {
                tracing::debug!(
                    player = %name,
                    from = %format!("{}-{}", prev_home, prev_away),
                    to = %format!("{}-{}", home_goals, away_goals),
                    "Skipping goal with unexpected score step"
                );
            }
        }
        prev_home = home_goals;
        prev_away = away_goals;
    }

    credited
}

/// Goals per (player, club) and the division each was first seen in
#[derive(Debug, Default)]
struct RoundTally {
    order: Vec<(String, String, String)>,
    goals: HashMap<(String, String), u32>,
}

impl RoundTally {
    fn credit(&mut self, player: String, club: String, division: &str, count: u32) {
        let key = (player, club);
        match self.goals.get_mut(&key) {
            Some(goals) => *goals = goals.saturating_add(count),
            None => {
                self.order.push((key.0.clone(), key.1.clone(), division.to_string()));
                self.goals.insert(key, count);
            }
        }
    }

    fn into_records(self) -> Vec<ScorerRecord> {
        let RoundTally { order, goals } = self;
        order
            .into_iter()
            .map(|(player, club, division)| {
                let count = goals.get(&(player.clone(), club.clone())).copied().unwrap_or(0);
                ScorerRecord::new(player, Some(club.as_str()), count)
                    .with_group(canonical_group(&division))
            })
            .collect()
    }
}

/// Collect regional goal scorers from every division table in the sheet
pub fn collect_round_records(sheet: &impl SheetGrid) -> Vec<ScorerRecord> {
    let max_row = sheet.max_row();

    let mut headers = Vec::new();
    for row in 1..=max_row {
        let label = sheet.cell(row, COL_HOME);
        if is_cup_marker(&label) {
            break;
        }
        let is_header = label.as_text().is_some()
            && sheet.cell(row, COL_MARKER).as_text() == Some("EINDSTAND");
        if is_header {
            headers.push(row);
        }
    }

    let mut tally = RoundTally::default();
    for header in headers {
        let division = normalize_division_name(sheet.cell(header, COL_HOME).display().trim());
        let mut matches = 0usize;

        for row in header + 1..=max_row {
            let home = sheet.cell(row, COL_HOME);
            if is_cup_marker(&home) {
                break;
            }
            let away = sheet.cell(row, COL_AWAY);
            if home.is_empty() && away.is_empty() {
                break;
            }
            matches += 1;

            let goals = sheet.cell(row, COL_GOALS);
            if goals.is_empty() {
                continue;
            }
            for (player, club, count) in
                parse_goals_cell(goals.display(), home.display(), away.display())
            {
                let player = player.trim().to_string();
                let club = club.trim().to_string();
                if is_region_club(&club) {
                    tally.credit(player, club, &division, count);
                }
            }
        }

        tracing::debug!(division = %division, matches, "Read division table");
    }

    tally.into_records()
}

/// Parse an `.xlsx`/`.xls` upload
pub fn parse_round_workbook(raw: &[u8]) -> Result<Vec<ScorerRecord>, ConvertError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(raw.to_vec()))
        .map_err(|e| ConvertError::Parse(format!("Kon Excelbestand niet openen: {}", e)))?;

    if !workbook.sheet_names().iter().any(|name| name == RESULTS_SHEET) {
        return Err(ConvertError::MissingSheet(RESULTS_SHEET.to_string()));
    }

    let range = workbook
        .worksheet_range(RESULTS_SHEET)
        .map_err(|e| ConvertError::Parse(format!("Kon tabblad {} niet lezen: {}", RESULTS_SHEET, e)))?;

    Ok(collect_round_records(&range))
}
