//! Date utilities for download filenames

use chrono::{Local, NaiveDate};

/// Today's local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a date as `YYYYMMDD`
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Build `<YYYYMMDD>_<stem>.<extension>`
pub fn dated_filename(date: NaiveDate, stem: &str, extension: &str) -> String {
    format!("{}_{}.{}", date_stamp(date), stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_stamp_zero_pads() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(date_stamp(date), "20240307");
    }

    #[test]
    fn test_dated_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 23).unwrap();
        assert_eq!(
            dated_filename(date, "cue_word_gecumuleerde_topscorers_amateurs", "docx"),
            "20251123_cue_word_gecumuleerde_topscorers_amateurs.docx"
        );
    }

    #[test]
    fn test_today_is_plausible() {
        let stamp = date_stamp(today());
        assert_eq!(stamp.len(), 8);
        assert!(stamp.starts_with("20"));
    }
}
