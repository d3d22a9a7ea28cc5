// StoreLens - core/recency.rs
//
// "Days since last run" for a report generator, computed from the
// report-execution log.
//
// Run dates come in several textual forms depending on the exporter version.
// The accepted forms are data (`TimestampFormats`), tried in order; a value
// that matches none of them is skipped without affecting the other rows.

use crate::core::model::{LogRow, Recency};
use crate::util::constants;
use chrono::{NaiveDate, NaiveDateTime};

/// Ordered list of chrono format strings accepted for run dates.
///
/// Each format is tried first as a date-time and then as a date-only pattern,
/// so `%Y-%m-%d` and `%m/%d/%y %I:%M:%S %p` can share one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFormats {
    formats: Vec<String>,
}

impl TimestampFormats {
    pub fn new(formats: Vec<String>) -> Self {
        Self { formats }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.formats
    }

    /// Parse `raw` into a calendar date using the first format that matches.
    ///
    /// Returns `None` for unset placeholders and for unrecognised text.
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        if is_unset(trimmed) {
            return None;
        }
        self.formats.iter().find_map(|format| {
            NaiveDateTime::parse_from_str(trimmed, format)
                .map(|dt| dt.date())
                .or_else(|_| NaiveDate::parse_from_str(trimmed, format))
                .ok()
        })
    }
}

impl Default for TimestampFormats {
    fn default() -> Self {
        Self::new(
            constants::TIMESTAMP_FORMATS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

/// True for blank values and exporter placeholders such as `/`, `/ / /` or
/// `  /  /     :  :  `, which carry separators but no digits.
pub fn is_unset(value: &str) -> bool {
    value
        .chars()
        .all(|c| c == '/' || c == ':' || c == '-' || c.is_whitespace())
}

/// Which columns of the report-execution log to read.
#[derive(Debug, Clone, Copy)]
pub struct RunColumns<'a> {
    /// Column naming the executable that ran.
    pub app: &'a str,
    /// Column holding the run timestamp.
    pub run_date: &'a str,
}

/// Days between `reference` and the latest parseable run date of `target`.
///
/// Rows match when their `columns.app` value equals `target` ignoring case
/// and surrounding whitespace. `Recency::Unknown` is returned when nothing
/// matches or no matching row has a parseable date. A run date later than
/// `reference` gives a negative count.
pub fn days_since_last_run(
    rows: &[LogRow],
    columns: RunColumns<'_>,
    target: &str,
    reference: NaiveDate,
    formats: &TimestampFormats,
) -> Recency {
    let target = target.trim();
    let mut latest: Option<NaiveDate> = None;
    let mut skipped: usize = 0;

    for row in rows {
        if !row.get_trimmed(columns.app).eq_ignore_ascii_case(target) {
            continue;
        }
        let raw = row.get_trimmed(columns.run_date);
        match formats.parse_date(raw) {
            Some(date) => {
                latest = Some(match latest {
                    Some(l) if l >= date => l,
                    _ => date,
                });
            }
            None if is_unset(raw) => {}
            None => {
                skipped += 1;
                tracing::debug!(app = target, raw_date = raw, "Skipping unparseable run date");
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(app = target, skipped, "Run dates skipped during recency scan");
    }

    match latest {
        Some(date) => Recency::Days((reference - date).num_days()),
        None => Recency::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: RunColumns<'static> = RunColumns {
        app: "cappname",
        run_date: "rundate",
    };

    fn row(app: &str, date: &str) -> LogRow {
        [("cappname", app), ("rundate", date)].into_iter().collect()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn recency(rows: &[LogRow], target: &str, reference: &str) -> Recency {
        days_since_last_run(
            rows,
            COLUMNS,
            target,
            date(reference),
            &TimestampFormats::default(),
        )
    }

    #[test]
    fn test_latest_of_two_dates() {
        let rows = vec![
            row("INVCOUNT.EXE", "2024-01-01"),
            row("INVCOUNT.EXE", "2024-03-01"),
        ];
        assert_eq!(recency(&rows, "INVCOUNT.EXE", "2024-03-10"), Recency::Days(9));
    }

    #[test]
    fn test_order_of_rows_does_not_matter() {
        let rows = vec![
            row("INVCOUNT.EXE", "2024-03-01"),
            row("INVCOUNT.EXE", "2024-01-01"),
        ];
        assert_eq!(recency(&rows, "INVCOUNT.EXE", "2024-03-10"), Recency::Days(9));
    }

    #[test]
    fn test_target_match_ignores_case_and_whitespace() {
        let rows = vec![row(" invcount.exe ", "2024-03-09")];
        assert_eq!(recency(&rows, "INVCOUNT.EXE", "2024-03-10"), Recency::Days(1));
    }

    #[test]
    fn test_partial_name_does_not_match() {
        let rows = vec![row("INVCOUNT.EXE", "2024-03-09")];
        assert_eq!(recency(&rows, "INVCOUNT", "2024-03-10"), Recency::Unknown);
    }

    #[test]
    fn test_no_matching_row_is_unknown() {
        let rows = vec![row("SUGORDER.EXE", "2024-03-01")];
        assert_eq!(recency(&rows, "INVCOUNT.EXE", "2024-03-10"), Recency::Unknown);
        assert_eq!(recency(&[], "INVCOUNT.EXE", "2024-03-10"), Recency::Unknown);
    }

    #[test]
    fn test_only_unparseable_dates_is_unknown() {
        let rows = vec![
            row("INVCOUNT.EXE", "/ / /"),
            row("INVCOUNT.EXE", "garbage"),
            row("INVCOUNT.EXE", ""),
        ];
        assert_eq!(recency(&rows, "INVCOUNT.EXE", "2024-03-10"), Recency::Unknown);
    }

    #[test]
    fn test_bad_row_does_not_spoil_scan() {
        let rows = vec![
            row("INVCOUNT.EXE", "13/45/24 99:00:00 XM"),
            row("INVCOUNT.EXE", "03/08/24 04:15:00 PM"),
        ];
        assert_eq!(recency(&rows, "INVCOUNT.EXE", "2024-03-10"), Recency::Days(2));
    }

    #[test]
    fn test_same_day_is_zero_not_unknown() {
        let rows = vec![row("SUGORDER.EXE", "03/10/24 11:59:59 PM")];
        assert_eq!(recency(&rows, "SUGORDER.EXE", "2024-03-10"), Recency::Days(0));
    }

    #[test]
    fn test_is_idempotent() {
        let rows = vec![
            row("BDRIPRPT.EXE", "01/02/24 09:00:00 AM"),
            row("BDRIPRPT.EXE", "2024-02-02"),
        ];
        let first = recency(&rows, "BDRIPRPT.EXE", "2024-03-10");
        let second = recency(&rows, "BDRIPRPT.EXE", "2024-03-10");
        assert_eq!(first, second);
        assert_eq!(first, Recency::Days(37));
    }

    #[test]
    fn test_future_run_date_is_negative() {
        let rows = vec![row("INVANAL", "2024-03-12")];
        assert_eq!(recency(&rows, "INVANAL", "2024-03-10"), Recency::Days(-2));
    }

    #[test]
    fn test_missing_date_column_is_unknown() {
        let rows: Vec<LogRow> = vec![[("cappname", "INVANAL")].into_iter().collect()];
        assert_eq!(recency(&rows, "INVANAL", "2024-03-10"), Recency::Unknown);
    }

    #[test]
    fn test_parse_date_formats() {
        let formats = TimestampFormats::default();
        assert_eq!(formats.parse_date("2024-01-15"), Some(date("2024-01-15")));
        assert_eq!(
            formats.parse_date("2024-01-15 23:10:00"),
            Some(date("2024-01-15"))
        );
        assert_eq!(
            formats.parse_date("01/15/24 11:10:00 PM"),
            Some(date("2024-01-15"))
        );
        assert_eq!(
            formats.parse_date("1/5/2024 9:03:00 am"),
            Some(date("2024-01-05"))
        );
        assert_eq!(formats.parse_date("/"), None);
        assert_eq!(formats.parse_date("  /  /     :  :  "), None);
    }

    #[test]
    fn test_custom_format_list() {
        let formats = TimestampFormats::new(vec!["%d.%m.%Y".to_string()]);
        assert_eq!(formats.parse_date("26.02.2024"), Some(date("2024-02-26")));
        assert_eq!(formats.parse_date("2024-02-26"), None);
    }

    #[test]
    fn test_is_unset() {
        assert!(is_unset(""));
        assert!(is_unset("/ / /"));
        assert!(!is_unset("2024-01-01"));
    }
}
