// StoreLens - core/export.rs
//
// Report artifact encoding: the summary CSV, merging of per-store summary
// tables, and the JSON skip report.
// Core layer: produces bytes; the app layer uploads them.

use crate::core::model::{BatchResult, Log, SkippedStore, SummaryRecord};
use crate::core::reader::{read_log, ReadConfig, TextEncoding};
use crate::util::error::ReportError;
use chrono::NaiveDate;
use serde::Serialize;

/// Encode records as a UTF-8 CSV table.
///
/// The header row is always written, so an empty batch still yields a valid
/// (header-only) report.
pub fn summary_csv(records: &[SummaryRecord], key: &str) -> Result<Vec<u8>, ReportError> {
    let csv_err = |source| ReportError::Csv {
        key: key.to_string(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(SummaryRecord::FIELD_NAMES)
        .map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }

    writer.into_inner().map_err(|e| ReportError::Io {
        key: key.to_string(),
        source: e.into_error(),
    })
}

// =============================================================================
// Combining per-store summaries
// =============================================================================

/// A previously written summary table, read back for combining.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub key: String,
    pub log: Log,
}

impl SummaryTable {
    /// Parse summary bytes. Summaries are always written as UTF-8.
    pub fn parse(key: &str, bytes: &[u8]) -> Self {
        let config = ReadConfig {
            encoding: TextEncoding::Utf8,
            max_rows: None,
        };
        Self {
            key: key.to_string(),
            log: read_log(bytes, &config),
        }
    }
}

/// Outcome of merging summary tables.
#[derive(Debug)]
pub struct CombinedTable {
    pub bytes: Vec<u8>,
    pub rows: usize,
    /// Columns present in some table but not in the combined header.
    pub warnings: Vec<String>,
}

/// Concatenate summary tables under the header of the first non-empty one.
///
/// Cells are matched to the header by column name, so tables whose columns
/// are ordered differently still line up; columns a table lacks are left
/// blank. Returns `Ok(None)` when no table has a header.
pub fn combine_tables(
    tables: &[SummaryTable],
    key: &str,
) -> Result<Option<CombinedTable>, ReportError> {
    let header = match tables.iter().find(|t| !t.log.headers.is_empty()) {
        Some(t) => t.log.headers.clone(),
        None => return Ok(None),
    };

    let csv_err = |source| ReportError::Csv {
        key: key.to_string(),
        source,
    };
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header).map_err(csv_err)?;

    let mut rows = 0;
    let mut warnings = Vec::new();
    for table in tables {
        for extra in table
            .log
            .headers
            .iter()
            .filter(|h| !header.iter().any(|c| c.eq_ignore_ascii_case(h)))
        {
            warnings.push(format!(
                "'{}': column '{extra}' is not in the combined header and was dropped",
                table.key
            ));
        }
        for row in &table.log.rows {
            let cells = header.iter().map(|column| row.get(column).unwrap_or(""));
            writer.write_record(cells).map_err(csv_err)?;
            rows += 1;
        }
    }

    let bytes = writer.into_inner().map_err(|e| ReportError::Io {
        key: key.to_string(),
        source: e.into_error(),
    })?;
    Ok(Some(CombinedTable {
        bytes,
        rows,
        warnings,
    }))
}

// =============================================================================
// Skip report
// =============================================================================

#[derive(Serialize)]
struct SkipReport<'a> {
    report_date: NaiveDate,
    stores_seen: usize,
    records_written: usize,
    skipped: &'a [SkippedStore],
    warnings: &'a [String],
}

/// Pretty-printed JSON listing every skipped store and batch warning.
pub fn skip_report_json(
    result: &BatchResult,
    report_date: NaiveDate,
    key: &str,
) -> Result<Vec<u8>, ReportError> {
    let report = SkipReport {
        report_date,
        stores_seen: result.stores_seen(),
        records_written: result.records.len(),
        skipped: &result.skipped,
        warnings: &result.warnings,
    };
    serde_json::to_vec_pretty(&report).map_err(|e| ReportError::Json {
        key: key.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Recency, YesNo};

    fn make_record(store: &str, days: Recency) -> SummaryRecord {
        SummaryRecord {
            source_id: "1".to_string(),
            store_id: store.to_string(),
            report_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            start_date: None,
            end_date: None,
            use_inventory_counting_report: days,
            use_suggested_order_report: Recency::Unknown,
            use_nj_rips_report: Recency::Unknown,
            use_nj_buydowns_rips_report: Recency::Unknown,
            use_inventory_value_analysis_report: Recency::Unknown,
            use_frequent_shopper_report: Recency::Unknown,
            use_price_level_upcs: YesNo::Yes,
            use_line_item_discount: YesNo::No,
            use_club_list: YesNo::Yes,
            use_corp_polling: YesNo::No,
            num_of_stores_in_corp_polling: None,
            use_kits: YesNo::No,
            use_tomra: YesNo::Yes,
            use_quick_po: None,
            ecom_doordash: None,
            ecom_ubereats: None,
            ecom_cthive: None,
            ecom_winefetch: None,
            ecom_bottlenose: None,
            ecom_bottlecaps: None,
        }
    }

    #[test]
    fn test_field_names_match_serialisation_order() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .serialize(make_record("A (1)", Recency::Unknown))
            .unwrap();
        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let header = output.lines().next().unwrap();
        assert_eq!(header, SummaryRecord::FIELD_NAMES.join(","));
    }

    #[test]
    fn test_summary_csv_rows() {
        let records = vec![
            make_record("Harbor Wines (0042)", Recency::Days(9)),
            make_record("Corner Store (0043)", Recency::Unknown),
        ];
        let bytes = summary_csv(&records, "out.csv").unwrap();
        let output = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("store_id (s3_prefix),report_date,start_date"));
        assert!(lines[0].contains("use_TOMRA"));
        assert!(
            lines[1].starts_with("Harbor Wines (0042),2024-03-10,,,9,,,,,,Y,N,Y,N,,N,Y,"),
            "unexpected row: {}",
            lines[1]
        );
        assert!(lines[2].starts_with("Corner Store (0043),2024-03-10,,,,"));
    }

    #[test]
    fn test_summary_csv_empty_batch_has_header() {
        let output = String::from_utf8(summary_csv(&[], "out.csv").unwrap()).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("store_id (s3_prefix)"));
    }

    #[test]
    fn test_combine_tables_aligns_by_name() {
        let tables = vec![
            SummaryTable::parse("a_summary.csv", b"store,flag\nA,Y\n"),
            SummaryTable::parse("b_summary.csv", b"flag,store,extra\nN,B,zzz\n"),
        ];
        let combined = combine_tables(&tables, "all.csv").unwrap().unwrap();
        let output = String::from_utf8(combined.bytes).unwrap();
        assert_eq!(output, "store,flag\nA,Y\nB,N\n");
        assert_eq!(combined.rows, 2);
        assert_eq!(combined.warnings.len(), 1);
        assert!(combined.warnings[0].contains("extra"));
    }

    #[test]
    fn test_combine_tables_without_headers() {
        let tables = vec![SummaryTable::parse("empty_summary.csv", b"")];
        assert!(combine_tables(&tables, "all.csv").unwrap().is_none());
        assert!(combine_tables(&[], "all.csv").unwrap().is_none());
    }

    #[test]
    fn test_skip_report_json() {
        let result = BatchResult {
            records: vec![make_record("A (1)", Recency::Unknown)],
            skipped: vec![SkippedStore {
                store_id: "2".to_string(),
                kind: "identity_missing".to_string(),
                reason: "store '2': identity missing (identity log absent or empty)".to_string(),
            }],
            warnings: Vec::new(),
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let bytes = skip_report_json(&result, date, "skipped.json").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["stores_seen"], 2);
        assert_eq!(value["records_written"], 1);
        assert_eq!(value["skipped"][0]["kind"], "identity_missing");
        assert_eq!(value["report_date"], "2024-03-10");
    }
}
