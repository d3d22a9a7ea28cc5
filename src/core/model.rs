// StoreLens - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

// =============================================================================
// Log rows (normalised output of the tabular reader)
// =============================================================================

/// One data row of a delimited log: column name -> value, in header order.
///
/// Column names keep their source spelling; lookups ignore ASCII case.
/// Columns missing from a short source row are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogRow {
    fields: Vec<(String, String)>,
}

impl LogRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. A repeated column name shadows nothing: the first
    /// occurrence keeps winning lookups.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.push((column.into(), value.into()));
    }

    /// Case-insensitive column lookup.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }

    /// Lookup with surrounding whitespace removed; absent columns read as "".
    pub fn get_trimmed(&self, column: &str) -> &str {
        self.get(column).map(str::trim).unwrap_or("")
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LogRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A parsed delimited log.
///
/// An absent or empty source produces `Log::default()`, which callers treat
/// as "log absent" rather than an error.
#[derive(Debug, Clone, Default)]
pub struct Log {
    /// Header names from the first line, whitespace-trimmed.
    pub headers: Vec<String>,

    /// Data rows in source order.
    pub rows: Vec<LogRow>,

    /// True when the row cap stopped reading before the end of the source.
    pub truncated: bool,
}

impl Log {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive header check.
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h.eq_ignore_ascii_case(column))
    }
}

// =============================================================================
// Field values
// =============================================================================

/// Boolean usage flag, written as `Y` / `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum YesNo {
    #[serde(rename = "Y")]
    Yes,
    #[serde(rename = "N")]
    No,
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

impl std::fmt::Display for YesNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            YesNo::Yes => "Y",
            YesNo::No => "N",
        })
    }
}

/// Days since a feature was last used.
///
/// `Unknown` means no evidence at all and is written as a blank cell. It is
/// deliberately distinct from `Days(0)` ("used today").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    Days(i64),
    Unknown,
}

impl Recency {
    pub fn days(&self) -> Option<i64> {
        match self {
            Recency::Days(d) => Some(*d),
            Recency::Unknown => None,
        }
    }
}

impl Serialize for Recency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Recency::Days(d) => serializer.serialize_i64(*d),
            Recency::Unknown => serializer.serialize_none(),
        }
    }
}

// =============================================================================
// Store and batch context
// =============================================================================

/// Reference date and reporting window, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    /// Date recency metrics are measured against.
    pub report_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportWindow {
    pub fn new(report_date: NaiveDate) -> Self {
        Self {
            report_date,
            start_date: None,
            end_date: None,
        }
    }
}

/// Identity of the store currently being summarised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreContext {
    /// Storage prefix the bundle was found under.
    pub store_id: String,
    /// Human-readable name from the identity log.
    pub store_name: String,
}

impl StoreContext {
    /// `"<name> (<id>)"`, the value of the report's identity column.
    pub fn display_id(&self) -> String {
        format!("{} ({})", self.store_name, self.store_id)
    }
}

// =============================================================================
// Summary record
// =============================================================================

/// One row of the combined report.
///
/// Field order is the column order of the output table and is identical for
/// every record, so records from one batch always concatenate cleanly.
/// Keep `SummaryRecord::FIELD_NAMES` in step with the declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRecord {
    /// Storage prefix the record was derived from. Not an output column.
    #[serde(skip)]
    pub source_id: String,
    #[serde(rename = "store_id (s3_prefix)")]
    pub store_id: String,
    pub report_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub use_inventory_counting_report: Recency,
    pub use_suggested_order_report: Recency,
    pub use_nj_rips_report: Recency,
    pub use_nj_buydowns_rips_report: Recency,
    pub use_inventory_value_analysis_report: Recency,
    pub use_frequent_shopper_report: Recency,
    pub use_price_level_upcs: YesNo,
    pub use_line_item_discount: YesNo,
    pub use_club_list: YesNo,
    pub use_corp_polling: YesNo,
    pub num_of_stores_in_corp_polling: Option<u32>,
    pub use_kits: YesNo,
    #[serde(rename = "use_TOMRA")]
    pub use_tomra: YesNo,
    pub use_quick_po: Option<YesNo>,
    pub ecom_doordash: Option<YesNo>,
    pub ecom_ubereats: Option<YesNo>,
    pub ecom_cthive: Option<YesNo>,
    pub ecom_winefetch: Option<YesNo>,
    pub ecom_bottlenose: Option<YesNo>,
    pub ecom_bottlecaps: Option<YesNo>,
}

impl SummaryRecord {
    /// Output column names, in order.
    pub const FIELD_NAMES: [&'static str; 24] = [
        "store_id (s3_prefix)",
        "report_date",
        "start_date",
        "end_date",
        "use_inventory_counting_report",
        "use_suggested_order_report",
        "use_nj_rips_report",
        "use_nj_buydowns_rips_report",
        "use_inventory_value_analysis_report",
        "use_frequent_shopper_report",
        "use_price_level_upcs",
        "use_line_item_discount",
        "use_club_list",
        "use_corp_polling",
        "num_of_stores_in_corp_polling",
        "use_kits",
        "use_TOMRA",
        "use_quick_po",
        "ecom_doordash",
        "ecom_ubereats",
        "ecom_cthive",
        "ecom_winefetch",
        "ecom_bottlenose",
        "ecom_bottlecaps",
    ];
}

/// A store left out of the report, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStore {
    pub store_id: String,
    /// `identity_missing` or `derivation_failure`.
    pub kind: String,
    pub reason: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// One record per successfully summarised store, in enumeration order.
    pub records: Vec<SummaryRecord>,
    /// Stores that produced no record.
    pub skipped: Vec<SkippedStore>,
    /// Batch-level diagnostics (listing failures and the like).
    pub warnings: Vec<String>,
}

impl BatchResult {
    pub fn stores_seen(&self) -> usize {
        self.records.len() + self.skipped.len()
    }
}
