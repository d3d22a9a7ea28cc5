// StoreLens - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Everything here can be overridden from config.toml unless noted otherwise.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "StoreLens";

/// Application identifier used for config directories.
pub const APP_ID: &str = "StoreLens";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Object store layout
// =============================================================================

/// Directory that stands in for the bucket when no root is configured.
pub const DEFAULT_STORAGE_ROOT: &str = ".";

/// Prefix under which each store bundle lives as `<prefix><store_id>/...`.
pub const DEFAULT_SOURCE_PREFIX: &str = "processed_csvs/";

/// Prefix for per-store summaries and the combined report.
pub const DEFAULT_REPORT_PREFIX: &str = "store_reports/";

/// Key of the combined report.
pub const DEFAULT_REPORT_KEY: &str = "store_reports/store_summary.csv";

/// Suffix identifying per-store summary artifacts under the report prefix.
pub const STORE_REPORT_SUFFIX: &str = "_summary.csv";

/// Key of the JSON skip report, relative to the report prefix.
pub const SKIP_REPORT_NAME: &str = "skipped_stores.json";

/// Store identity log (store name lives here).
pub const IDENTITY_LOG: &str = "str.csv";

/// Report-execution log (`cappname`, `rundate`).
pub const REPORT_LOG: &str = "reports.csv";

/// Transaction journal log.
pub const JOURNAL_LOG: &str = "jnl.csv";

/// Stock status log.
pub const STOCK_LOG: &str = "stk.csv";

/// Free-form count/flag log.
pub const COUNT_LOG: &str = "cnt.csv";

/// Legacy key/value configuration file.
pub const CONFIG_FILE: &str = "spirits.ini";

// =============================================================================
// Ingestion limits
// =============================================================================

/// Hard upper bound on the configurable per-log row cap.
pub const ABSOLUTE_MAX_ROWS: usize = 50_000_000;

/// Minimum sensible row cap (a cap of zero would discard every log).
pub const MIN_MAX_ROWS: usize = 1;

/// Retry limits for transient I/O errors on object reads.
pub const MAX_READ_RETRIES: u32 = 3;
pub const READ_RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Maximum number of batch-level warnings kept in a `BatchResult`.
pub const MAX_WARNINGS: usize = 1_000;

// =============================================================================
// Legacy configuration parsing
// =============================================================================

/// Section name used when the configuration text has no leading header.
pub const DEFAULT_INI_SECTION: &str = "S";

/// Section whose keys act as fallbacks for every other section.
pub const INI_DEFAULTS_SECTION: &str = "DEFAULT";

// =============================================================================
// Feature rules
// =============================================================================

/// Column aliases recognised as the store name in the identity log.
pub const IDENTITY_NAME_ALIASES: &[&str] = &["NAME", "STORE_NAME", "STORENAME"];

/// Journal categories that denote a line-item discount.
pub const LINE_DISCOUNT_CATEGORIES: &[&str] = &["60", "63"];

/// `rflag` value marking the discount as applied (not reversed).
pub const LINE_DISCOUNT_APPLIED_FLAG: &str = "0";

/// Case-insensitive marker in the journal promotion field for club usage.
pub const CLUB_PROMO_MARKER: &str = "CLUB";

/// Stock status value identifying a kit item.
pub const KIT_STATUS: &str = "9";

/// Configuration location of the return-deposit code.
pub const DEPOSIT_SECTION: &str = "S";
pub const DEPOSIT_KEY: &str = "RtnDeposCode";

/// Deposit codes meaning "not configured". Both values occur in the field.
pub const DEPOSIT_NOT_CONFIGURED: &[&str] = &["99999", "999999"];

/// Count-log code whose data column records corporate polling.
pub const CORP_POLLING_CODE: &str = "CORPPOLL";

/// Accepted run-date formats, tried in order.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%y %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
];

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Levels accepted in `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Whether per-store summaries are written alongside the combined report.
pub const DEFAULT_WRITE_STORE_REPORTS: bool = true;

/// Whether the JSON skip report is written.
pub const DEFAULT_WRITE_SKIP_REPORT: bool = true;
