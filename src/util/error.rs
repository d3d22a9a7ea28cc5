// StoreLens - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every error keeps its cause so the
// diagnostic log shows the full chain.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all StoreLens operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum StoreLensError {
    /// Object store listing, read, or write failed.
    Storage(StorageError),

    /// Legacy configuration text could not be parsed.
    Ini(IniError),

    /// A single store could not be summarised.
    Store(StoreError),

    /// Report serialisation or upload failed.
    Report(ReportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for StoreLensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {e}"),
            Self::Ini(e) => write!(f, "INI parse error: {e}"),
            Self::Store(e) => write!(f, "Store error: {e}"),
            Self::Report(e) => write!(f, "Report error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for StoreLensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::Ini(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Report(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors raised by an object store collaborator.
#[derive(Debug)]
pub enum StorageError {
    /// No object exists under the key.
    NotFound { key: String },

    /// I/O error with key context.
    Io {
        key: String,
        operation: &'static str,
        source: io::Error,
    },

    /// Directory traversal failed while listing a prefix.
    Traversal {
        prefix: String,
        source: walkdir::Error,
    },
}

impl StorageError {
    /// True when the object is simply absent, as opposed to unreadable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { key } => write!(f, "object '{key}' not found"),
            Self::Io {
                key,
                operation,
                source,
            } => write!(f, "I/O error during {operation} of '{key}': {source}"),
            Self::Traversal { prefix, source } => {
                write!(f, "error listing prefix '{prefix}': {source}")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Traversal { source, .. } => Some(source),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<StorageError> for StoreLensError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// INI errors
// ---------------------------------------------------------------------------

/// Errors from parsing rewritten legacy configuration text.
///
/// Line numbers refer to the rewritten text, which is one line longer than
/// the source when a default section header had to be prepended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IniError {
    /// A non-comment line has neither `=` nor `:`.
    MissingDelimiter { line_number: usize, line: String },

    /// The same key appears twice inside one section.
    DuplicateKey {
        section: String,
        key: String,
        line_number: usize,
    },
}

impl fmt::Display for IniError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDelimiter { line_number, line } => {
                write!(f, "line {line_number}: expected 'key=value', found '{line}'")
            }
            Self::DuplicateKey {
                section,
                key,
                line_number,
            } => write!(
                f,
                "line {line_number}: key '{key}' already defined in section '{section}'"
            ),
        }
    }
}

impl std::error::Error for IniError {}

impl From<IniError> for StoreLensError {
    fn from(e: IniError) -> Self {
        Self::Ini(e)
    }
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Reasons a single store is skipped. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The identity log is absent, empty, or has no usable name column.
    IdentityMissing { store_id: String, detail: String },

    /// A non-empty log lacks a column a derivation needs.
    MissingColumn {
        store_id: String,
        log: String,
        column: String,
    },

    /// A flag source holds a value that is neither yes nor no.
    InvalidFlagValue {
        store_id: String,
        field: &'static str,
        value: String,
    },
}

impl StoreError {
    /// Short machine-friendly category used in the skip report.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IdentityMissing { .. } => "identity_missing",
            Self::MissingColumn { .. } | Self::InvalidFlagValue { .. } => "derivation_failure",
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityMissing { store_id, detail } => {
                write!(f, "store '{store_id}': identity missing ({detail})")
            }
            Self::MissingColumn {
                store_id,
                log,
                column,
            } => write!(
                f,
                "store '{store_id}': {log} has rows but no '{column}' column"
            ),
            Self::InvalidFlagValue {
                store_id,
                field,
                value,
            } => write!(
                f,
                "store '{store_id}': cannot read '{value}' as yes/no for {field}"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for StoreLensError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors related to building or uploading report artifacts.
#[derive(Debug)]
pub enum ReportError {
    /// CSV serialisation error.
    Csv { key: String, source: csv::Error },

    /// JSON serialisation error.
    Json {
        key: String,
        source: serde_json::Error,
    },

    /// Flushing the in-memory writer failed.
    Io { key: String, source: io::Error },

    /// Uploading the finished artifact failed.
    Upload(StorageError),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv { key, source } => write!(f, "CSV error building '{key}': {source}"),
            Self::Json { key, source } => write!(f, "JSON error building '{key}': {source}"),
            Self::Io { key, source } => write!(f, "I/O error building '{key}': {source}"),
            Self::Upload(e) => write!(f, "upload failed: {e}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Upload(e) => Some(e),
        }
    }
}

impl From<StorageError> for ReportError {
    fn from(e: StorageError) -> Self {
        Self::Upload(e)
    }
}

impl From<ReportError> for StoreLensError {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for StoreLensError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for StoreLens results.
pub type Result<T> = std::result::Result<T, StoreLensError>;
