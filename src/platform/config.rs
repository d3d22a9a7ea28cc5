// StoreLens - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::reader::TextEncoding;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for StoreLens configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/storelens/ or %APPDATA%\StoreLens\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still loads with
/// an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub storage: StorageSection,
    pub ingest: IngestSection,
    pub rules: RulesSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

/// `[storage]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Local directory standing in for the bucket.
    pub root: Option<String>,
    /// Prefix holding one sub-prefix per store.
    pub source_prefix: Option<String>,
    /// Prefix for per-store summaries and the skip report.
    pub report_prefix: Option<String>,
    /// Key of the combined report.
    pub report_key: Option<String>,
}

/// `[ingest]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Per-log data row cap.
    pub max_rows: Option<usize>,
    /// "latin1" or "utf-8".
    pub encoding: Option<String>,
}

/// `[rules]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RulesSection {
    pub identity_aliases: Option<Vec<String>>,
    pub deposit_not_configured: Option<Vec<String>>,
    /// chrono format strings, tried in order.
    pub timestamp_formats: Option<Vec<String>>,
    pub corp_polling_code: Option<String>,
    pub club_marker: Option<String>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub write_store_reports: Option<bool>,
    pub write_skip_report: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Storage --
    pub storage_root: PathBuf,
    pub source_prefix: String,
    pub report_prefix: String,
    pub report_key: String,

    // -- Ingest --
    /// `None` reads every row.
    pub max_rows: Option<usize>,
    pub encoding: TextEncoding,

    // -- Rules --
    pub identity_aliases: Vec<String>,
    pub deposit_not_configured: Vec<String>,
    pub timestamp_formats: Vec<String>,
    pub corp_polling_code: String,
    pub club_marker: String,

    // -- Output --
    pub write_store_reports: bool,
    pub write_skip_report: bool,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(constants::DEFAULT_STORAGE_ROOT),
            source_prefix: constants::DEFAULT_SOURCE_PREFIX.to_string(),
            report_prefix: constants::DEFAULT_REPORT_PREFIX.to_string(),
            report_key: constants::DEFAULT_REPORT_KEY.to_string(),
            max_rows: None,
            encoding: TextEncoding::default(),
            identity_aliases: owned(constants::IDENTITY_NAME_ALIASES),
            deposit_not_configured: owned(constants::DEPOSIT_NOT_CONFIGURED),
            timestamp_formats: owned(constants::TIMESTAMP_FORMATS),
            corp_polling_code: constants::CORP_POLLING_CODE.to_string(),
            club_marker: constants::CLUB_PROMO_MARKER.to_string(),
            write_store_reports: constants::DEFAULT_WRITE_STORE_REPORTS,
            write_skip_report: constants::DEFAULT_WRITE_SKIP_REPORT,
            log_level: None,
        }
    }
}

/// Load and validate a config.toml file.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file is unreadable or unparseable, returns defaults with a warning
/// so the run still proceeds but the user is informed.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content, config_path),
        Err(e) => {
            let msg = format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Load a config file the user named explicitly.
///
/// Unlike `load_config`, failing to read or parse the file is an error.
/// Out-of-range values still only warn.
pub fn load_config_strict(config_path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %config_path.display(), "Loaded config.toml");
    Ok(validate(raw))
}

/// Validate config text. `origin` is only used in messages.
pub fn parse_config(content: &str, origin: &Path) -> (AppConfig, Vec<String>) {
    match toml::from_str::<RawConfig>(content) {
        Ok(raw) => validate(raw),
        Err(e) => {
            let msg = format!(
                "Failed to parse config file '{}': {e}. Using defaults. \
                 See config.example.toml for the expected format.",
                origin.display()
            );
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Check every field against the named limits in `constants`.
fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    // Validate each field, accumulating every problem rather than stopping at the first.
    let mut config = AppConfig::default();

    // -- Storage --
    if let Some(root) = raw.storage.root {
        if root.trim().is_empty() {
            warnings.push(format!(
                "[storage] root is empty. Using default (\"{}\").",
                constants::DEFAULT_STORAGE_ROOT
            ));
        } else {
            config.storage_root = PathBuf::from(root);
        }
    }
    if let Some(prefix) = raw.storage.source_prefix {
        match normalise_prefix(&prefix) {
            Some(p) => config.source_prefix = p,
            None => warnings.push(format!(
                "[storage] source_prefix = \"{prefix}\" is empty. Using default (\"{}\").",
                constants::DEFAULT_SOURCE_PREFIX
            )),
        }
    }
    if let Some(prefix) = raw.storage.report_prefix {
        match normalise_prefix(&prefix) {
            Some(p) => config.report_prefix = p,
            None => warnings.push(format!(
                "[storage] report_prefix = \"{prefix}\" is empty. Using default (\"{}\").",
                constants::DEFAULT_REPORT_PREFIX
            )),
        }
    }
    if let Some(key) = raw.storage.report_key {
        let trimmed = key.trim().trim_start_matches('/');
        if trimmed.to_ascii_lowercase().ends_with(".csv") {
            config.report_key = trimmed.to_string();
        } else {
            warnings.push(format!(
                "[storage] report_key = \"{key}\" must name a .csv object. Using default (\"{}\").",
                constants::DEFAULT_REPORT_KEY
            ));
        }
    }

    // -- Ingest --
    if let Some(rows) = raw.ingest.max_rows {
        if (constants::MIN_MAX_ROWS..=constants::ABSOLUTE_MAX_ROWS).contains(&rows) {
            config.max_rows = Some(rows);
        } else {
            warnings.push(format!(
                "[ingest] max_rows = {rows} is out of range ({}-{}). Reading all rows.",
                constants::MIN_MAX_ROWS,
                constants::ABSOLUTE_MAX_ROWS,
            ));
        }
    }
    if let Some(ref name) = raw.ingest.encoding {
        match TextEncoding::from_name(name) {
            Some(encoding) => config.encoding = encoding,
            None => warnings.push(format!(
                "[ingest] encoding = \"{name}\" is not recognised. \
                 Expected \"latin1\" or \"utf-8\". Using default (latin1).",
            )),
        }
    }

    // -- Rules --
    if let Some(aliases) = raw.rules.identity_aliases {
        match non_blank_list(aliases) {
            Some(list) => config.identity_aliases = list,
            None => warnings.push(
                "[rules] identity_aliases must list at least one column name. Using defaults."
                    .to_string(),
            ),
        }
    }
    if let Some(codes) = raw.rules.deposit_not_configured {
        // An empty list is allowed: every non-blank code then counts as configured.
        config.deposit_not_configured = codes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
    }
    if let Some(formats) = raw.rules.timestamp_formats {
        let (valid, invalid): (Vec<String>, Vec<String>) = formats
            .into_iter()
            .filter(|f| !f.trim().is_empty())
            .partition(|f| is_valid_format(f));
        for bad in &invalid {
            warnings.push(format!(
                "[rules] timestamp_formats entry \"{bad}\" is not a valid chrono format. Ignored."
            ));
        }
        if valid.is_empty() {
            warnings.push(
                "[rules] timestamp_formats has no usable entries. Using defaults.".to_string(),
            );
        } else {
            config.timestamp_formats = valid;
        }
    }
    if let Some(code) = raw.rules.corp_polling_code {
        if code.trim().is_empty() {
            warnings.push(format!(
                "[rules] corp_polling_code is empty. Using default (\"{}\").",
                constants::CORP_POLLING_CODE
            ));
        } else {
            config.corp_polling_code = code.trim().to_string();
        }
    }
    if let Some(marker) = raw.rules.club_marker {
        if marker.trim().is_empty() {
            warnings.push(format!(
                "[rules] club_marker is empty. Using default (\"{}\").",
                constants::CLUB_PROMO_MARKER
            ));
        } else {
            config.club_marker = marker.trim().to_string();
        }
    }

    // -- Output --
    if let Some(flag) = raw.output.write_store_reports {
        config.write_store_reports = flag;
    }
    if let Some(flag) = raw.output.write_skip_report {
        config.write_skip_report = flag;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: {}. Using default ({}).",
                constants::VALID_LOG_LEVELS.join(", "),
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    (config, warnings)
}

/// Trim surrounding slashes and re-append exactly one. `None` when empty.
fn normalise_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("{trimmed}/"))
    }
}

fn non_blank_list(items: Vec<String>) -> Option<Vec<String>> {
    let list: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

fn is_valid_format(format: &str) -> bool {
    !chrono::format::StrftimeItems::new(format)
        .any(|item| matches!(item, chrono::format::Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> (AppConfig, Vec<String>) {
        parse_config(content, Path::new("config.toml"))
    }

    #[test]
    fn test_empty_config_is_defaults() {
        let (config, warnings) = parse("");
        assert!(warnings.is_empty());
        assert_eq!(config.source_prefix, constants::DEFAULT_SOURCE_PREFIX);
        assert_eq!(config.report_key, constants::DEFAULT_REPORT_KEY);
        assert_eq!(config.encoding, TextEncoding::Latin1);
        assert_eq!(config.max_rows, None);
        assert_eq!(config.deposit_not_configured, vec!["99999", "999999"]);
    }

    #[test]
    fn test_valid_values_are_applied() {
        let (config, warnings) = parse(
            r#"
[storage]
root = "/srv/bucket"
source_prefix = "/exports"
report_key = "out/all.csv"

[ingest]
max_rows = 5000
encoding = "utf-8"

[rules]
identity_aliases = ["SNAME"]
timestamp_formats = ["%d.%m.%Y"]

[output]
write_store_reports = false

[logging]
level = "DEBUG"
"#,
        );
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.storage_root, PathBuf::from("/srv/bucket"));
        assert_eq!(config.source_prefix, "exports/");
        assert_eq!(config.report_key, "out/all.csv");
        assert_eq!(config.max_rows, Some(5000));
        assert_eq!(config.encoding, TextEncoding::Utf8);
        assert_eq!(config.identity_aliases, vec!["SNAME"]);
        assert_eq!(config.timestamp_formats, vec!["%d.%m.%Y"]);
        assert!(!config.write_store_reports);
        assert!(config.write_skip_report);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_values_warn_and_fall_back() {
        let (config, warnings) = parse(
            r#"
[storage]
source_prefix = "//"
report_key = "report.txt"

[ingest]
max_rows = 0
encoding = "ebcdic"

[rules]
identity_aliases = ["  "]
corp_polling_code = ""

[logging]
level = "verbose"
"#,
        );
        assert_eq!(warnings.len(), 7, "warnings: {warnings:?}");
        assert_eq!(config.source_prefix, constants::DEFAULT_SOURCE_PREFIX);
        assert_eq!(config.report_key, constants::DEFAULT_REPORT_KEY);
        assert_eq!(config.max_rows, None);
        assert_eq!(config.encoding, TextEncoding::Latin1);
        assert_eq!(config.identity_aliases.len(), 3);
        assert_eq!(config.corp_polling_code, constants::CORP_POLLING_CODE);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_bad_timestamp_format_is_dropped() {
        let (config, warnings) = parse(
            r#"
[rules]
timestamp_formats = ["%Y-%m-%d", "%Q"]
"#,
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("%Q"));
        assert_eq!(config.timestamp_formats, vec!["%Y-%m-%d"]);
    }

    #[test]
    fn test_unparseable_toml_uses_defaults() {
        let (config, warnings) = parse("[storage\nroot = ");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Failed to parse"));
        assert_eq!(config.report_prefix, constants::DEFAULT_REPORT_PREFIX);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let (_, warnings) = parse("[future]\nflag = true\n[storage]\nnew_key = 1\n");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_strict_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage\n").unwrap();
        let err = load_config_strict(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse { .. }));

        let missing = load_config_strict(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn test_strict_load_validates_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ingest]\nmax_rows = 12\n[logging]\nlevel = \"loud\"\n").unwrap();
        let (config, warnings) = load_config_strict(&path).unwrap();
        assert_eq!(config.max_rows, Some(12));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_missing_file_is_defaults_without_warning() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(&dir.path().join("config.toml"));
        assert!(warnings.is_empty());
        assert!(config.write_skip_report);
    }
}
