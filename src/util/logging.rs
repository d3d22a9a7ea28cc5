// StoreLens - util/logging.rs
//
// tracing-subscriber setup for the CLI.
//
// Level selection, first match wins:
//   1. RUST_LOG, taken verbatim as an EnvFilter
//   2. --debug
//   3. [logging] level in config.toml
//   4. constants::DEFAULT_LOG_LEVEL
//
// Events go to stderr; stdout carries only the key of the written report.
// A batch run enters a `store{id=..}` span per store, so warnings raised
// while reading a bundle carry the store id without repeating it.
// Row contents are never logged; store names and object keys are.

use super::constants;
use tracing_subscriber::EnvFilter;

/// Filter directive used when RUST_LOG is not set.
fn fallback_directive(debug_flag: bool, config_level: Option<&str>) -> &str {
    if debug_flag {
        "debug"
    } else {
        config_level.unwrap_or(constants::DEFAULT_LOG_LEVEL)
    }
}

/// Install the global subscriber. Call once, after config.toml is loaded.
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(fallback_directive(debug_flag, config_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .init();

    tracing::debug!(
        app = constants::APP_NAME,
        version = constants::APP_VERSION,
        "Logging initialised"
    );
}
