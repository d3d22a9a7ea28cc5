// StoreLens - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading
// 3. Logging initialisation (debug mode support)
// 4. Dispatch to the summarize or combine command

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use storelens::app::batch::BatchAggregator;
use storelens::app::combine::combine_reports;
use storelens::app::report::{write_reports, ReportSettings};
use storelens::app::summarize::SummarySettings;
use storelens::core::model::ReportWindow;
use storelens::platform::config::{load_config, load_config_strict, AppConfig, PlatformPaths};
use storelens::platform::storage::LocalObjectStore;
use storelens::util::error::{self, ConfigError};
use storelens::util::{self, constants};

/// StoreLens - per-store feature usage summaries from POS log exports.
///
/// Reads every store bundle under the source prefix and writes one summary
/// row per store to the combined report.
#[derive(Parser, Debug)]
#[command(name = "storelens", version, about)]
struct Cli {
    /// Directory standing in for the bucket (overrides [storage] root).
    #[arg(short = 'r', long = "root", global = true)]
    root: Option<PathBuf>,

    /// Path to config.toml (defaults to the platform config directory).
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarise every store and write the combined report.
    Summarize(SummarizeArgs),
    /// Merge existing per-store summaries into the combined report.
    Combine,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    /// Date recency is measured against, YYYY-MM-DD (default: today).
    #[arg(long = "report-date")]
    report_date: Option<NaiveDate>,

    /// Start of the reporting window, YYYY-MM-DD.
    #[arg(long = "start-date")]
    start_date: Option<NaiveDate>,

    /// End of the reporting window, YYYY-MM-DD.
    #[arg(long = "end-date")]
    end_date: Option<NaiveDate>,

    /// Stop reading each log after this many data rows.
    #[arg(long = "max-rows")]
    max_rows: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config is read before logging so its level can take part in the filter.
    let loaded = match cli.config {
        Some(ref path) => load_config_strict(path),
        None => Ok(load_config(&PlatformPaths::resolve().config_file())),
    };
    let config_level = loaded
        .as_ref()
        .ok()
        .and_then(|(config, _)| config.log_level.clone());
    util::logging::init(cli.debug, config_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "StoreLens starting"
    );

    let (config, warnings) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "Configuration could not be loaded");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, mut config: AppConfig) -> error::Result<()> {
    if let Some(ref root) = cli.root {
        config.storage_root = root.clone();
    }
    let store = LocalObjectStore::new(&config.storage_root);
    tracing::debug!(root = %store.root().display(), "Using local object store");

    let report_settings = ReportSettings::from_config(&config);

    match cli.command {
        Command::Summarize(ref args) => {
            let window = report_window(args)?;
            let mut settings = SummarySettings::from_config(&config, window);
            if let Some(rows) = args.max_rows {
                settings.read.max_rows = Some(validate_max_rows(rows)?);
            }

            let result = BatchAggregator::new(&store, &settings).run();
            for warning in &result.warnings {
                tracing::warn!("{}", warning);
            }

            let written = write_reports(&store, &result, &report_settings, window.report_date)?;
            println!("{}", written.report_key);
        }
        Command::Combine => match combine_reports(&store, &report_settings)? {
            Some(outcome) => {
                for warning in &outcome.warnings {
                    tracing::warn!("{}", warning);
                }
                println!("{}", outcome.report_key);
            }
            None => eprintln!(
                "No per-store summaries under '{}'; nothing written.",
                report_settings.report_prefix
            ),
        },
    }
    Ok(())
}

fn report_window(args: &SummarizeArgs) -> Result<ReportWindow, ConfigError> {
    let report_date = args
        .report_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    if let (Some(start), Some(end)) = (args.start_date, args.end_date) {
        if start > end {
            return Err(ConfigError::ValueOutOfRange {
                field: "--start-date".to_string(),
                value: start.to_string(),
                expected: format!("a date on or before --end-date ({end})"),
            });
        }
    }

    Ok(ReportWindow {
        report_date,
        start_date: args.start_date,
        end_date: args.end_date,
    })
}

fn validate_max_rows(rows: usize) -> Result<usize, ConfigError> {
    if (constants::MIN_MAX_ROWS..=constants::ABSOLUTE_MAX_ROWS).contains(&rows) {
        Ok(rows)
    } else {
        Err(ConfigError::ValueOutOfRange {
            field: "--max-rows".to_string(),
            value: rows.to_string(),
            expected: format!(
                "{}-{}",
                constants::MIN_MAX_ROWS,
                constants::ABSOLUTE_MAX_ROWS
            ),
        })
    }
}
