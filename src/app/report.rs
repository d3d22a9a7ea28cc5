// StoreLens - app/report.rs
//
// Writes the artifacts of a batch run: the combined report, optional
// per-store summaries, and the optional JSON skip report.
//
// The combined report is always written, even for an empty batch, so a
// rerun replaces whatever an earlier run left behind.

use crate::core::export;
use crate::core::model::BatchResult;
use crate::core::storage::{join_key, ObjectStore};
use crate::platform::config::AppConfig;
use crate::util::constants;
use crate::util::error::ReportError;
use chrono::NaiveDate;

/// Where and what to write.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub report_prefix: String,
    pub report_key: String,
    pub write_store_reports: bool,
    pub write_skip_report: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            report_prefix: constants::DEFAULT_REPORT_PREFIX.to_string(),
            report_key: constants::DEFAULT_REPORT_KEY.to_string(),
            write_store_reports: constants::DEFAULT_WRITE_STORE_REPORTS,
            write_skip_report: constants::DEFAULT_WRITE_SKIP_REPORT,
        }
    }
}

impl ReportSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            report_prefix: config.report_prefix.clone(),
            report_key: config.report_key.clone(),
            write_store_reports: config.write_store_reports,
            write_skip_report: config.write_skip_report,
        }
    }

    /// Key of the per-store summary for `store_id`.
    ///
    /// `None` when that key would be the combined report key (a store id of
    /// `store` under the default layout); such a store gets no summary file.
    pub fn store_report_key(&self, store_id: &str) -> Option<String> {
        let key = join_key(
            &self.report_prefix,
            &format!("{store_id}{}", constants::STORE_REPORT_SUFFIX),
        );
        (!key.eq_ignore_ascii_case(&self.report_key)).then_some(key)
    }

    pub fn skip_report_key(&self) -> String {
        join_key(&self.report_prefix, constants::SKIP_REPORT_NAME)
    }
}

/// Keys written by `write_reports`.
#[derive(Debug, Default)]
pub struct WrittenReports {
    pub report_key: String,
    pub store_reports: Vec<String>,
    pub skip_report: Option<String>,
}

/// Upload every artifact for `result`.
///
/// A failure writing a per-store summary is logged and does not stop the
/// combined report; failures on the combined or skip report are returned.
pub fn write_reports(
    store: &dyn ObjectStore,
    result: &BatchResult,
    settings: &ReportSettings,
    report_date: NaiveDate,
) -> Result<WrittenReports, ReportError> {
    let mut written = WrittenReports::default();

    if settings.write_store_reports {
        for record in &result.records {
            let Some(key) = settings.store_report_key(&record.source_id) else {
                tracing::warn!(
                    store = %record.source_id,
                    key = %settings.report_key,
                    "Store summary not written; its key is the combined report key"
                );
                continue;
            };
            let outcome = export::summary_csv(std::slice::from_ref(record), &key)
                .and_then(|bytes| store.put(&key, &bytes).map_err(ReportError::from));
            match outcome {
                Ok(()) => written.store_reports.push(key),
                Err(e) => tracing::warn!(store = %record.source_id, error = %e, "Store summary not written"),
            }
        }
    }

    let bytes = export::summary_csv(&result.records, &settings.report_key)?;
    store.put(&settings.report_key, &bytes)?;
    tracing::info!(
        key = %settings.report_key,
        rows = result.records.len(),
        "Combined report written"
    );
    written.report_key = settings.report_key.clone();

    if settings.write_skip_report {
        let key = settings.skip_report_key();
        let bytes = export::skip_report_json(result, report_date, &key)?;
        store.put(&key, &bytes)?;
        tracing::debug!(key = %key, skipped = result.skipped.len(), "Skip report written");
        written.skip_report = Some(key);
    }

    if result.records.is_empty() && result.stores_seen() > 0 {
        tracing::warn!(
            skipped = result.skipped.len(),
            "Every store was skipped; see the skip report for reasons"
        );
    }

    Ok(written)
}
