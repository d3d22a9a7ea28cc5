// StoreLens - app/combine.rs
//
// Rebuild the combined report from per-store summaries already in the
// object store, without re-reading any store bundle.

use crate::app::report::ReportSettings;
use crate::core::export::{self, SummaryTable};
use crate::core::storage::ObjectStore;
use crate::util::constants;
use crate::util::error::ReportError;

/// What a combine run produced.
#[derive(Debug)]
pub struct CombineOutcome {
    pub report_key: String,
    pub inputs: usize,
    pub rows: usize,
    pub warnings: Vec<String>,
}

/// Merge every `*_summary.csv` under the report prefix into the combined key.
///
/// The combined key itself is never an input. Returns `Ok(None)` and writes
/// nothing when there is no input table.
pub fn combine_reports(
    store: &dyn ObjectStore,
    settings: &ReportSettings,
) -> Result<Option<CombineOutcome>, ReportError> {
    let keys: Vec<String> = store
        .list_keys(&settings.report_prefix)?
        .into_iter()
        .filter(|k| k.ends_with(constants::STORE_REPORT_SUFFIX) && *k != settings.report_key)
        .collect();

    let mut warnings = Vec::new();
    let mut tables = Vec::with_capacity(keys.len());
    for key in &keys {
        match store.get(key) {
            Ok(bytes) => tables.push(SummaryTable::parse(key, &bytes)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Summary unreadable; left out of the combined report");
                warnings.push(e.to_string());
            }
        }
    }

    let Some(combined) = export::combine_tables(&tables, &settings.report_key)? else {
        tracing::warn!(prefix = %settings.report_prefix, "No summary tables found; nothing written");
        return Ok(None);
    };

    store.put(&settings.report_key, &combined.bytes)?;
    tracing::info!(
        key = %settings.report_key,
        inputs = tables.len(),
        rows = combined.rows,
        "Combined report written"
    );

    warnings.extend(combined.warnings);
    Ok(Some(CombineOutcome {
        report_key: settings.report_key.clone(),
        inputs: tables.len(),
        rows: combined.rows,
        warnings,
    }))
}
