// StoreLens - app/batch.rs
//
// Batch aggregation: enumerate store prefixes and summarise each one in
// enumeration order.
//
// Every per-store failure is recorded and the batch moves on; a listing
// failure becomes a batch warning with an empty result. Nothing here aborts
// the run.

use crate::app::summarize::{StoreSummarizer, SummarySettings};
use crate::core::model::{BatchResult, SkippedStore};
use crate::core::storage::ObjectStore;
use crate::util::constants::MAX_WARNINGS;
use std::time::Instant;

/// Runs the summariser over every store under the source prefix.
pub struct BatchAggregator<'a> {
    store: &'a dyn ObjectStore,
    settings: &'a SummarySettings,
}

impl<'a> BatchAggregator<'a> {
    pub fn new(store: &'a dyn ObjectStore, settings: &'a SummarySettings) -> Self {
        Self { store, settings }
    }

    /// Summarise every store. Records and skips follow enumeration order.
    pub fn run(&self) -> BatchResult {
        let started = Instant::now();
        let mut result = BatchResult::default();

        let store_ids = match self.store.list_prefixes(&self.settings.source_prefix) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(error = %e, "Could not enumerate stores");
                push_warning(&mut result, format!("Store listing failed: {e}"));
                return result;
            }
        };

        tracing::info!(
            stores = store_ids.len(),
            prefix = %self.settings.source_prefix,
            report_date = %self.settings.window.report_date,
            "Starting batch"
        );

        let summarizer = StoreSummarizer::new(self.store, self.settings);
        for store_id in &store_ids {
            let _span = tracing::info_span!("store", id = %store_id).entered();
            match summarizer.summarize(store_id) {
                Ok(record) => {
                    tracing::debug!(store = %store_id, name = %record.store_id, "Store summarised");
                    result.records.push(record);
                }
                Err(e) => {
                    tracing::warn!(store = %store_id, kind = e.kind(), reason = %e, "Store skipped");
                    result.skipped.push(SkippedStore {
                        store_id: store_id.clone(),
                        kind: e.kind().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !store_ids.is_empty() && result.records.is_empty() {
            push_warning(
                &mut result,
                format!("All {} stores were skipped; the report has no rows", store_ids.len()),
            );
        }

        tracing::info!(
            summarised = result.records.len(),
            skipped = result.skipped.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Batch complete"
        );
        result
    }
}

/// Append a batch warning, keeping the list bounded.
fn push_warning(result: &mut BatchResult, message: String) {
    if result.warnings.len() < MAX_WARNINGS {
        result.warnings.push(message);
    }
}
