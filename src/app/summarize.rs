// StoreLens - app/summarize.rs
//
// Per-store summarisation: fetch the store bundle from the object store,
// decode each source, and hand the result to the feature derivations.
//
// Failure handling:
//   - A missing source is normal (older exporters omit some logs) and reads
//     as an empty log or empty configuration.
//   - An unreadable source is logged and treated the same way; it never
//     aborts the store on its own.
//   - Only identity and derivation failures skip the store.

use crate::core::features::{derive_record, FeatureRules, StoreLayout, StoreLogs};
use crate::core::ini::{parse_ini, IniConfig, IniOptions};
use crate::core::model::{Log, ReportWindow, SummaryRecord};
use crate::core::reader::{read_log, ReadConfig};
use crate::core::recency::TimestampFormats;
use crate::core::storage::{join_key, ObjectStore};
use crate::platform::config::AppConfig;
use crate::util::error::StoreError;

/// Everything needed to summarise a store besides the store itself.
#[derive(Debug, Clone)]
pub struct SummarySettings {
    /// Prefix holding one sub-prefix per store.
    pub source_prefix: String,
    pub layout: StoreLayout,
    pub rules: FeatureRules,
    pub read: ReadConfig,
    pub ini: IniOptions,
    pub window: ReportWindow,
}

impl SummarySettings {
    /// Built-in rules and layout for the given window.
    pub fn new(source_prefix: &str, window: ReportWindow) -> Self {
        Self {
            source_prefix: source_prefix.to_string(),
            layout: StoreLayout::default(),
            rules: FeatureRules::default(),
            read: ReadConfig::default(),
            ini: IniOptions::default(),
            window,
        }
    }

    /// Apply the validated config.toml values on top of the built-in rules.
    pub fn from_config(config: &AppConfig, window: ReportWindow) -> Self {
        let mut settings = Self::new(&config.source_prefix, window);

        settings.read.encoding = config.encoding;
        settings.read.max_rows = config.max_rows;
        settings.ini.encoding = config.encoding;

        let rules = &mut settings.rules;
        rules.identity_aliases = config.identity_aliases.clone();
        rules.deposit_not_configured = config.deposit_not_configured.clone();
        rules.timestamp_formats = TimestampFormats::new(config.timestamp_formats.clone());
        rules.corp_polling_code = config.corp_polling_code.clone();
        rules.club_marker = config.club_marker.clone();

        settings
    }
}

/// Summarises one store at a time against a shared object store.
pub struct StoreSummarizer<'a> {
    store: &'a dyn ObjectStore,
    settings: &'a SummarySettings,
}

impl<'a> StoreSummarizer<'a> {
    pub fn new(store: &'a dyn ObjectStore, settings: &'a SummarySettings) -> Self {
        Self { store, settings }
    }

    /// Fetch and derive the summary record for `store_id`.
    pub fn summarize(&self, store_id: &str) -> Result<SummaryRecord, StoreError> {
        let logs = self.fetch_logs(store_id);
        derive_record(
            store_id,
            &logs,
            &self.settings.layout,
            &self.settings.rules,
            &self.settings.window,
        )
    }

    /// Read every source of the store bundle. Never fails.
    pub fn fetch_logs(&self, store_id: &str) -> StoreLogs {
        let layout = &self.settings.layout;
        StoreLogs {
            identity: self.fetch_log(store_id, &layout.identity_log),
            reports: self.fetch_log(store_id, &layout.report_log),
            journal: self.fetch_log(store_id, &layout.journal_log),
            stock: self.fetch_log(store_id, &layout.stock_log),
            count: self.fetch_log(store_id, &layout.count_log),
            config: self.fetch_config(store_id),
        }
    }

    fn key(&self, store_id: &str, name: &str) -> String {
        join_key(&join_key(&self.settings.source_prefix, store_id), name)
    }

    fn fetch_bytes(&self, store_id: &str, name: &str) -> Option<Vec<u8>> {
        let key = self.key(store_id, name);
        match self.store.get(&key) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.is_not_found() => {
                tracing::debug!(store = store_id, key = %key, "Source absent");
                None
            }
            Err(e) => {
                tracing::warn!(
                    store = store_id,
                    key = %key,
                    error = %e,
                    "Source unreadable; treating as empty"
                );
                None
            }
        }
    }

    fn fetch_log(&self, store_id: &str, name: &str) -> Log {
        let Some(bytes) = self.fetch_bytes(store_id, name) else {
            return Log::default();
        };
        let log = read_log(&bytes, &self.settings.read);
        if log.truncated {
            tracing::warn!(
                store = store_id,
                log = name,
                max_rows = ?self.settings.read.max_rows,
                "Row cap reached; remainder of log not read"
            );
        }
        log
    }

    fn fetch_config(&self, store_id: &str) -> IniConfig {
        let name = &self.settings.layout.config_file;
        match self.fetch_bytes(store_id, name) {
            Some(bytes) => parse_ini(&bytes, &self.settings.ini, &self.key(store_id, name)),
            None => IniConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Recency, YesNo};
    use crate::core::storage::MemoryObjectStore;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    fn settings() -> SummarySettings {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        SummarySettings::new("processed_csvs/", ReportWindow::new(date))
    }

    #[test]
    fn test_full_bundle() {
        let store = MemoryObjectStore::new()
            .with("processed_csvs/0042/str.csv", "NAME,CITY\nHarbor Wines,Newark\n")
            .with(
                "processed_csvs/0042/reports.csv",
                "cappname,rundate\nINVCOUNT.EXE,2024-03-01\nSUGORDER.EXE,/ / /\n",
            )
            .with(
                "processed_csvs/0042/jnl.csv",
                "cat,rflag,promo\n60,0,\n10,0,Wine Club\n",
            )
            .with("processed_csvs/0042/stk.csv", "sku,stat\n1,1\n")
            .with("processed_csvs/0042/cnt.csv", "code,data\nCORPPOLL,Y\n")
            .with("processed_csvs/0042/spirits.ini", "RtnDeposCode=12\n");
        let settings = settings();
        let record = StoreSummarizer::new(&store, &settings)
            .summarize("0042")
            .unwrap();

        assert_eq!(record.store_id, "Harbor Wines (0042)");
        assert_eq!(record.source_id, "0042");
        assert_eq!(record.use_inventory_counting_report, Recency::Days(9));
        assert_eq!(record.use_suggested_order_report, Recency::Unknown);
        assert_eq!(record.use_line_item_discount, YesNo::Yes);
        assert_eq!(record.use_club_list, YesNo::Yes);
        assert_eq!(record.use_kits, YesNo::No);
        assert_eq!(record.use_corp_polling, YesNo::Yes);
        assert_eq!(record.use_tomra, YesNo::Yes);
        assert_eq!(record.use_price_level_upcs, YesNo::Yes);
    }

    #[test]
    fn test_identity_only_bundle_defaults_to_no_usage() {
        let store =
            MemoryObjectStore::new().with("processed_csvs/7/str.csv", "STORE_NAME\nCorner\n");
        let settings = settings();
        let record = StoreSummarizer::new(&store, &settings)
            .summarize("7")
            .unwrap();
        assert_eq!(record.store_id, "Corner (7)");
        assert_eq!(record.use_line_item_discount, YesNo::No);
        assert_eq!(record.use_corp_polling, YesNo::No);
        assert_eq!(record.use_tomra, YesNo::No);
        assert_eq!(record.use_frequent_shopper_report, Recency::Unknown);
    }

    #[test]
    fn test_missing_identity_is_skipped() {
        let store = MemoryObjectStore::new().with("processed_csvs/7/jnl.csv", "cat,rflag\n60,0\n");
        let settings = settings();
        let err = StoreSummarizer::new(&store, &settings)
            .summarize("7")
            .unwrap_err();
        assert_eq!(err.kind(), "identity_missing");
    }

    #[test]
    fn test_unreadable_source_reads_as_empty() {
        let store = MemoryObjectStore::new()
            .with("processed_csvs/7/str.csv", "NAME\nCorner\n")
            .with("processed_csvs/7/stk.csv", "stat\n9\n");
        store.fail_on("processed_csvs/7/stk.csv");
        let settings = settings();
        let record = StoreSummarizer::new(&store, &settings)
            .summarize("7")
            .unwrap();
        assert_eq!(record.use_kits, YesNo::No);
    }

    #[test]
    fn test_malformed_config_means_not_configured() {
        let store = MemoryObjectStore::new()
            .with("processed_csvs/7/str.csv", "NAME\nCorner\n")
            .with("processed_csvs/7/spirits.ini", "[S]\nRtnDeposCode=12\nno delimiter here\n");
        let settings = settings();
        let record = StoreSummarizer::new(&store, &settings)
            .summarize("7")
            .unwrap();
        assert_eq!(record.use_tomra, YesNo::No);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unparseable_config_warning_names_the_object() {
        let store = MemoryObjectStore::new()
            .with("processed_csvs/7/str.csv", "NAME\nCorner\n")
            .with("processed_csvs/7/spirits.ini", "[S]\nno delimiter here\n");
        let settings = settings();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .finish();
        let record = tracing::subscriber::with_default(subscriber, || {
            StoreSummarizer::new(&store, &settings).summarize("7")
        })
        .unwrap();

        assert_eq!(record.use_tomra, YesNo::No);
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Configuration unparseable"), "{output}");
        assert!(output.contains("processed_csvs/7/spirits.ini"), "{output}");
    }

    #[test]
    fn test_settings_from_config() {
        let config = AppConfig {
            club_marker: "VIP".to_string(),
            max_rows: Some(10),
            ..AppConfig::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let settings = SummarySettings::from_config(&config, ReportWindow::new(date));
        assert_eq!(settings.rules.club_marker, "VIP");
        assert_eq!(settings.read.max_rows, Some(10));
        assert_eq!(settings.source_prefix, "processed_csvs/");
    }
}
