// StoreLens - core/features.rs
//
// Feature-usage derivation for one store bundle.
// Core layer: operates on already-read logs and configuration; the app layer
// does the fetching.
//
// Every flag is computed independently, but the record is all-or-nothing:
// if any derivation fails the store gets no record at all rather than one
// that mixes real values with guesses.

use crate::core::ini::IniConfig;
use crate::core::model::{Log, Recency, ReportWindow, StoreContext, SummaryRecord, YesNo};
use crate::core::recency::{days_since_last_run, RunColumns, TimestampFormats};
use crate::util::constants;
use crate::util::error::StoreError;

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Rules (all data, no branches per exporter variant)
// =============================================================================

/// Object names that make up a store bundle, relative to the store prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub identity_log: String,
    pub report_log: String,
    pub journal_log: String,
    pub stock_log: String,
    pub count_log: String,
    pub config_file: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            identity_log: constants::IDENTITY_LOG.to_string(),
            report_log: constants::REPORT_LOG.to_string(),
            journal_log: constants::JOURNAL_LOG.to_string(),
            stock_log: constants::STOCK_LOG.to_string(),
            count_log: constants::COUNT_LOG.to_string(),
            config_file: constants::CONFIG_FILE.to_string(),
        }
    }
}

/// Column names read by the derivations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub journal_category: String,
    pub journal_flag: String,
    pub journal_promo: String,
    pub stock_status: String,
    pub report_app: String,
    pub report_run_date: String,
    pub count_code: String,
    pub count_data: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            journal_category: "cat".to_string(),
            journal_flag: "rflag".to_string(),
            journal_promo: "promo".to_string(),
            stock_status: "stat".to_string(),
            report_app: "cappname".to_string(),
            report_run_date: "rundate".to_string(),
            count_code: "code".to_string(),
            count_data: "data".to_string(),
        }
    }
}

/// Executable identifiers whose last run feeds each recency column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportGenerators {
    pub inventory_counting: String,
    pub suggested_order: String,
    pub nj_rips: String,
    pub nj_buydowns_rips: String,
    pub inventory_value_analysis: String,
    pub frequent_shopper: String,
}

impl Default for ReportGenerators {
    fn default() -> Self {
        Self {
            inventory_counting: "INVCOUNT.EXE".to_string(),
            suggested_order: "SUGORDER.EXE".to_string(),
            nj_rips: "BDRIPRPT.EXE".to_string(),
            // Both NJ reports are produced by the same executable.
            nj_buydowns_rips: "BDRIPRPT.EXE".to_string(),
            inventory_value_analysis: "INVANAL".to_string(),
            frequent_shopper: "FSPURCHHST.EXE".to_string(),
        }
    }
}

/// Sentinels, aliases, and formats used to derive a summary record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRules {
    /// Identity-log columns accepted as the store name, in priority order.
    pub identity_aliases: Vec<String>,
    pub line_discount_categories: Vec<String>,
    pub line_discount_applied_flag: String,
    pub club_marker: String,
    pub kit_status: String,
    pub deposit_section: String,
    pub deposit_key: String,
    /// Deposit codes that mean the integration is not set up.
    pub deposit_not_configured: Vec<String>,
    pub corp_polling_code: String,
    pub columns: ColumnNames,
    pub generators: ReportGenerators,
    pub timestamp_formats: TimestampFormats,
}

impl Default for FeatureRules {
    fn default() -> Self {
        Self {
            identity_aliases: owned(constants::IDENTITY_NAME_ALIASES),
            line_discount_categories: owned(constants::LINE_DISCOUNT_CATEGORIES),
            line_discount_applied_flag: constants::LINE_DISCOUNT_APPLIED_FLAG.to_string(),
            club_marker: constants::CLUB_PROMO_MARKER.to_string(),
            kit_status: constants::KIT_STATUS.to_string(),
            deposit_section: constants::DEPOSIT_SECTION.to_string(),
            deposit_key: constants::DEPOSIT_KEY.to_string(),
            deposit_not_configured: owned(constants::DEPOSIT_NOT_CONFIGURED),
            corp_polling_code: constants::CORP_POLLING_CODE.to_string(),
            columns: ColumnNames::default(),
            generators: ReportGenerators::default(),
            timestamp_formats: TimestampFormats::default(),
        }
    }
}

/// Everything read for one store, already parsed.
#[derive(Debug, Clone, Default)]
pub struct StoreLogs {
    pub identity: Log,
    pub reports: Log,
    pub journal: Log,
    pub stock: Log,
    pub count: Log,
    pub config: IniConfig,
}

// =============================================================================
// Identity
// =============================================================================

/// Resolve the store name from the identity log.
///
/// The log must have at least one row and one of the alias columns, and the
/// first row must hold a non-blank name.
pub fn resolve_identity(
    store_id: &str,
    identity: &Log,
    rules: &FeatureRules,
) -> Result<StoreContext, StoreError> {
    let missing = |detail: String| StoreError::IdentityMissing {
        store_id: store_id.to_string(),
        detail,
    };

    let first = identity
        .rows
        .first()
        .ok_or_else(|| missing("identity log absent or empty".to_string()))?;

    let column = rules
        .identity_aliases
        .iter()
        .find(|alias| identity.has_column(alias))
        .ok_or_else(|| {
            missing(format!(
                "no store name column; expected one of {}",
                rules.identity_aliases.join(", ")
            ))
        })?;

    let name = first.get_trimmed(column);
    if name.is_empty() {
        return Err(missing(format!("'{column}' is blank")));
    }

    Ok(StoreContext {
        store_id: store_id.to_string(),
        store_name: name.to_string(),
    })
}

// =============================================================================
// Flags
// =============================================================================

/// A log with rows must carry every column a derivation reads.
fn require_columns(
    store_id: &str,
    log: &Log,
    log_name: &str,
    columns: &[&str],
) -> Result<(), StoreError> {
    if log.is_empty() {
        return Ok(());
    }
    match columns.iter().find(|c| !log.has_column(c)) {
        Some(column) => Err(StoreError::MissingColumn {
            store_id: store_id.to_string(),
            log: log_name.to_string(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

/// Any journal row with a discount category whose flag reads "applied".
pub fn line_item_discount(
    store_id: &str,
    journal: &Log,
    log_name: &str,
    rules: &FeatureRules,
) -> Result<YesNo, StoreError> {
    let cols = &rules.columns;
    require_columns(
        store_id,
        journal,
        log_name,
        &[cols.journal_category.as_str(), cols.journal_flag.as_str()],
    )?;
    let used = journal.rows.iter().any(|row| {
        let category = row.get_trimmed(&cols.journal_category);
        rules.line_discount_categories.iter().any(|c| c == category)
            && row.get_trimmed(&cols.journal_flag) == rules.line_discount_applied_flag
    });
    Ok(used.into())
}

/// Any journal row whose promotion text contains the club marker.
pub fn club_list(
    store_id: &str,
    journal: &Log,
    log_name: &str,
    rules: &FeatureRules,
) -> Result<YesNo, StoreError> {
    let promo = &rules.columns.journal_promo;
    require_columns(store_id, journal, log_name, &[promo.as_str()])?;
    let marker = rules.club_marker.to_uppercase();
    let used = journal
        .rows
        .iter()
        .any(|row| row.get(promo).unwrap_or("").to_uppercase().contains(&marker));
    Ok(used.into())
}

/// Any stock row carrying the kit status.
pub fn kits(
    store_id: &str,
    stock: &Log,
    log_name: &str,
    rules: &FeatureRules,
) -> Result<YesNo, StoreError> {
    let status = &rules.columns.stock_status;
    require_columns(store_id, stock, log_name, &[status.as_str()])?;
    let used = stock
        .rows
        .iter()
        .any(|row| row.get_trimmed(status) == rules.kit_status);
    Ok(used.into())
}

/// Deposit-return integration: configured unless the code is missing, blank,
/// or one of the "not configured" sentinels.
pub fn deposit_integration(config: &IniConfig, rules: &FeatureRules) -> YesNo {
    let code = config
        .get_or(&rules.deposit_section, &rules.deposit_key, "")
        .trim();
    let configured = !code.is_empty() && !rules.deposit_not_configured.iter().any(|s| s == code);
    configured.into()
}

/// Read a yes/no cell. `None` for anything unrecognised.
pub fn parse_yes_no(value: &str) -> Option<YesNo> {
    match value.trim().to_ascii_uppercase().as_str() {
        "Y" | "YES" | "T" | "TRUE" | "1" => Some(YesNo::Yes),
        "N" | "NO" | "F" | "FALSE" | "0" => Some(YesNo::No),
        _ => None,
    }
}

/// Corporate polling, from the count log row carrying the polling code.
///
/// No such row means polling is not used. The first matching row wins.
pub fn corp_polling(
    store_id: &str,
    count: &Log,
    log_name: &str,
    rules: &FeatureRules,
) -> Result<YesNo, StoreError> {
    let cols = &rules.columns;
    require_columns(
        store_id,
        count,
        log_name,
        &[cols.count_code.as_str(), cols.count_data.as_str()],
    )?;

    let row = count.rows.iter().find(|row| {
        row.get_trimmed(&cols.count_code)
            .eq_ignore_ascii_case(&rules.corp_polling_code)
    });
    match row {
        None => Ok(YesNo::No),
        Some(row) => {
            let value = row.get_trimmed(&cols.count_data);
            parse_yes_no(value).ok_or_else(|| StoreError::InvalidFlagValue {
                store_id: store_id.to_string(),
                field: "use_corp_polling",
                value: value.to_string(),
            })
        }
    }
}

// =============================================================================
// Recency
// =============================================================================

/// The six per-report recency columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyMetrics {
    pub inventory_counting: Recency,
    pub suggested_order: Recency,
    pub nj_rips: Recency,
    pub nj_buydowns_rips: Recency,
    pub inventory_value_analysis: Recency,
    pub frequent_shopper: Recency,
}

pub fn recency_metrics(
    store_id: &str,
    reports: &Log,
    log_name: &str,
    rules: &FeatureRules,
    reference: chrono::NaiveDate,
) -> Result<RecencyMetrics, StoreError> {
    let cols = &rules.columns;
    require_columns(
        store_id,
        reports,
        log_name,
        &[cols.report_app.as_str(), cols.report_run_date.as_str()],
    )?;

    let columns = RunColumns {
        app: &cols.report_app,
        run_date: &cols.report_run_date,
    };
    let formats = &rules.timestamp_formats;
    let days = |target: &str| days_since_last_run(&reports.rows, columns, target, reference, formats);
    let g = &rules.generators;

    Ok(RecencyMetrics {
        inventory_counting: days(g.inventory_counting.as_str()),
        suggested_order: days(g.suggested_order.as_str()),
        nj_rips: days(g.nj_rips.as_str()),
        nj_buydowns_rips: days(g.nj_buydowns_rips.as_str()),
        inventory_value_analysis: days(g.inventory_value_analysis.as_str()),
        frequent_shopper: days(g.frequent_shopper.as_str()),
    })
}

// =============================================================================
// Record assembly
// =============================================================================

/// Derive the full summary record for one store.
///
/// Fails with the first `StoreError` encountered; no partial record is ever
/// returned.
pub fn derive_record(
    store_id: &str,
    logs: &StoreLogs,
    layout: &StoreLayout,
    rules: &FeatureRules,
    window: &ReportWindow,
) -> Result<SummaryRecord, StoreError> {
    let ctx = resolve_identity(store_id, &logs.identity, rules)?;

    let recency = recency_metrics(
        store_id,
        &logs.reports,
        &layout.report_log,
        rules,
        window.report_date,
    )?;
    let line_discount = line_item_discount(store_id, &logs.journal, &layout.journal_log, rules)?;
    let club = club_list(store_id, &logs.journal, &layout.journal_log, rules)?;
    let kit = kits(store_id, &logs.stock, &layout.stock_log, rules)?;
    let polling = corp_polling(store_id, &logs.count, &layout.count_log, rules)?;
    let tomra = deposit_integration(&logs.config, rules);

    Ok(SummaryRecord {
        source_id: ctx.store_id.clone(),
        store_id: ctx.display_id(),
        report_date: window.report_date,
        start_date: window.start_date,
        end_date: window.end_date,
        use_inventory_counting_report: recency.inventory_counting,
        use_suggested_order_report: recency.suggested_order,
        use_nj_rips_report: recency.nj_rips,
        use_nj_buydowns_rips_report: recency.nj_buydowns_rips,
        use_inventory_value_analysis_report: recency.inventory_value_analysis,
        use_frequent_shopper_report: recency.frequent_shopper,
        // Every supported POS version ships price-level UPCs.
        use_price_level_upcs: YesNo::Yes,
        use_line_item_discount: line_discount,
        use_club_list: club,
        use_corp_polling: polling,
        num_of_stores_in_corp_polling: None,
        use_kits: kit,
        use_tomra: tomra,
        use_quick_po: None,
        ecom_doordash: None,
        ecom_ubereats: None,
        ecom_cthive: None,
        ecom_winefetch: None,
        ecom_bottlenose: None,
        ecom_bottlecaps: None,
    })
}
