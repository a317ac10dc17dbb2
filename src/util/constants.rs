// OrderPulse - util/constants.rs
//
// Single source of truth for named constants, column names, date formats,
// and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "OrderPulse";

/// Application identifier used for config directories.
pub const APP_ID: &str = "orderpulse";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default log level when neither RUST_LOG, --debug, nor config set one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Snapshot file format
// =============================================================================

/// Field delimiter used by the order-tracking exports.
pub const DEFAULT_DELIMITER: u8 = b';';

pub const COL_ORDER_CODE: &str = "ORDER CODE";
pub const COL_COUNTRY: &str = "COUNTRY";
pub const COL_BASE_STORE: &str = "BASE STORE";
pub const COL_ORDER_TYPE_CODE: &str = "ORDER TYPE CODE";
pub const COL_PMI_ORDER_STATUS: &str = "PMI ORDER STATUS";
pub const COL_RUN_TIME: &str = "RUN TIME";
pub const COL_DATE: &str = "DATE";
pub const COL_UPDATE_DATE: &str = "UPDATE DATE";
pub const COL_MODIFIED_TIME: &str = "MODIFIED TIME";

/// Every column a snapshot must carry. A file missing any of these is
/// rejected as a whole.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_ORDER_CODE,
    COL_COUNTRY,
    COL_BASE_STORE,
    COL_ORDER_TYPE_CODE,
    COL_PMI_ORDER_STATUS,
    COL_RUN_TIME,
    COL_DATE,
    COL_UPDATE_DATE,
    COL_MODIFIED_TIME,
];

/// Fixed format for the date portion of `UPDATE DATE`.
pub const UPDATE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Day-first formats tried, in order, for `RUN TIME`, `DATE` and
/// `MODIFIED TIME`. Date-only formats come last and resolve to midnight.
pub const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

pub const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%Y-%m-%d"];

/// Date encoded in snapshot file names and used for history dates and
/// output directory names.
pub const FILENAME_DATE_FORMAT: &str = "%d-%m-%Y";

/// Maximum number of field-level parse problems kept verbatim per file.
/// Counts are always exact; only the stored samples are capped.
pub const MAX_PARSE_ISSUES_PER_FILE: usize = 100;

// =============================================================================
// Discovery
// =============================================================================

/// Filename glob patterns a snapshot must match when none are configured.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.csv", "*.txt"];

// =============================================================================
// Rule limits
// =============================================================================

/// Largest accepted LSP day threshold. Anything above a year is almost
/// certainly a typo in the config file.
pub const MAX_LSP_DAYS: i64 = 366;

// =============================================================================
// Output
// =============================================================================

/// Default directory where per-run report folders are created.
pub const DEFAULT_OUTPUT_DIR: &str = "reports";

pub const REPORT_CURRENT_BY_STATUS: &str = "current_by_status.csv";
pub const REPORT_CURRENT_BY_STATUS_WITHOUT_LSP: &str = "current_by_status_without_lsp.csv";
pub const REPORT_HISTORY_BY_DATE: &str = "history_by_date.csv";
pub const REPORT_HISTORY_BY_DATE_WITHOUT_LSP: &str = "history_by_date_without_lsp.csv";
pub const REPORT_LSP_EFFECT: &str = "lsp_effect.csv";
pub const REPORT_ORDER_AGE: &str = "current_order_age.csv";
pub const REPORT_RUN_SUMMARY: &str = "run_report.json";
