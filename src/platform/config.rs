// OrderPulse - platform/config.rs
//
// Config directory resolution and config.toml loading with validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.
//
// Example config.toml:
//
//   [input]
//   directory = "data/snapshots"
//   current_snapshot = "data/snapshots/order_tracking_15-01-2024.csv"
//   delimiter = ";"
//
//   [history]
//   dates = ["01-01-2024", "08-01-2024", "15-01-2024"]
//
//   [exclusions]
//   order_type_codes = ["ZRET", "ZFOC"]
//   base_store_substrings = ["employee", "test"]
//
//   [lsp.CZ]
//   status = "SHIPPED"
//   days = 15
//
//   [report]
//   exclude_countries = ["XX"]
//
//   [output]
//   directory = "reports"

use crate::util::constants;
use crate::util::error::ConfigError;
use chrono::NaiveDate;
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolved platform paths for OrderPulse configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/orderpulse/ or %APPDATA%\orderpulse\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be determined.
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
// config.toml shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are ignored so a newer config file still loads.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub input: InputSection,
    pub history: HistorySection,
    pub exclusions: ExclusionsSection,
    /// `[lsp.<COUNTRY>]` tables.
    pub lsp: BTreeMap<String, LspSection>,
    pub report: ReportSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

/// `[input]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct InputSection {
    /// Directory holding every dated snapshot.
    pub directory: Option<PathBuf>,
    /// Explicit current snapshot. Newest discovered file when unset.
    pub current_snapshot: Option<PathBuf>,
    /// Single-character field delimiter.
    pub delimiter: Option<String>,
    /// Filename glob patterns a snapshot must match.
    pub include_patterns: Option<Vec<String>>,
}

/// `[history]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct HistorySection {
    /// Target dates in `DD-MM-YYYY`.
    pub dates: Vec<String>,
}

/// `[exclusions]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExclusionsSection {
    pub order_type_codes: Vec<String>,
    pub base_store_substrings: Vec<String>,
}

/// One `[lsp.<COUNTRY>]` table.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LspSection {
    pub status: String,
    pub days: i64,
}

/// `[report]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub include_countries: Vec<String>,
    pub exclude_countries: Vec<String>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub directory: Option<PathBuf>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

// =============================================================================
// Validated configuration
// =============================================================================

/// Validated run configuration. Plain values only; the app layer turns
/// these into core types.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input_dir: Option<PathBuf>,
    pub current_snapshot: Option<PathBuf>,
    pub delimiter: u8,
    pub include_patterns: Vec<String>,
    /// Target history dates, in the order given.
    pub history_dates: Vec<NaiveDate>,
    pub excluded_order_types: Vec<String>,
    pub excluded_store_substrings: Vec<String>,
    /// Country -> (status, days).
    pub lsp_rules: BTreeMap<String, LspSection>,
    pub include_countries: Vec<String>,
    pub exclude_countries: Vec<String>,
    pub output_dir: PathBuf,
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_dir: None,
            current_snapshot: None,
            delimiter: constants::DEFAULT_DELIMITER,
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            history_dates: Vec::new(),
            excluded_order_types: Vec::new(),
            excluded_store_substrings: Vec::new(),
            lsp_rules: BTreeMap::new(),
            include_countries: Vec::new(),
            exclude_countries: Vec::new(),
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            log_level: None,
        }
    }
}

/// Parse a `DD-MM-YYYY` string.
pub fn parse_config_date(field: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), constants::FILENAME_DATE_FORMAT).map_err(|_| {
        ConfigError::InvalidDate {
            field: field.to_string(),
            value: value.to_string(),
        }
    })
}

/// Load and validate a config.toml file.
///
/// An unreadable or unparseable file is an error: the run cannot guess its
/// rules. Individual out-of-range values become warnings and are skipped.
pub fn load_config(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let (config, warnings) = parse_config(&content, path)?;
    tracing::info!(path = %path.display(), warnings = warnings.len(), "Loaded config.toml");
    Ok((config, warnings))
}

/// Validate config.toml content. `path` is used for error context only.
pub fn parse_config(content: &str, path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Input --
    config.input_dir = raw.input.directory;
    config.current_snapshot = raw.input.current_snapshot;
    if let Some(ref delim) = raw.input.delimiter {
        match delim.as_bytes() {
            [b] if b.is_ascii() => config.delimiter = *b,
            _ => warnings.push(format!(
                "[input] delimiter = \"{delim}\" must be a single ASCII character. Using ';'."
            )),
        }
    }
    if let Some(patterns) = raw.input.include_patterns {
        config.include_patterns = patterns;
    }

    // -- History dates --
    for value in &raw.history.dates {
        match parse_config_date("history.dates", value) {
            Ok(date) if config.history_dates.contains(&date) => {
                warnings.push(format!("[history] date \"{value}\" is listed twice."));
            }
            Ok(date) => config.history_dates.push(date),
            Err(e) => warnings.push(format!("[history] {e}. Skipped.")),
        }
    }

    // -- Exclusions --
    config.excluded_order_types = non_empty(raw.exclusions.order_type_codes);
    config.excluded_store_substrings = non_empty(raw.exclusions.base_store_substrings);

    // -- LSP rules --
    for (country, rule) in raw.lsp {
        let country = country.trim().to_string();
        if rule.status.trim().is_empty() {
            warnings.push(format!("[lsp.{country}] status is empty. Rule skipped."));
            continue;
        }
        if !(0..=constants::MAX_LSP_DAYS).contains(&rule.days) {
            let err = ConfigError::ValueOutOfRange {
                field: format!("lsp.{country}.days"),
                value: rule.days.to_string(),
                expected: format!("0-{}", constants::MAX_LSP_DAYS),
            };
            warnings.push(format!("{err}. Rule skipped."));
            continue;
        }
        config.lsp_rules.insert(
            country,
            LspSection {
                status: rule.status.trim().to_string(),
                days: rule.days,
            },
        );
    }

    // -- Report --
    config.include_countries = non_empty(raw.report.include_countries);
    config.exclude_countries = non_empty(raw.report.exclude_countries);

    // -- Output --
    if let Some(dir) = raw.output.directory {
        config.output_dir = dir;
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    Ok((config, warnings))
}

fn non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
