// OrderPulse - app/pipeline.rs
//
// Run orchestration. Two paths share the same stateless stages:
//
//   current: parse (strict) -> dedup -> clean -> copy -> LSP
//   history: discover -> merge (tolerant, dedup per file) -> clean -> copy -> LSP
//
// "clean" is core::filter::clean_dataset and "LSP" is
// core::lsp::apply_lsp_conditions; neither path has its own rule logic.
//
// Failure policy:
//   - current snapshot unreadable -> the whole run fails, nothing is written
//   - a history snapshot unreadable -> recorded and skipped
//   - an empty summary -> logged, its report file is not written

use crate::core::aggregate::{self, CountrySelection};
use crate::core::dedup::dedup_latest;
use crate::core::discovery::{self, snapshot_date_from_path};
use crate::core::export;
use crate::core::filter::{self, ExclusionRules};
use crate::core::history::merge_history;
use crate::core::lsp::apply_lsp_conditions;
use crate::core::model::{LspConditions, LspRule, OrderRecord, ParseMode, SnapshotFile};
use crate::core::parser::{self, ParseConfig};
use crate::core::report::{RunReport, SnapshotRole};
use crate::platform::config::AppConfig;
use crate::platform::fs as pfs;
use crate::util::constants;
use crate::util::error::{ConfigError, PipelineError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Everything a run needs, in core types. Immutable for the run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    /// Explicit current snapshot; the newest discovered file when `None`.
    pub current_snapshot: Option<PathBuf>,
    pub delimiter: u8,
    pub include_patterns: Vec<String>,
    pub history_dates: BTreeSet<NaiveDate>,
    pub exclusions: ExclusionRules,
    pub lsp: LspConditions,
    pub countries: CountrySelection,
    pub output_dir: PathBuf,
}

impl PipelineConfig {
    /// Build from validated config values. The input directory is required.
    pub fn from_app_config(config: &AppConfig) -> std::result::Result<Self, ConfigError> {
        let input_dir = config
            .input_dir
            .clone()
            .ok_or(ConfigError::MissingValue {
                field: "input.directory",
            })?;
        Ok(Self {
            input_dir,
            current_snapshot: config.current_snapshot.clone(),
            delimiter: config.delimiter,
            include_patterns: config.include_patterns.clone(),
            history_dates: config.history_dates.iter().copied().collect(),
            exclusions: ExclusionRules::new(
                config.excluded_order_types.iter().cloned(),
                config.excluded_store_substrings.iter(),
            ),
            lsp: config
                .lsp_rules
                .iter()
                .map(|(country, rule)| {
                    (
                        country.clone(),
                        LspRule {
                            status: rule.status.clone(),
                            days: rule.days,
                        },
                    )
                })
                .collect(),
            countries: CountrySelection {
                include: config.include_countries.clone(),
                exclude: config.exclude_countries.clone(),
            },
            output_dir: config.output_dir.clone(),
        })
    }
}

// =============================================================================
// Output
// =============================================================================

/// The four cleaned datasets handed to reporting.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub current: Vec<OrderRecord>,
    pub current_without_lsp: Vec<OrderRecord>,
    pub history: Vec<OrderRecord>,
    pub history_without_lsp: Vec<OrderRecord>,
}

// =============================================================================
// Run
// =============================================================================

/// Execute both processing paths.
pub fn run(
    config: &PipelineConfig,
    run_date: NaiveDate,
    report: &mut RunReport,
) -> Result<PipelineOutput> {
    tracing::info!(
        input = %config.input_dir.display(),
        history_dates = config.history_dates.len(),
        lsp_rules = config.lsp.len(),
        %run_date,
        "Pipeline starting"
    );

    let (snapshots, warnings) =
        discovery::discover_snapshots(&config.input_dir, &config.include_patterns)?;
    for w in warnings {
        report.warn(w);
    }

    // Current first: if it fails there is no point merging history.
    let current_path = resolve_current(config, &snapshots)?;
    let current = load_current(&current_path, config.delimiter, report)?;
    let current_without_lsp = filter::clean_dataset(current, &config.exclusions, "current", report);
    let current = apply_lsp_conditions(current_without_lsp.clone(), &config.lsp, "current", report);

    if config.history_dates.is_empty() {
        report.warn("No history dates configured; combined history is empty");
    }
    let history = merge_history(
        &snapshots,
        &config.history_dates,
        config.delimiter,
        report,
    );
    let history_without_lsp = filter::clean_dataset(history, &config.exclusions, "history", report);
    let history = apply_lsp_conditions(history_without_lsp.clone(), &config.lsp, "history", report);

    tracing::info!(
        current = current.len(),
        current_without_lsp = current_without_lsp.len(),
        history = history.len(),
        history_without_lsp = history_without_lsp.len(),
        "Pipeline complete"
    );

    Ok(PipelineOutput {
        current,
        current_without_lsp,
        history,
        history_without_lsp,
    })
}

/// The configured current snapshot, or the newest-dated discovered file.
fn resolve_current(config: &PipelineConfig, snapshots: &[SnapshotFile]) -> Result<PathBuf> {
    if let Some(ref path) = config.current_snapshot {
        return Ok(path.clone());
    }
    // Discovery output is sorted by date, so the last entry is the newest.
    snapshots
        .last()
        .map(|s| s.path.clone())
        .ok_or_else(|| PipelineError::NoCurrentSnapshot {
            directory: config.input_dir.clone(),
        })
}

/// Parse and deduplicate the current snapshot. Any parse failure is fatal.
fn load_current(path: &Path, delimiter: u8, report: &mut RunReport) -> Result<Vec<OrderRecord>> {
    let snapshot_date = snapshot_date_from_path(path);
    let parse_config = ParseConfig {
        delimiter,
        mode: ParseMode::Strict,
        snapshot_date,
    };
    let parsed = match parser::parse_file(path, &parse_config) {
        Ok(p) => p,
        Err(e) => {
            report.file_skipped(path, snapshot_date, SnapshotRole::Current, &e);
            return Err(e.into());
        }
    };
    let rows_read = parsed.stats.rows_read;
    let deduped = dedup_latest(parsed.records);
    report.file_loaded(
        path,
        snapshot_date,
        SnapshotRole::Current,
        parsed.stats,
        deduped.len(),
        parsed.issues,
    );
    report.stage("current.dedup", rows_read, deduped.len());
    Ok(deduped)
}

// =============================================================================
// Reports
// =============================================================================

/// Write every summary and the run report into `<output>/<DD-MM-YYYY>/`.
///
/// Returns the directory written to.
pub fn write_reports(
    output: &PipelineOutput,
    config: &PipelineConfig,
    run_date: NaiveDate,
    report: &mut RunReport,
) -> Result<PathBuf> {
    let dir = config
        .output_dir
        .join(run_date.format(constants::FILENAME_DATE_FORMAT).to_string());
    pfs::ensure_dir(&dir).map_err(|e| PipelineError::Io {
        path: dir.clone(),
        operation: "create output directory",
        source: e,
    })?;

    let countries = &config.countries;
    write_csv(
        &dir,
        constants::REPORT_CURRENT_BY_STATUS,
        &aggregate::count_by_status(&output.current, countries),
        report,
    )?;
    write_csv(
        &dir,
        constants::REPORT_CURRENT_BY_STATUS_WITHOUT_LSP,
        &aggregate::count_by_status(&output.current_without_lsp, countries),
        report,
    )?;
    write_csv(
        &dir,
        constants::REPORT_HISTORY_BY_DATE,
        &aggregate::count_by_date(&output.history, countries),
        report,
    )?;
    write_csv(
        &dir,
        constants::REPORT_HISTORY_BY_DATE_WITHOUT_LSP,
        &aggregate::count_by_date(&output.history_without_lsp, countries),
        report,
    )?;
    write_csv(
        &dir,
        constants::REPORT_LSP_EFFECT,
        &aggregate::lsp_effect(&output.current_without_lsp, &output.current, countries),
        report,
    )?;
    write_csv(
        &dir,
        constants::REPORT_ORDER_AGE,
        &aggregate::order_age_summary(&output.current, run_date, countries),
        report,
    )?;

    let summary_path = dir.join(constants::REPORT_RUN_SUMMARY);
    let writer = pfs::create_buffered(&summary_path).map_err(|e| PipelineError::Io {
        path: summary_path.clone(),
        operation: "create run report",
        source: e,
    })?;
    export::export_json(&*report, writer, &summary_path)?;

    tracing::info!(dir = %dir.display(), "Reports written");
    Ok(dir)
}

fn write_csv<T: Serialize>(
    dir: &Path,
    name: &str,
    rows: &[T],
    report: &mut RunReport,
) -> Result<Option<PathBuf>> {
    if rows.is_empty() {
        report.note(&format!("{name}: no rows for the selected countries, not written"));
        return Ok(None);
    }
    let path = dir.join(name);
    let writer = pfs::create_buffered(&path).map_err(|e| PipelineError::Io {
        path: path.clone(),
        operation: "create report",
        source: e,
    })?;
    let written = export::export_csv(rows, writer, &path)?;
    tracing::debug!(file = %path.display(), rows = written, "Report written");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::test_support::day;
    use std::collections::BTreeMap;
    use std::fs;

    const HEADER: &str = "ORDER CODE;COUNTRY;BASE STORE;ORDER TYPE CODE;PMI ORDER STATUS;RUN TIME;DATE;UPDATE DATE;MODIFIED TIME";

    fn write_snapshot(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut body = String::from(HEADER);
        for row in rows {
            body.push('\n');
            body.push_str(row);
        }
        body.push('\n');
        fs::write(&path, body).unwrap();
        path
    }

    fn config(input: &Path, output: &Path) -> PipelineConfig {
        PipelineConfig {
            input_dir: input.to_path_buf(),
            current_snapshot: None,
            delimiter: b';',
            include_patterns: vec!["*.csv".to_string()],
            history_dates: BTreeSet::new(),
            exclusions: ExclusionRules::default(),
            lsp: LspConditions::default(),
            countries: CountrySelection::default(),
            output_dir: output.to_path_buf(),
        }
    }

    #[test]
    fn test_newest_snapshot_becomes_current() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(
            dir.path(),
            "orders_14-01-2024.csv",
            &["OLD;CZ;s;STD;SHIPPED;14/01/2024 06:00;10/01/2024;12/01/2024;"],
        );
        write_snapshot(
            dir.path(),
            "orders_15-01-2024.csv",
            &["NEW;CZ;s;STD;SHIPPED;15/01/2024 06:00;10/01/2024;12/01/2024;"],
        );
        let cfg = config(dir.path(), dir.path());
        let mut report = RunReport::new(day(15, 1, 2024));
        let out = run(&cfg, day(15, 1, 2024), &mut report).unwrap();
        assert_eq!(out.current.len(), 1);
        assert_eq!(out.current[0].order_code, "NEW");
        assert!(out.history.is_empty());
    }

    #[test]
    fn test_no_snapshot_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), dir.path());
        let mut report = RunReport::new(day(15, 1, 2024));
        let err = run(&cfg, day(15, 1, 2024), &mut report).unwrap_err();
        assert!(matches!(err, PipelineError::NoCurrentSnapshot { .. }));
    }

    #[test]
    fn test_strict_current_failure_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(
            dir.path(),
            "orders_15-01-2024.csv",
            &["A1;CZ;s;STD;SHIPPED;garbage;10/01/2024;12/01/2024;"],
        );
        let cfg = config(dir.path(), dir.path());
        let mut report = RunReport::new(day(15, 1, 2024));
        let err = run(&cfg, day(15, 1, 2024), &mut report).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
        assert_eq!(report.files_skipped(SnapshotRole::Current), 1);
    }

    #[test]
    fn test_unruled_copy_keeps_rows_the_rules_remove() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(
            dir.path(),
            "orders_15-01-2024.csv",
            &[
                "A1;CZ;s;STD;SHIPPED;15/01/2024 06:00;05/01/2024;12/01/2024;",
                "A2;CZ;s;STD;SHIPPED;25/01/2024 06:00;05/01/2024;12/01/2024;",
                "A3;CZ;s;RET;SHIPPED;15/01/2024 06:00;05/01/2024;12/01/2024;",
            ],
        );
        let mut cfg = config(dir.path(), dir.path());
        cfg.exclusions = ExclusionRules::new(["RET"], Vec::<String>::new());
        cfg.lsp = LspConditions::new(BTreeMap::from([(
            "CZ".to_string(),
            LspRule {
                status: "SHIPPED".to_string(),
                days: 15,
            },
        )]));
        let mut report = RunReport::new(day(25, 1, 2024));
        let out = run(&cfg, day(25, 1, 2024), &mut report).unwrap();

        let codes = |rs: &[OrderRecord]| rs.iter().map(|r| r.order_code.clone()).collect::<Vec<_>>();
        assert_eq!(codes(&out.current_without_lsp), vec!["A1", "A2"]);
        assert_eq!(codes(&out.current), vec!["A2"]);
    }

    #[test]
    fn test_write_reports_creates_dated_dir_and_skips_empty() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_snapshot(
            input.path(),
            "orders_15-01-2024.csv",
            &["A1;CZ;s;STD;SHIPPED;15/01/2024 06:00;10/01/2024;12/01/2024;"],
        );
        let cfg = config(input.path(), &output.path().join("reports"));
        let mut report = RunReport::new(day(15, 1, 2024));
        let out = run(&cfg, day(15, 1, 2024), &mut report).unwrap();
        let dir = write_reports(&out, &cfg, day(15, 1, 2024), &mut report).unwrap();

        assert_eq!(dir, output.path().join("reports").join("15-01-2024"));
        assert!(dir.join(constants::REPORT_CURRENT_BY_STATUS).is_file());
        assert!(dir.join(constants::REPORT_RUN_SUMMARY).is_file());
        // No history dates, so the trend files are not written.
        assert!(!dir.join(constants::REPORT_HISTORY_BY_DATE).exists());

        let csv = fs::read_to_string(dir.join(constants::REPORT_CURRENT_BY_STATUS)).unwrap();
        assert!(csv.starts_with("country;status;orders"));
        assert!(csv.contains("CZ;SHIPPED;1"));
    }

    #[test]
    fn test_missing_input_dir_is_a_config_error() {
        let err = PipelineConfig::from_app_config(&AppConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue { field: "input.directory" }));
    }
}
