// OrderPulse - tests/e2e_pipeline.rs
//
// End-to-end tests for a full run: config.toml on disk, discovery of the
// fixture snapshots, both processing paths, and report files written into a
// temporary output directory. Real files, real walkdir/csv/chrono, no mocks.
//
// Fixture layout (tests/fixtures/snapshots):
//   order_tracking_01-01-2024.csv  history; B1 twice, B2 with a bad DATE cell
//   order_tracking_08-01-2024.csv  history; B1 (7 days), B3 (38 days)
//   order_tracking_15-01-2024.csv  current; duplicates, exclusions, a bad
//                                  UPDATE DATE row, CZ/SHIPPED at 10 and 20 days
//   readme.txt                     no encoded date, ignored with a warning

use orderpulse::app::pipeline::{self, PipelineConfig, PipelineOutput};
use orderpulse::core::model::OrderRecord;
use orderpulse::core::report::{RunReport, SnapshotRole};
use orderpulse::platform::config::load_config;
use orderpulse::util::error::{ParseError, PipelineError};

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Helpers
// =============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("snapshots")
}

fn day(d: u32, m: u32, y: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Write a config.toml into `dir` pointing at the fixtures and `output`.
fn write_config(dir: &Path, output: &Path, history_dates: &[&str]) -> PathBuf {
    let dates = history_dates
        .iter()
        .map(|d| format!("\"{d}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let content = format!(
        r#"
[input]
directory = '{input}'
delimiter = ";"

[history]
dates = [{dates}]

[exclusions]
order_type_codes = ["ZRET"]
base_store_substrings = ["employee"]

[lsp.CZ]
status = "SHIPPED"
days = 15

[output]
directory = '{output}'
"#,
        input = fixtures_dir().display(),
        output = output.display(),
    );
    let path = dir.join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

fn codes(records: &[OrderRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.order_code.clone()).collect()
}

fn run_with(config_path: &Path, run_date: NaiveDate) -> (PipelineConfig, PipelineOutput, RunReport) {
    let (app_config, warnings) = load_config(config_path).unwrap();
    assert!(warnings.is_empty(), "unexpected config warnings: {warnings:?}");
    let config = PipelineConfig::from_app_config(&app_config).unwrap();
    let mut report = RunReport::new(run_date);
    let output = pipeline::run(&config, run_date, &mut report).unwrap();
    (config, output, report)
}

// =============================================================================
// Current path
// =============================================================================

/// Newest file is current; duplicates, exclusions, bad update dates and the
/// CZ/SHIPPED rule all apply.
#[test]
fn e2e_current_snapshot_cleaned_and_ruled() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = write_config(tmp.path(), &tmp.path().join("out"), &[]);
    let (_, output, report) = run_with(&cfg, day(15, 1, 2024));

    // A3 excluded by store, A4 by order type, A5 dropped for its UPDATE DATE.
    assert_eq!(
        codes(&output.current_without_lsp),
        ["A1", "A2", "A6", "A7"].iter().map(|s| s.to_string()).collect()
    );
    // A1 is CZ/SHIPPED at 10 days, suppressed; A2 at 20 days stays.
    assert_eq!(
        codes(&output.current),
        ["A2", "A6", "A7"].iter().map(|s| s.to_string()).collect()
    );

    // Dedup kept the latest A1 row.
    let a1 = output
        .current_without_lsp
        .iter()
        .find(|r| r.order_code == "A1")
        .unwrap();
    assert_eq!(a1.update_date, day(12, 1, 2024));
    assert_eq!(a1.days_since_run_time, Some(10));

    assert_eq!(report.files_loaded(SnapshotRole::Current), 1);
    assert!(
        report.warnings.iter().any(|w| w.contains("readme.txt")),
        "undated file should be reported: {:?}",
        report.warnings
    );
}

/// The unruled copy is exactly the ruled output plus the rows the rule removed.
#[test]
fn e2e_lsp_only_removes_matching_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = write_config(tmp.path(), &tmp.path().join("out"), &[]);
    let (_, output, _) = run_with(&cfg, day(15, 1, 2024));

    let kept = codes(&output.current);
    for r in &output.current_without_lsp {
        if !kept.contains(&r.order_code) {
            assert_eq!(r.country, "CZ");
            assert_eq!(r.pmi_order_status, "SHIPPED");
            assert!(r.days_since_run_time.unwrap() <= 15);
        }
    }
}

// =============================================================================
// History path
// =============================================================================

/// Only targeted dates are loaded; a target with no file is a warning.
#[test]
fn e2e_history_loads_only_target_dates() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = write_config(
        tmp.path(),
        &tmp.path().join("out"),
        &["01-01-2024", "08-01-2024", "22-01-2024"],
    );
    let (_, output, report) = run_with(&cfg, day(15, 1, 2024));

    assert_eq!(report.files_loaded(SnapshotRole::History), 2);
    assert!(output
        .history_without_lsp
        .iter()
        .all(|r| r.snapshot_date != Some(day(15, 1, 2024))));
    assert!(report.warnings.iter().any(|w| w.contains("22-01-2024")));

    // Dedup is per file: B1 appears once for each of the two dates.
    assert_eq!(output.history_without_lsp.len(), 4);
    let b1_dates: BTreeSet<_> = output
        .history_without_lsp
        .iter()
        .filter(|r| r.order_code == "B1")
        .filter_map(|r| r.snapshot_date)
        .collect();
    assert_eq!(b1_dates, BTreeSet::from([day(1, 1, 2024), day(8, 1, 2024)]));
}

/// A bad DATE cell in a history file is tolerated and counted, and the record
/// survives the rules because it has no day count.
#[test]
fn e2e_history_tolerates_bad_date_cells() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = write_config(tmp.path(), &tmp.path().join("out"), &["01-01-2024", "08-01-2024"]);
    let (_, output, report) = run_with(&cfg, day(15, 1, 2024));

    assert_eq!(report.tolerated_failures(), 1);
    let b2 = output.history.iter().find(|r| r.order_code == "B2").unwrap();
    assert!(b2.date.is_unparsed());
    assert_eq!(b2.days_since_run_time, None);

    // B1 (1 and 7 days) suppressed on both dates, B3 (38 days) kept.
    assert_eq!(
        codes(&output.history),
        ["B2", "B3"].iter().map(|s| s.to_string()).collect()
    );
}

// =============================================================================
// Failure handling
// =============================================================================

/// A current snapshot with an unparseable RUN TIME fails the run.
#[test]
fn e2e_bad_current_snapshot_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in");
    fs::create_dir(&input).unwrap();
    fs::write(
        input.join("orders_15-01-2024.csv"),
        "ORDER CODE;COUNTRY;BASE STORE;ORDER TYPE CODE;PMI ORDER STATUS;RUN TIME;DATE;UPDATE DATE;MODIFIED TIME\n\
         A1;CZ;web-cz;STD;SHIPPED;yesterday;05/01/2024;12/01/2024;\n",
    )
    .unwrap();

    let (mut app_config, _) = load_config(&write_config(tmp.path(), &tmp.path().join("out"), &[])).unwrap();
    app_config.input_dir = Some(input);
    let config = PipelineConfig::from_app_config(&app_config).unwrap();
    let mut report = RunReport::new(day(15, 1, 2024));

    let err = pipeline::run(&config, day(15, 1, 2024), &mut report).unwrap_err();
    assert!(
        matches!(err, PipelineError::Parse(ParseError::FieldParse { .. })),
        "got {err}"
    );
    assert_eq!(report.files_skipped(SnapshotRole::Current), 1);
}

/// A current snapshot missing a required column fails the run.
#[test]
fn e2e_current_missing_column_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let current = tmp.path().join("orders_15-01-2024.csv");
    fs::write(&current, "ORDER CODE;COUNTRY\nA1;CZ\n").unwrap();

    let (mut app_config, _) = load_config(&write_config(tmp.path(), &tmp.path().join("out"), &[])).unwrap();
    app_config.current_snapshot = Some(current);
    let config = PipelineConfig::from_app_config(&app_config).unwrap();
    let mut report = RunReport::new(day(15, 1, 2024));

    let err = pipeline::run(&config, day(15, 1, 2024), &mut report).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Parse(ParseError::MissingColumn { .. })
    ));
}

// =============================================================================
// Reports
// =============================================================================

/// Reports land in `<output>/<DD-MM-YYYY>`, created on demand.
#[test]
fn e2e_reports_written_to_dated_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let out_root = tmp.path().join("reports").join("nested");
    let cfg = write_config(tmp.path(), &out_root, &["01-01-2024", "08-01-2024"]);
    let (config, output, mut report) = run_with(&cfg, day(16, 1, 2024));

    let dir = pipeline::write_reports(&output, &config, day(16, 1, 2024), &mut report).unwrap();
    assert_eq!(dir, out_root.join("16-01-2024"));

    let by_status = fs::read_to_string(dir.join("current_by_status.csv")).unwrap();
    assert!(by_status.contains("CZ;DELIVERED;1"), "{by_status}");
    assert!(by_status.contains("CZ;SHIPPED;1"), "{by_status}");
    assert!(by_status.contains("SK;CREATED;1"), "{by_status}");

    let unruled = fs::read_to_string(dir.join("current_by_status_without_lsp.csv")).unwrap();
    assert!(unruled.contains("CZ;SHIPPED;2"), "{unruled}");

    let effect = fs::read_to_string(dir.join("lsp_effect.csv")).unwrap();
    assert!(effect.contains("CZ;SHIPPED;2;1;1"), "{effect}");

    assert!(dir.join("history_by_date.csv").is_file());
    assert!(dir.join("current_order_age.csv").is_file());

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("run_report.json")).unwrap()).unwrap();
    assert_eq!(summary["run_date"], "2024-01-16");
    assert_eq!(summary["files"].as_array().unwrap().len(), 3);

    // A second run into the same directory succeeds.
    pipeline::write_reports(&output, &config, day(16, 1, 2024), &mut report).unwrap();
}
