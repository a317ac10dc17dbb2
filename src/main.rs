// OrderPulse - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading (default location or --config)
// 3. Logging initialisation (debug mode support)
// 4. One pipeline run and report export

use orderpulse::app::pipeline::{self, PipelineConfig};
use orderpulse::core::report::RunReport;
use orderpulse::platform::config::{self, AppConfig, PlatformPaths};
use orderpulse::util::{self, error::PipelineError};

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// OrderPulse - order-tracking snapshot pipeline.
///
/// Reads dated semicolon-delimited order snapshots, removes duplicates and
/// excluded orders, applies per-country LSP conditions and writes summary
/// reports into a dated output directory.
#[derive(Parser, Debug)]
#[command(name = "OrderPulse", version, about)]
struct Cli {
    /// Directory holding the dated snapshot files (overrides [input] directory).
    path: Option<PathBuf>,

    /// Path to config.toml (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Current snapshot file (defaults to the newest dated file).
    #[arg(long = "current")]
    current: Option<PathBuf>,

    /// Root directory for report output.
    #[arg(short = 'o', long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Run date as DD-MM-YYYY (defaults to today).
    #[arg(long = "run-date")]
    run_date: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Config is read before logging so its [logging] level can apply.
    let loaded = load_app_config(&cli);
    let config_level = loaded
        .as_ref()
        .ok()
        .and_then(|(c, _)| c.log_level.clone());
    util::logging::init(cli.debug, config_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "OrderPulse starting"
    );

    if let Err(e) = run(cli, loaded) {
        tracing::error!(error = %e, "Run failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

type Loaded = Result<(AppConfig, Vec<String>), PipelineError>;

/// Load config.toml. A missing file at the default location means defaults;
/// a missing file given with --config is an error.
fn load_app_config(cli: &Cli) -> Loaded {
    let (path, explicit) = match cli.config {
        Some(ref p) => (p.clone(), true),
        None => (PlatformPaths::resolve().config_file(), false),
    };
    if !explicit && !path.exists() {
        return Ok((AppConfig::default(), Vec::new()));
    }
    Ok(config::load_config(&path)?)
}

fn run(cli: Cli, loaded: Loaded) -> Result<(), PipelineError> {
    let (mut app_config, warnings) = loaded?;
    for w in &warnings {
        tracing::warn!(warning = %w, "Config warning");
    }

    // CLI overrides
    if let Some(path) = cli.path {
        app_config.input_dir = Some(path);
    }
    if let Some(current) = cli.current {
        app_config.current_snapshot = Some(current);
    }
    if let Some(output) = cli.output_dir {
        app_config.output_dir = output;
    }
    let run_date = match cli.run_date {
        Some(ref raw) => config::parse_config_date("--run-date", raw)?,
        None => chrono::Local::now().date_naive(),
    };

    let pipeline_config = PipelineConfig::from_app_config(&app_config)?;
    let mut report = RunReport::new(run_date);
    for w in warnings {
        report.warn(w);
    }

    let output = pipeline::run(&pipeline_config, run_date, &mut report)?;
    let dir = pipeline::write_reports(&output, &pipeline_config, run_date, &mut report)?;

    log_summary(&report, run_date, &dir);
    Ok(())
}

fn log_summary(report: &RunReport, run_date: NaiveDate, dir: &std::path::Path) {
    use orderpulse::core::report::SnapshotRole;
    tracing::info!(
        %run_date,
        history_loaded = report.files_loaded(SnapshotRole::History),
        history_skipped = report.files_skipped(SnapshotRole::History),
        tolerated_failures = report.tolerated_failures(),
        warnings = report.warnings.len(),
        output = %dir.display(),
        "OrderPulse finished"
    );
}
