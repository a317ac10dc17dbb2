// OrderPulse - core/report.rs
//
// Per-run reporter. Created once per run and passed down by `&mut` to every
// stage that has something to record. Each record is also emitted as a
// tracing event inside the run span, so the log and the JSON report always
// agree.

use crate::core::parser::ParseStats;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Which processing path a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotRole {
    Current,
    History,
}

/// Outcome of one snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Loaded {
        stats: ParseStats,
        rows_after_dedup: usize,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub snapshot_date: Option<NaiveDate>,
    pub role: SnapshotRole,
    pub outcome: FileOutcome,
    /// First few row-level problems from the parser.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Row counts in and out of one filtering stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: String,
    pub rows_in: usize,
    pub rows_out: usize,
}

/// Structured record of everything a run did.
#[derive(Debug, Serialize)]
pub struct RunReport {
    #[serde(skip)]
    span: tracing::Span,
    pub run_date: NaiveDate,
    pub files: Vec<FileReport>,
    pub stages: Vec<StageCount>,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn new(run_date: NaiveDate) -> Self {
        Self {
            span: tracing::info_span!("run", run_date = %run_date),
            run_date,
            files: Vec::new(),
            stages: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn file_loaded(
        &mut self,
        path: &Path,
        snapshot_date: Option<NaiveDate>,
        role: SnapshotRole,
        stats: ParseStats,
        rows_after_dedup: usize,
        issues: Vec<String>,
    ) {
        self.span.in_scope(|| {
            tracing::info!(
                file = %path.display(),
                role = ?role,
                rows_read = stats.rows_read,
                rows_bad_update_date = stats.rows_bad_update_date,
                rows_malformed = stats.rows_malformed,
                tolerated_date_failures = stats.tolerated_failures(),
                rows_after_dedup,
                "Snapshot loaded"
            );
            if stats.tolerated_failures() > 0 {
                tracing::warn!(
                    file = %path.display(),
                    run_time = stats.unparsed_run_time,
                    date = stats.unparsed_date,
                    modified_time = stats.unparsed_modified_time,
                    "Unreadable date values kept as unparsed"
                );
            }
        });
        self.files.push(FileReport {
            path: path.to_path_buf(),
            snapshot_date,
            role,
            outcome: FileOutcome::Loaded {
                stats,
                rows_after_dedup,
            },
            issues,
        });
    }

    pub fn file_skipped(
        &mut self,
        path: &Path,
        snapshot_date: Option<NaiveDate>,
        role: SnapshotRole,
        reason: &dyn Display,
    ) {
        let reason = reason.to_string();
        self.span.in_scope(|| {
            tracing::error!(file = %path.display(), role = ?role, error = %reason, "Snapshot skipped");
        });
        self.files.push(FileReport {
            path: path.to_path_buf(),
            snapshot_date,
            role,
            outcome: FileOutcome::Skipped { reason },
            issues: Vec::new(),
        });
    }

    pub fn stage(&mut self, stage: &str, rows_in: usize, rows_out: usize) {
        self.span.in_scope(|| {
            tracing::info!(
                stage,
                rows_in,
                rows_out,
                removed = rows_in.saturating_sub(rows_out),
                "Stage complete"
            );
        });
        self.stages.push(StageCount {
            stage: stage.to_string(),
            rows_in,
            rows_out,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.span.in_scope(|| tracing::warn!("{}", message));
        self.warnings.push(message);
    }

    /// Log an informational line inside the run span without recording it.
    pub fn note(&self, message: &str) {
        self.span.in_scope(|| tracing::info!("{}", message));
    }

    pub fn files_loaded(&self, role: SnapshotRole) -> usize {
        self.files
            .iter()
            .filter(|f| f.role == role && matches!(f.outcome, FileOutcome::Loaded { .. }))
            .count()
    }

    pub fn files_skipped(&self, role: SnapshotRole) -> usize {
        self.files
            .iter()
            .filter(|f| f.role == role && matches!(f.outcome, FileOutcome::Skipped { .. }))
            .count()
    }

    /// Total tolerated date failures across all loaded files.
    pub fn tolerated_failures(&self) -> usize {
        self.files
            .iter()
            .map(|f| match &f.outcome {
                FileOutcome::Loaded { stats, .. } => stats.tolerated_failures(),
                FileOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn stage_count(&self, stage: &str) -> Option<&StageCount> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}
