// OrderPulse - core/history.rs
//
// Historical merge: every discovered snapshot whose encoded date is in the
// target set is parsed (tolerant mode) and deduplicated on its own, then
// appended to one combined dataset. The same order appearing in several
// snapshots is expected and kept; duplicates are only collapsed within a
// single file.
//
// A file that fails to parse is recorded in the run report and skipped.
// It never aborts the merge of the remaining files.

use crate::core::dedup::dedup_latest;
use crate::core::model::{OrderRecord, ParseMode, SnapshotFile};
use crate::core::parser::{self, ParseConfig};
use crate::core::report::{RunReport, SnapshotRole};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Merge the snapshots whose date is in `target_dates`.
///
/// `snapshots` is normally the output of `discover_snapshots`; files whose
/// date is not targeted are skipped without being opened.
pub fn merge_history(
    snapshots: &[SnapshotFile],
    target_dates: &BTreeSet<NaiveDate>,
    delimiter: u8,
    report: &mut RunReport,
) -> Vec<OrderRecord> {
    let mut combined = Vec::new();
    let mut rows_read = 0usize;
    let mut matched_dates = BTreeSet::new();

    for snapshot in snapshots {
        if !target_dates.contains(&snapshot.date) {
            tracing::trace!(file = %snapshot.path.display(), "Not a target date, skipped");
            continue;
        }
        matched_dates.insert(snapshot.date);

        let config = ParseConfig {
            delimiter,
            mode: ParseMode::Tolerant,
            snapshot_date: Some(snapshot.date),
        };
        let parsed = match parser::parse_file(&snapshot.path, &config) {
            Ok(p) => p,
            Err(e) => {
                report.file_skipped(
                    &snapshot.path,
                    Some(snapshot.date),
                    SnapshotRole::History,
                    &e,
                );
                continue;
            }
        };

        rows_read += parsed.stats.rows_read;
        let deduped = dedup_latest(parsed.records);
        report.file_loaded(
            &snapshot.path,
            Some(snapshot.date),
            SnapshotRole::History,
            parsed.stats,
            deduped.len(),
            parsed.issues,
        );
        combined.extend(deduped);
    }

    for missing in target_dates.difference(&matched_dates) {
        report.warn(format!(
            "No snapshot found for history date {}",
            missing.format(crate::util::constants::FILENAME_DATE_FORMAT)
        ));
    }

    report.stage("history.merge", rows_read, combined.len());
    combined
}
