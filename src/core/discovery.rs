// OrderPulse - core/discovery.rs
//
// Lists dated snapshot files in the input directory.
//
// A snapshot file name encodes its date as the final underscore-delimited
// segment of the stem, e.g. `order_tracking_15-01-2024.csv`. The directory
// is not descended into; per-entry access errors and undated names are
// non-fatal and come back as warnings.

use crate::core::model::SnapshotFile;
use crate::util::constants;
use crate::util::error::DiscoveryError;
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Discover dated snapshot files directly under `root`.
///
/// Returns the files sorted by (date, path) and a list of warnings.
/// Fails only when `root` itself is missing or not a directory.
pub fn discover_snapshots(
    root: &Path,
    include_patterns: &[String],
) -> Result<(Vec<SnapshotFile>, Vec<String>), DiscoveryError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DiscoveryError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(DiscoveryError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let include_pats = compile_patterns(include_patterns);
    let mut files = Vec::new();
    let mut warnings = Vec::new();

    let walker = walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(DiscoveryError::Traversal {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                let msg = format!("Cannot access entry in '{}': {e}", root.display());
                tracing::debug!(warning = %msg, "Discovery warning");
                warnings.push(msg);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            warnings.push(format!("Skipping '{}': non-UTF-8 filename", path.display()));
            continue;
        };

        if !is_included(file_name, &include_pats) {
            tracing::debug!(file = file_name, "Not matched by include patterns");
            continue;
        }

        match snapshot_date_from_path(path) {
            Some(date) => files.push(SnapshotFile {
                path: path.to_path_buf(),
                date,
            }),
            None => {
                let msg = format!(
                    "Skipping '{file_name}': no DD-MM-YYYY date as the last '_' segment of its name"
                );
                tracing::debug!(warning = %msg, "Discovery warning");
                warnings.push(msg);
            }
        }
    }

    files.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));

    tracing::debug!(
        root = %root.display(),
        files = files.len(),
        warnings = warnings.len(),
        "Discovery complete"
    );

    Ok((files, warnings))
}

/// Extract the snapshot date from a file name such as `orders_15-01-2024.csv`.
pub fn snapshot_date_from_path(path: &Path) -> Option<NaiveDate> {
    static DATE_SHAPE: OnceLock<Regex> = OnceLock::new();
    // Pattern is covered by the unit tests below.
    let shape = DATE_SHAPE
        .get_or_init(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("snapshot date regex"));

    let stem = path.file_stem()?.to_str()?;
    let segment = stem.rsplit('_').next()?;
    if !shape.is_match(segment) {
        return None;
    }
    NaiveDate::parse_from_str(segment, constants::FILENAME_DATE_FORMAT).ok()
}

/// Compile glob patterns, logging and skipping invalid ones.
fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, error = %e, "Invalid glob pattern, skipping");
                None
            }
        })
        .collect()
}

/// Extensions from exports vary in case (`.csv`, `.CSV`).
const INCLUDE_MATCH: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// An empty include list means "include all". Matching ignores case.
fn is_included(file_name: &str, include_pats: &[glob::Pattern]) -> bool {
    include_pats.is_empty()
        || include_pats
            .iter()
            .any(|p| p.matches_with(file_name, INCLUDE_MATCH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn default_patterns() -> Vec<String> {
        constants::DEFAULT_INCLUDE_PATTERNS
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }

    #[test]
    fn test_date_from_final_segment() {
        assert_eq!(
            snapshot_date_from_path(&PathBuf::from("dir/order_tracking_03-01-2024.csv")),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
        assert_eq!(
            snapshot_date_from_path(&PathBuf::from("03-01-2024.csv")),
            NaiveDate::from_ymd_opt(2024, 1, 3)
        );
    }

    #[test]
    fn test_rejects_undated_or_misplaced_dates() {
        for name in [
            "orders.csv",
            "orders_03-01-2024_final.csv",
            "orders_3-1-2024.csv",
            "orders_2024-01-03.csv",
            "orders_31-02-2024.csv",
        ] {
            assert_eq!(
                snapshot_date_from_path(&PathBuf::from(name)),
                None,
                "{name} should not yield a date"
            );
        }
    }

    #[test]
    fn test_discovers_sorted_dated_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("orders_03-01-2024.csv"), "x").unwrap();
        fs::write(root.join("orders_01-01-2024.csv"), "x").unwrap();
        fs::write(root.join("orders_02-01-2023.csv"), "x").unwrap();
        fs::write(root.join("notes.csv"), "x").unwrap();
        fs::write(root.join("orders_04-01-2024.xlsx"), "x").unwrap();
        fs::create_dir(root.join("archive_05-01-2024")).unwrap();

        let (files, warnings) = discover_snapshots(root, &default_patterns()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "orders_02-01-2023.csv",
                "orders_01-01-2024.csv",
                "orders_03-01-2024.csv"
            ]
        );
        assert_eq!(warnings.len(), 1, "notes.csv is undated: {warnings:?}");
    }

    #[test]
    fn test_include_patterns_ignore_case() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("orders_01-01-2024.CSV"), "x").unwrap();
        fs::write(root.join("orders_02-01-2024.Txt"), "x").unwrap();

        let (files, warnings) = discover_snapshots(root, &default_patterns()).unwrap();
        let dates: Vec<_> = files.iter().map(|f| f.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
            ]
        );
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_root_not_found() {
        let result = discover_snapshots(Path::new("/nonexistent/orderpulse/input"), &[]);
        assert!(matches!(result, Err(DiscoveryError::RootNotFound { .. })));
    }

    #[test]
    fn test_root_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("orders_01-01-2024.csv");
        fs::write(&file, "content").unwrap();
        let result = discover_snapshots(&file, &[]);
        assert!(matches!(result, Err(DiscoveryError::NotADirectory { .. })));
    }
}
