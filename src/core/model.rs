// OrderPulse - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary across all layers.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

// =============================================================================
// Order Record (normalised output of parsing)
// =============================================================================

/// One cleaned row of an order-tracking snapshot.
///
/// Created by the parser, touched afterwards only by
/// `derive_days_since_run_time`. The exclusion filter and the LSP rule
/// engine drop records but never edit them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub order_code: String,
    pub country: String,

    /// Origin channel/store. `None` when the cell is empty.
    pub base_store: Option<String>,

    pub order_type_code: String,
    pub pmi_order_status: String,

    /// When the snapshot was captured.
    pub run_time: FieldTime,

    /// Order reference date (creation or dispatch).
    pub date: FieldTime,

    /// Last modification of the order. Date only; rows without a valid
    /// value never make it out of the parser.
    pub update_date: NaiveDate,

    pub modified_time: FieldTime,

    /// `run_time.date - date.date` in whole days. Filled in after store
    /// exclusion; `None` until then or when either side is not a valid date.
    pub days_since_run_time: Option<i64>,

    /// Date encoded in the source file name, if it carried one.
    pub snapshot_date: Option<NaiveDate>,

    /// 1-based line number in the source file (header is line 1).
    pub line_number: u64,
}

impl OrderRecord {
    /// Whole calendar days between the date parts of `run_time` and `date`.
    /// Time of day never affects the result.
    pub fn compute_days_since_run_time(&self) -> Option<i64> {
        let run = self.run_time.date()?;
        let reference = self.date.date()?;
        Some((run - reference).num_days())
    }

    /// Days between `today` and the last update of the order.
    pub fn order_age(&self, today: NaiveDate) -> i64 {
        (today - self.update_date).num_days()
    }

    /// Date this record is reported under in trend views: the capture date,
    /// falling back to the date encoded in the file name.
    pub fn report_date(&self) -> Option<NaiveDate> {
        self.run_time.date().or(self.snapshot_date)
    }
}

/// A parsed date/time cell.
///
/// `Unparsed` keeps tolerated failures distinguishable from both valid
/// values and genuinely empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum FieldTime {
    Valid(NaiveDateTime),
    Missing,
    Unparsed(String),
}

impl FieldTime {
    /// Date portion of a valid value.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            FieldTime::Valid(ts) => Some(ts.date()),
            FieldTime::Missing | FieldTime::Unparsed(_) => None,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, FieldTime::Unparsed(_))
    }
}

// =============================================================================
// Parse mode
// =============================================================================

/// How the parser treats a day-first date cell it cannot read.
///
/// Bad `UPDATE DATE` values drop the row in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Any unreadable `RUN TIME`, `DATE` or `MODIFIED TIME` fails the file.
    /// Used for the current snapshot.
    Strict,

    /// Unreadable values become `FieldTime::Unparsed` and are counted.
    /// Used for the historical merge.
    Tolerant,
}

// =============================================================================
// Snapshot file (output of discovery)
// =============================================================================

/// A file in the input directory whose name carries a `DD-MM-YYYY` date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub date: NaiveDate,
}

// =============================================================================
// LSP conditions
// =============================================================================

/// Suppression rule for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LspRule {
    /// Status an order must be in to be suppressed (exact match).
    pub status: String,

    /// Orders with `days_since_run_time <= days` are suppressed.
    pub days: i64,
}

/// Per-country LSP rules, keyed by country code. Immutable for a run.
///
/// Backed by a `BTreeMap` so rules are always applied in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LspConditions {
    rules: BTreeMap<String, LspRule>,
}

impl LspConditions {
    pub fn new(rules: BTreeMap<String, LspRule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LspRule)> {
        self.rules.iter()
    }
}

impl FromIterator<(String, LspRule)> for LspConditions {
    fn from_iter<I: IntoIterator<Item = (String, LspRule)>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::NaiveTime;

    pub fn day(d: u32, m: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    pub fn at(d: u32, m: u32, y: i32, h: u32, min: u32) -> FieldTime {
        FieldTime::Valid(day(d, m, y).and_time(
            NaiveTime::from_hms_opt(h, min, 0).expect("valid test time"),
        ))
    }

    /// A fully valid record; tests override the fields they care about.
    pub fn record(order_code: &str, country: &str, status: &str) -> OrderRecord {
        OrderRecord {
            order_code: order_code.to_string(),
            country: country.to_string(),
            base_store: Some("web-store".to_string()),
            order_type_code: "STD".to_string(),
            pmi_order_status: status.to_string(),
            run_time: at(15, 1, 2024, 6, 0),
            date: at(10, 1, 2024, 12, 0),
            update_date: day(12, 1, 2024),
            modified_time: at(12, 1, 2024, 9, 30),
            days_since_run_time: None,
            snapshot_date: Some(day(15, 1, 2024)),
            line_number: 2,
        }
    }
}
