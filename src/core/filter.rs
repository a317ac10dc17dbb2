// OrderPulse - core/filter.rs
//
// Store exclusion filter. Both rules are AND-combined: a record survives
// only if it matches neither.
//   - order type: exact match against a disallowed set
//   - base store: case-insensitive substring match against disallowed
//     fragments; a record with no base store never matches
//
// The current and the history paths both go through `clean_dataset`, which
// applies the exclusions and then derives `days_since_run_time`. The LSP
// rules depend on that derived value, so it must be filled in here.

use crate::core::model::OrderRecord;
use crate::core::report::RunReport;
use std::collections::HashSet;

/// Disallowed order types and store fragments.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    order_type_codes: HashSet<String>,
    /// Stored lowercased.
    base_store_fragments: Vec<String>,
}

impl ExclusionRules {
    pub fn new<T, S>(order_type_codes: T, base_store_fragments: S) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        Self {
            order_type_codes: order_type_codes.into_iter().map(Into::into).collect(),
            base_store_fragments: base_store_fragments
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Returns true if no exclusions are configured.
    pub fn is_empty(&self) -> bool {
        self.order_type_codes.is_empty() && self.base_store_fragments.is_empty()
    }

    /// True if `record` hits either rule.
    pub fn excludes(&self, record: &OrderRecord) -> bool {
        self.excludes_order_type(&record.order_type_code)
            || record
                .base_store
                .as_deref()
                .is_some_and(|store| self.excludes_base_store(store))
    }

    fn excludes_order_type(&self, code: &str) -> bool {
        self.order_type_codes.contains(code)
    }

    fn excludes_base_store(&self, store: &str) -> bool {
        let store = store.to_lowercase();
        self.base_store_fragments
            .iter()
            .any(|fragment| store.contains(fragment.as_str()))
    }
}

/// Drop every record hit by an exclusion rule.
pub fn apply_exclusions(records: Vec<OrderRecord>, rules: &ExclusionRules) -> Vec<OrderRecord> {
    if rules.is_empty() {
        return records;
    }
    records.into_iter().filter(|r| !rules.excludes(r)).collect()
}

/// Fill in `days_since_run_time` on every record.
pub fn derive_days_since_run_time(records: &mut [OrderRecord]) {
    for record in records.iter_mut() {
        record.days_since_run_time = record.compute_days_since_run_time();
    }
}

/// Exclusions followed by the day-count derivation, recording the stage in
/// the run report under `<label>.exclusions`.
pub fn clean_dataset(
    records: Vec<OrderRecord>,
    rules: &ExclusionRules,
    label: &str,
    report: &mut RunReport,
) -> Vec<OrderRecord> {
    let rows_in = records.len();
    let mut cleaned = apply_exclusions(records, rules);
    derive_days_since_run_time(&mut cleaned);

    let undated = cleaned.iter().filter(|r| r.days_since_run_time.is_none()).count();
    if undated > 0 {
        report.warn(format!(
            "{label}: {undated} records have no usable RUN TIME/DATE and cannot match an LSP rule"
        ));
    }
    report.stage(&format!("{label}.exclusions"), rows_in, cleaned.len());
    cleaned
}
