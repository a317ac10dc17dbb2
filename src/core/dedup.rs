// OrderPulse - core/dedup.rs
//
// Snapshot deduplication: one row per ORDER CODE, the most recently updated.
//
// Stable sort ascending by update_date, then keep the last row seen for each
// order code. Ties on update_date are resolved by original row order (the
// later row wins) because the sort is stable. No hashing order leaks into
// the output, so the result is identical on every platform.

use crate::core::model::OrderRecord;
use std::collections::HashMap;

/// Collapse `records` to one row per order code.
///
/// Output is ordered by ascending update_date, ties in original order.
/// Applying this twice gives the same result as applying it once.
pub fn dedup_latest(mut records: Vec<OrderRecord>) -> Vec<OrderRecord> {
    records.sort_by_key(|r| r.update_date);

    let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        last_index.insert(record.order_code.as_str(), idx);
    }
    let keep: Vec<bool> = records
        .iter()
        .enumerate()
        .map(|(idx, r)| last_index.get(r.order_code.as_str()) == Some(&idx))
        .collect();

    let before = records.len();
    let mut flags = keep.into_iter();
    records.retain(|_| flags.next().unwrap_or(false));

    tracing::trace!(before, after = records.len(), "Deduplicated snapshot");
    records
}
