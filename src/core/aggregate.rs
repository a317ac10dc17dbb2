// OrderPulse - core/aggregate.rs
//
// Summaries consumed by the reporting views. Every count is a count of
// distinct order codes, so an order tracked twice in the same group is
// counted once. Output rows are sorted so reports are byte-stable.
//
// An empty summary is not an error; callers log it and skip the output.

use crate::core::model::OrderRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Country include/exclude lists for one summary call.
///
/// An empty include list means every country. Exclude wins over include.
#[derive(Debug, Clone, Default)]
pub struct CountrySelection {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl CountrySelection {
    pub fn allows(&self, country: &str) -> bool {
        (self.include.is_empty() || self.include.iter().any(|c| c == country))
            && !self.exclude.iter().any(|c| c == country)
    }
}

/// Orders per country and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub country: String,
    pub status: String,
    pub orders: usize,
}

/// Orders per report date, country and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedStatusCount {
    pub date: NaiveDate,
    pub country: String,
    pub status: String,
    pub orders: usize,
}

/// How many orders the LSP rules removed per country and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LspEffect {
    pub country: String,
    pub status: String,
    pub without_lsp: usize,
    pub with_lsp: usize,
    pub suppressed: usize,
}

/// Age of orders since their last update, per country and status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAgeSummary {
    pub country: String,
    pub status: String,
    pub orders: usize,
    pub max_age_days: i64,
    pub mean_age_days: f64,
}

type StatusKey = (String, String);

fn distinct_by_status<'a>(
    records: impl Iterator<Item = &'a OrderRecord>,
    selection: &CountrySelection,
) -> BTreeMap<StatusKey, HashSet<&'a str>> {
    let mut groups: BTreeMap<StatusKey, HashSet<&str>> = BTreeMap::new();
    for r in records.filter(|r| selection.allows(&r.country)) {
        groups
            .entry((r.country.clone(), r.pmi_order_status.clone()))
            .or_default()
            .insert(r.order_code.as_str());
    }
    groups
}

/// Distinct orders per (country, status).
pub fn count_by_status(records: &[OrderRecord], selection: &CountrySelection) -> Vec<StatusCount> {
    let rows: Vec<_> = distinct_by_status(records.iter(), selection)
        .into_iter()
        .map(|((country, status), codes)| StatusCount {
            country,
            status,
            orders: codes.len(),
        })
        .collect();
    if rows.is_empty() {
        tracing::info!(?selection, "No orders for status summary");
    }
    rows
}

/// Distinct orders per (report date, country, status), sorted by date.
///
/// Records without any report date are left out and counted in the log.
pub fn count_by_date(
    records: &[OrderRecord],
    selection: &CountrySelection,
) -> Vec<DatedStatusCount> {
    let mut groups: BTreeMap<(NaiveDate, String, String), HashSet<&str>> = BTreeMap::new();
    let mut undated = 0usize;
    for r in records.iter().filter(|r| selection.allows(&r.country)) {
        let Some(date) = r.report_date() else {
            undated += 1;
            continue;
        };
        groups
            .entry((date, r.country.clone(), r.pmi_order_status.clone()))
            .or_default()
            .insert(r.order_code.as_str());
    }
    if undated > 0 {
        tracing::warn!(undated, "Records without a report date left out of the trend");
    }
    if groups.is_empty() {
        tracing::info!(?selection, "No orders for dated summary");
    }
    groups
        .into_iter()
        .map(|((date, country, status), codes)| DatedStatusCount {
            date,
            country,
            status,
            orders: codes.len(),
        })
        .collect()
}

/// Compare the unruled and ruled views of the same cleaned data.
pub fn lsp_effect(
    without_lsp: &[OrderRecord],
    with_lsp: &[OrderRecord],
    selection: &CountrySelection,
) -> Vec<LspEffect> {
    let before = distinct_by_status(without_lsp.iter(), selection);
    let after = distinct_by_status(with_lsp.iter(), selection);
    before
        .into_iter()
        .map(|(key, codes)| {
            let kept = after.get(&key).map_or(0, HashSet::len);
            let (country, status) = key;
            LspEffect {
                country,
                status,
                without_lsp: codes.len(),
                with_lsp: kept,
                suppressed: codes.len().saturating_sub(kept),
            }
        })
        .collect()
}

/// Order age (`today - update_date`) per (country, status).
pub fn order_age_summary(
    records: &[OrderRecord],
    today: NaiveDate,
    selection: &CountrySelection,
) -> Vec<OrderAgeSummary> {
    let mut groups: BTreeMap<StatusKey, Vec<i64>> = BTreeMap::new();
    for r in records.iter().filter(|r| selection.allows(&r.country)) {
        groups
            .entry((r.country.clone(), r.pmi_order_status.clone()))
            .or_default()
            .push(r.order_age(today));
    }
    groups
        .into_iter()
        .map(|((country, status), ages)| {
            let orders = ages.len();
            let max_age_days = ages.iter().copied().max().unwrap_or(0);
            let mean_age_days = ages.iter().sum::<i64>() as f64 / orders as f64;
            OrderAgeSummary {
                country,
                status,
                orders,
                max_age_days,
                mean_age_days,
            }
        })
        .collect()
}
