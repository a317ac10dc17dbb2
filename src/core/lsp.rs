// OrderPulse - core/lsp.rs
//
// LSP conditions: per-country suppression of orders presumed already
// resolved and reported.
//
// For each (country -> {status, days}) rule, a record is removed when its
// country matches, its status equals the rule status, and
// `days_since_run_time <= days`. Rules are applied one after another in
// country order; each can only remove more records. Records are never
// edited here, and records with no `days_since_run_time` never match.

use crate::core::model::{LspConditions, LspRule, OrderRecord};
use crate::core::report::RunReport;

/// True if `rule` for `country` suppresses `record`.
pub fn matches_rule(record: &OrderRecord, country: &str, rule: &LspRule) -> bool {
    record.country == country
        && record.pmi_order_status == rule.status
        && record
            .days_since_run_time
            .is_some_and(|days| days <= rule.days)
}

/// Apply every LSP rule to `records`, returning the survivors.
///
/// Callers that need the unruled view keep their own copy; this function
/// consumes its input. Stages are recorded as `<label>.lsp.<COUNTRY>`.
pub fn apply_lsp_conditions(
    records: Vec<OrderRecord>,
    conditions: &LspConditions,
    label: &str,
    report: &mut RunReport,
) -> Vec<OrderRecord> {
    let mut remaining = records;
    for (country, rule) in conditions.iter() {
        let rows_in = remaining.len();
        remaining.retain(|r| !matches_rule(r, country, rule));
        tracing::debug!(
            dataset = label,
            country = country.as_str(),
            status = rule.status.as_str(),
            days = rule.days,
            removed = rows_in - remaining.len(),
            "LSP condition applied"
        );
        report.stage(&format!("{label}.lsp.{country}"), rows_in, remaining.len());
    }
    remaining
}
