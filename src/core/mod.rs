// OrderPulse - core/mod.rs
//
// Core pipeline logic: parsing, deduplication, history merge, exclusion,
// LSP conditions, aggregation, export.
// Must NOT depend on: app or platform.

pub mod aggregate;
pub mod dedup;
pub mod discovery;
pub mod export;
pub mod filter;
pub mod history;
pub mod lsp;
pub mod model;
pub mod parser;
pub mod report;
