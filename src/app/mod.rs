// OrderPulse - app/mod.rs
//
// Application layer: turns validated config into a pipeline run and writes
// the reports.
// Dependencies: core, platform.

pub mod pipeline;
