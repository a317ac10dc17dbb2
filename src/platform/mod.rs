// OrderPulse - platform/mod.rs
//
// Platform abstraction layer: config directories, config.toml, output files.
// Dependencies: standard library, directories crate.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
