// StoreLens - platform/mod.rs
//
// Platform abstraction layer: filesystem object store, config.toml loading.
// Dependencies: core (object store trait, text encoding), walkdir, toml,
// directories.
// Must NOT depend on: app.

pub mod config;
pub mod storage;
