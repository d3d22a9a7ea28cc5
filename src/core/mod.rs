// StoreLens - core/mod.rs
//
// Core business logic layer: log reading, INI parsing, recency and feature
// derivation, report encoding.
// Dependencies: serde, csv, chrono, tracing.
// Must NOT depend on: platform, app, or the filesystem directly.

pub mod export;
pub mod features;
pub mod ini;
pub mod model;
pub mod reader;
pub mod recency;
pub mod storage;
