// StoreLens - app/mod.rs
//
// Application layer: batch orchestration, per-store summarisation, report
// writing and combining.
// Dependencies: core layer, platform config.

pub mod batch;
pub mod combine;
pub mod report;
pub mod summarize;
