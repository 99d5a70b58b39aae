//! Runtime layer for the ledger reports.
//!
//! Assembles per-branch reports from the data and render layers, runs the
//! branch stage concurrently and hands finished reports to a dispatcher.

pub mod assembler;
pub mod dispatch;
pub mod orchestrator;

pub use report_core as core;
pub use report_data as data;
pub use report_render as render;
