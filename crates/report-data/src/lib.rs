//! Data ingestion layer for the ledger reports.
//!
//! Reads the semicolon-delimited ledger export, coerces its fields, computes
//! the reporting period and splits the table into per-branch groups with
//! their aggregates.

pub mod aggregator;
pub mod analysis;
pub mod normalizer;
pub mod partition;
pub mod reader;

pub use report_core as core;
