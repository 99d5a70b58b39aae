//! Shared types, coercion rules and configuration for the ledger report
//! workspace.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod notifications;
pub mod recipients;
pub mod settings;
pub mod time_utils;

pub use error::{ReportError, Result};
