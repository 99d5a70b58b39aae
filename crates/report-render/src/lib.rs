//! Artifact rendering for the ledger reports.
//!
//! Writes one spreadsheet per branch and renders the monthly summary table
//! embedded in notification bodies.

pub mod layout;
pub mod summary;
pub mod workbook;

pub use summary::render_monthly_summary;
pub use workbook::{artifact_path, write_branch_workbook};
