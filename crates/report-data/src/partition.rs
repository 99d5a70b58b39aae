//! Splitting the ledger into per-branch groups.

use std::collections::BTreeMap;

use report_core::models::{BranchCode, BranchGroup, LedgerTable};
use tracing::{debug, warn};

/// Group the rows of `table` by branch code.
///
/// Groups come out ascending by the padded code (lexicographic), rows keep
/// their input order, and rows without a branch code belong to no group.
pub fn partition_by_branch(table: &LedgerTable) -> Vec<BranchGroup> {
    let mut groups: BTreeMap<&BranchCode, Vec<_>> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in &table.rows {
        match &row.branch_code {
            Some(code) => groups.entry(code).or_default().push(row.clone()),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("{} rows without a branch code left out of every report", skipped);
    }
    debug!("Partitioned {} rows into {} branches", table.len() - skipped, groups.len());

    groups
        .into_iter()
        .map(|(code, rows)| BranchGroup {
            branch_code: code.clone(),
            rows,
        })
        .collect()
}
