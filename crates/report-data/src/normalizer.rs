//! Field coercion from raw text to typed ledger rows.

use report_core::data_processors::{BranchCodeProcessor, CurrencyProcessor, IssueDateProcessor};
use report_core::error::NormalizationError;
use report_core::models::{Column, ColumnNames, ColumnRole, LedgerRow, LedgerTable, RawTable};
use tracing::{debug, warn};

/// Coerce every row of `raw` into a [`LedgerRow`].
///
/// * the remarks column is dropped;
/// * the document value becomes a 2-digit `Decimal` (empty → `None`);
/// * the issue date is parsed day-first (unparsable → `None`, row kept);
/// * the branch code is canonicalized (empty → `None`, row kept).
///
/// Each transform only applies when its column exists. A non-empty value or
/// branch cell that cannot be parsed aborts normalization, reporting the
/// 1-based data line.
pub fn normalize_table(
    raw: &RawTable,
    names: &ColumnNames,
) -> Result<LedgerTable, NormalizationError> {
    let retained: Vec<(usize, Column)> = raw
        .headers
        .iter()
        .enumerate()
        .filter(|(_, name)| **name != names.remarks)
        .map(|(idx, name)| (idx, Column::new(name.clone(), role_of(name, names))))
        .collect();

    let mut rows = Vec::with_capacity(raw.rows.len());
    let mut undated = 0usize;
    let mut unassigned = 0usize;

    for (offset, cells) in raw.rows.iter().enumerate() {
        let line = offset + 1;
        let mut row = LedgerRow::default();

        for (idx, column) in &retained {
            let cell = cells.get(*idx).map(String::as_str).unwrap_or("");
            match column.role {
                ColumnRole::Branch => {
                    row.branch_code = BranchCodeProcessor::parse(cell).map_err(|_| {
                        NormalizationError::InvalidBranchCode {
                            column: column.name.clone(),
                            line,
                            value: cell.to_string(),
                        }
                    })?;
                    if row.branch_code.is_none() {
                        unassigned += 1;
                    }
                }
                ColumnRole::DocumentValue => {
                    row.document_value = CurrencyProcessor::parse(cell).map_err(|_| {
                        NormalizationError::InvalidCurrency {
                            column: column.name.clone(),
                            line,
                            value: cell.to_string(),
                        }
                    })?;
                }
                ColumnRole::IssueDate => {
                    row.issue_date = IssueDateProcessor::parse(cell);
                    if row.issue_date.is_none() {
                        undated += 1;
                    }
                }
                ColumnRole::Passthrough => {
                    row.passthrough.insert(column.name.clone(), cell.to_string());
                }
            }
        }

        rows.push(row);
    }

    if unassigned > 0 {
        warn!("{} ledger rows have no branch code", unassigned);
    }
    if undated > 0 {
        debug!("{} ledger rows have no valid issue date", undated);
    }

    Ok(LedgerTable {
        columns: retained.into_iter().map(|(_, c)| c).collect(),
        rows,
    })
}

fn role_of(name: &str, names: &ColumnNames) -> ColumnRole {
    if name == names.branch {
        ColumnRole::Branch
    } else if name == names.document_value {
        ColumnRole::DocumentValue
    } else if name == names.issue_date {
        ColumnRole::IssueDate
    } else {
        ColumnRole::Passthrough
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
