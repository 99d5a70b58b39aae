//! Reporting period and per-branch statistics.

use std::collections::BTreeMap;

use report_core::error::{ReportError, Result};
use report_core::models::{BranchGroup, BranchSummary, LedgerTable, MonthlyCount, Period};
use rust_decimal::Decimal;

// ── PeriodCalculator ──────────────────────────────────────────────────────────

/// Date-range computations over the normalized ledger.
pub struct PeriodCalculator;

impl PeriodCalculator {
    /// Earliest and latest issue date of the whole table.
    ///
    /// Fails with [`ReportError::NoValidDates`] when no row has a date.
    pub fn global_period(table: &LedgerTable) -> Result<Period> {
        Period::spanning(table.issue_dates()).ok_or(ReportError::NoValidDates)
    }
}

// ── BranchAggregator ──────────────────────────────────────────────────────────

/// Stateless helper computing [`BranchSummary`] values.
pub struct BranchAggregator;

impl BranchAggregator {
    /// Sum of values, row count and documents per calendar month.
    ///
    /// Missing values add nothing to the total; rows without a date are
    /// counted in `quantity` but in no month.
    pub fn aggregate(group: &BranchGroup) -> BranchSummary {
        let mut total_value = Decimal::ZERO;
        let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();

        for row in &group.rows {
            if let Some(value) = row.document_value {
                total_value += value;
            }
            if let Some(date) = row.issue_date {
                *months.entry(MonthlyCount::key_of(date)).or_default() += 1;
            }
        }

        BranchSummary {
            total_value,
            quantity: group.rows.len(),
            monthly_counts: months
                .into_iter()
                .map(|((year, month), count)| MonthlyCount { year, month, count })
                .collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
