//! Sequential report assembly.
//!
//! For each branch group, in partition order: aggregate, write the
//! workbook, render the monthly summary and build the [`BranchReport`].

use std::path::Path;

use report_core::error::{RenderError, Result};
use report_core::formatting::format_decimal_br;
use report_core::models::{
    BranchGroup, BranchOutcome, BranchReport, Column, Period, PeriodScope, ReportOptions,
};
use report_data::aggregator::BranchAggregator;
use report_data::analysis::analyze_ledger;
use report_render::{render_monthly_summary, write_branch_workbook};
use tracing::{error, info};

/// Run the whole pipeline over `source`, writing artifacts under
/// `output_root`.
///
/// The first branch that fails to render aborts the batch; artifacts already
/// written for earlier branches stay on disk.
pub fn generate(
    source: &Path,
    output_root: &Path,
    options: &ReportOptions,
) -> Result<Vec<BranchReport>> {
    let analysis = analyze_ledger(source, options)?;

    let mut reports = Vec::with_capacity(analysis.groups.len());
    for group in &analysis.groups {
        let report = build_branch_report(
            group,
            &analysis.table.columns,
            output_root,
            &analysis.period,
            options.period_scope,
        )?;
        reports.push(report);
    }

    info!("Generated {} branch reports", reports.len());
    Ok(reports)
}

/// Like [`generate`], but a branch that fails to render does not stop the
/// others. Ingestion failures are still fatal.
pub fn generate_isolated(
    source: &Path,
    output_root: &Path,
    options: &ReportOptions,
) -> Result<Vec<BranchOutcome>> {
    let analysis = analyze_ledger(source, options)?;

    let outcomes: Vec<BranchOutcome> = analysis
        .groups
        .iter()
        .map(|group| BranchOutcome {
            branch: group.branch_code.clone(),
            result: build_branch_report(
                group,
                &analysis.table.columns,
                output_root,
                &analysis.period,
                options.period_scope,
            ),
        })
        .collect();

    log_outcomes(&outcomes);
    Ok(outcomes)
}

/// Build the report of one branch, writing its artifact.
pub fn build_branch_report(
    group: &BranchGroup,
    columns: &[Column],
    output_root: &Path,
    global_period: &Period,
    scope: PeriodScope,
) -> std::result::Result<BranchReport, RenderError> {
    let period = report_period(group, global_period, scope);
    let summary = BranchAggregator::aggregate(group);
    let artifact_path = write_branch_workbook(group, columns, output_root, &period)?;

    Ok(BranchReport {
        branch: group.branch_code.clone(),
        period_start: period.start,
        period_end: period.end,
        artifact_path,
        quantity: summary.quantity,
        total_value_formatted: format_decimal_br(summary.total_value),
        summary_markup: render_monthly_summary(&summary.monthly_counts),
    })
}

/// Period a branch report is labelled with.
///
/// [`PeriodScope::PerBranch`] falls back to the global period when the branch
/// has no valid issue date.
pub fn report_period(group: &BranchGroup, global: &Period, scope: PeriodScope) -> Period {
    match scope {
        PeriodScope::Global => *global,
        PeriodScope::PerBranch => group.own_period().unwrap_or(*global),
    }
}

pub(crate) fn log_outcomes(outcomes: &[BranchOutcome]) {
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    for outcome in outcomes {
        if let Err(e) = &outcome.result {
            error!("Branch {} failed: {}", outcome.branch, e);
        }
    }
    info!(
        "Generated {} of {} branch reports",
        outcomes.len() - failed,
        outcomes.len()
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
