//! Concurrent report generation.
//!
//! The ledger is analysed once, then every branch is rendered on the blocking
//! pool with at most `jobs` branches in flight. Outcomes are keyed by branch
//! code, so the returned order never depends on completion order.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use report_core::error::{RenderError, ReportError, Result};
use report_core::models::{BranchCode, BranchOutcome, Column, Period, ReportOptions};
use report_data::analysis::{analyze_ledger, LedgerAnalysis};
use report_render::artifact_path;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::assembler::{build_branch_report, log_outcomes, report_period};

/// Default number of branches rendered at once.
pub const DEFAULT_JOBS: usize = 4;

// ── ReportOrchestrator ────────────────────────────────────────────────────────

/// Runs the pipeline with the per-branch stage fanned out over tokio's
/// blocking pool.
pub struct ReportOrchestrator {
    jobs: usize,
    options: ReportOptions,
}

impl ReportOrchestrator {
    /// Create an orchestrator running at most `jobs` branches at once
    /// (`0` is treated as `1`).
    pub fn new(jobs: usize, options: ReportOptions) -> Self {
        Self {
            jobs: jobs.max(1),
            options,
        }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Analyse `source` and render every branch under `output_root`.
    ///
    /// Ingestion failures are returned as `Err`; render failures are isolated
    /// in the branch's [`BranchOutcome`].
    pub async fn run(&self, source: PathBuf, output_root: PathBuf) -> Result<Vec<BranchOutcome>> {
        let options = self.options.clone();
        let analysis = tokio::task::spawn_blocking(move || analyze_ledger(&source, &options))
            .await
            .map_err(|e| ReportError::Other(anyhow::anyhow!("ledger analysis task failed: {e}")))??;

        let outcomes = self.render_branches(analysis, output_root).await;
        log_outcomes(&outcomes);
        Ok(outcomes)
    }

    async fn render_branches(
        &self,
        analysis: LedgerAnalysis,
        output_root: PathBuf,
    ) -> Vec<BranchOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let columns: Arc<Vec<Column>> = Arc::new(analysis.table.columns);
        let output_root = Arc::new(output_root);
        let global = analysis.period;
        let scope = self.options.period_scope;

        let mut handles: Vec<(BranchCode, Period, JoinHandle<_>)> = Vec::new();

        for group in analysis.groups {
            let branch = group.branch_code.clone();
            let period = report_period(&group, &global, scope);
            let semaphore = Arc::clone(&semaphore);
            let columns = Arc::clone(&columns);
            let output_root = Arc::clone(&output_root);

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return Err(format!("semaphore closed: {e}")),
                };
                tokio::task::spawn_blocking(move || {
                    build_branch_report(&group, &columns, &output_root, &global, scope)
                })
                .await
                .map_err(|e| e.to_string())
            });
            handles.push((branch, period, handle));
        }

        let mut results: BTreeMap<BranchCode, std::result::Result<_, RenderError>> =
            BTreeMap::new();

        for (branch, period, handle) in handles {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(message)) => Err(task_failure(&output_root, &branch, &period, message)),
                Err(e) => Err(task_failure(&output_root, &branch, &period, e.to_string())),
            };
            debug!("Branch {} finished (ok = {})", branch, result.is_ok());
            results.insert(branch, result);
        }

        results
            .into_iter()
            .map(|(branch, result)| BranchOutcome { branch, result })
            .collect()
    }
}

impl Default for ReportOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_JOBS, ReportOptions::default())
    }
}

/// A branch task that panicked or was cancelled is reported against the
/// artifact it was writing.
fn task_failure(
    output_root: &std::path::Path,
    branch: &BranchCode,
    period: &Period,
    message: String,
) -> RenderError {
    RenderError::Workbook {
        path: artifact_path(output_root, branch, period),
        message,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
