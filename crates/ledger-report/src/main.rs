mod bootstrap;

use std::process::ExitCode;

use anyhow::{Context, Result};
use report_core::models::{BranchOutcome, BranchReport, ReportOptions};
use report_core::notifications::{
    Dispatcher, LogDispatcher, NotificationContext, OutboxDispatcher,
};
use report_core::recipients::JsonRecipientDirectory;
use report_core::settings::{DispatchMode, Settings};
use report_core::time_utils::resolve_timezone;
use report_runtime::dispatch::dispatch_reports;
use report_runtime::orchestrator::ReportOrchestrator;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Ledger Report v{} starting", env!("CARGO_PKG_VERSION"));

    let Some(source) = settings.source.clone() else {
        if settings.clear {
            tracing::info!("Saved configuration cleared");
            return Ok(ExitCode::SUCCESS);
        }
        anyhow::bail!("no ledger given; pass --source <CSV>");
    };

    tracing::info!(
        "Source: {}, output: {}, period scope: {:?}, jobs: {}",
        source.display(),
        settings.output_root.display(),
        settings.period_scope,
        settings.jobs
    );

    let options = ReportOptions {
        period_scope: settings.period_scope,
        ..Default::default()
    };
    let outcomes = ReportOrchestrator::new(settings.job_count(), options)
        .run(source.clone(), settings.output_root.clone())
        .await
        .with_context(|| format!("failed to process {}", source.display()))?;

    for outcome in &outcomes {
        println!("{}", outcome_line(outcome));
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    println!(
        "{} branches, {} ok, {} failed",
        outcomes.len(),
        outcomes.len() - failed,
        failed
    );

    if !dispatch_allowed(failed, settings.fail_fast) {
        tracing::error!("{} branches failed; nothing dispatched (--fail-fast)", failed);
        return Ok(ExitCode::FAILURE);
    }

    let mut dispatch_failed = false;
    if let Some(dispatcher) = build_dispatcher(&settings) {
        let reports: Vec<BranchReport> = outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .collect();

        let recipients_path = settings
            .recipients
            .clone()
            .unwrap_or_else(JsonRecipientDirectory::default_path);
        let recipients = JsonRecipientDirectory::load_from(&recipients_path);
        let ctx = NotificationContext {
            company: settings.company.clone(),
            test_recipient: settings.test_recipient.clone(),
            timezone: resolve_timezone(&settings.timezone),
        };

        let summary = dispatch_reports(&reports, &recipients, &ctx, dispatcher.as_ref());
        println!(
            "{} notifications dispatched, {} skipped, {} failed",
            summary.dispatched.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        dispatch_failed = summary.has_failures();
    }

    if failed > 0 || dispatch_failed {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// With `--fail-fast`, a single failed branch holds back every notification.
fn dispatch_allowed(failed_branches: usize, fail_fast: bool) -> bool {
    failed_branches == 0 || !fail_fast
}

fn build_dispatcher(settings: &Settings) -> Option<Box<dyn Dispatcher>> {
    match settings.dispatch {
        DispatchMode::None => None,
        DispatchMode::Log => Some(Box::new(LogDispatcher)),
        DispatchMode::Outbox => Some(Box::new(OutboxDispatcher::new(settings.outbox_dir()))),
    }
}

/// One line of the run summary.
fn outcome_line(outcome: &BranchOutcome) -> String {
    match &outcome.result {
        Ok(report) => format!(
            "LOJA {:<4} {:>5} docs  R$ {:>14}  {}",
            report.branch,
            report.quantity,
            report.total_value_formatted,
            report.artifact_path.display()
        ),
        Err(e) => format!("LOJA {:<4} FAILED  {}", outcome.branch, e),
    }
}
