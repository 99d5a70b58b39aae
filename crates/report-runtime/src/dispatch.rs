//! Hand-off of finished reports to a [`Dispatcher`].

use report_core::error::DispatchError;
use report_core::models::{BranchCode, BranchReport};
use report_core::notifications::{compose_notification, Dispatcher, NotificationContext};
use report_core::recipients::RecipientDirectory;
use tracing::{error, info, warn};

/// What happened to each report during dispatch.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub dispatched: Vec<BranchCode>,
    /// Branches with no recipients configured.
    pub skipped: Vec<BranchCode>,
    pub failed: Vec<(BranchCode, DispatchError)>,
}

impl DispatchSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Compose and dispatch one notification per report.
///
/// A branch without recipients is skipped; a dispatcher failure is recorded
/// and the remaining reports are still handed off.
pub fn dispatch_reports(
    reports: &[BranchReport],
    recipients: &dyn RecipientDirectory,
    ctx: &NotificationContext,
    dispatcher: &dyn Dispatcher,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    for report in reports {
        let notification = compose_notification(report, recipients, ctx);
        if notification.has_no_recipients() {
            warn!("No recipients for branch {}; notification skipped", report.branch);
            summary.skipped.push(report.branch.clone());
            continue;
        }

        match dispatcher.dispatch(&notification) {
            Ok(()) => summary.dispatched.push(report.branch.clone()),
            Err(e) => {
                error!("Dispatch for branch {} failed: {}", report.branch, e);
                summary.failed.push((report.branch.clone(), e));
            }
        }
    }

    info!(
        "Dispatched {} notifications ({} skipped, {} failed)",
        summary.dispatched.len(),
        summary.skipped.len(),
        summary.failed.len()
    );
    summary
}

// ── Tests ─────────────────────────────────────────────────────────────────────
