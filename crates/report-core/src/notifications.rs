//! Notification composition and hand-off.
//!
//! A [`BranchReport`] is turned into a [`Notification`] (recipients, subject,
//! attachment and HTML body) and passed to a [`Dispatcher`]. Actual delivery
//! is performed by an external sender; the dispatchers here either log the
//! message or drop it into an outbox directory for that sender to pick up.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DispatchError;
use crate::formatting::{escape_html, format_month_year};
use crate::models::{BranchCode, BranchReport, Period};
use crate::recipients::RecipientDirectory;
use crate::time_utils::{current_greeting, describe_period};

// ── Notification ──────────────────────────────────────────────────────────────

/// A fully composed message for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub branch: BranchCode,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub attachment_path: PathBuf,
    pub body_html: String,
}

impl Notification {
    /// `true` when the message has nobody to go to.
    pub fn has_no_recipients(&self) -> bool {
        self.to.is_empty() && self.cc.is_empty()
    }
}

/// Settings shared by every notification of a run.
#[derive(Debug, Clone)]
pub struct NotificationContext {
    /// Company named in the body as the party asking for justifications.
    pub company: String,
    /// When set, every message goes only to this address.
    pub test_recipient: Option<String>,
    /// Zone used to pick the greeting.
    pub timezone: Tz,
}

impl Default for NotificationContext {
    fn default() -> Self {
        Self {
            company: String::new(),
            test_recipient: None,
            timezone: Tz::UTC,
        }
    }
}

// ── Composition ───────────────────────────────────────────────────────────────

/// Compose the notification for `report`, greeting by the current local time.
pub fn compose_notification(
    report: &BranchReport,
    recipients: &dyn RecipientDirectory,
    ctx: &NotificationContext,
) -> Notification {
    compose_with_greeting(report, recipients, ctx, current_greeting(ctx.timezone))
}

/// Compose the notification for `report` with an explicit greeting line.
pub fn compose_with_greeting(
    report: &BranchReport,
    recipients: &dyn RecipientDirectory,
    ctx: &NotificationContext,
    greeting: &str,
) -> Notification {
    let (to, cc) = match &ctx.test_recipient {
        Some(address) => (vec![address.clone()], Vec::new()),
        None => (
            recipients.admins_for(&report.branch),
            recipients.coordinators_for(&report.branch),
        ),
    };

    Notification {
        branch: report.branch.clone(),
        to,
        cc,
        subject: subject_for(report),
        attachment_path: report.artifact_path.clone(),
        body_html: render_body(report, ctx, greeting),
    }
}

/// Subject line: `PENDÊNCIA DE LANÇAMENTO - LOJA {branch} - {MM/YYYY}`.
pub fn subject_for(report: &BranchReport) -> String {
    format!(
        "PENDÊNCIA DE LANÇAMENTO - LOJA {} - {}",
        report.branch,
        format_month_year(report.period_end)
    )
}

fn render_body(report: &BranchReport, ctx: &NotificationContext, greeting: &str) -> String {
    let period = Period {
        start: report.period_start,
        end: report.period_end,
    };
    let company = escape_html(&ctx.company);

    format!(
        r#"<html>
    <body>
        <div style="font-family: Aptos; font-size: 12pt;">
        <p>{greeting}</p>
        <p>
        Segue em anexo a planilha com as notas fiscais e CTEs que ainda estão pendentes
        de lançamento no sistema, {period}, e que não possuem
        justificativa registrada.
        </p>

        <p>Pedimos, por favor, que:</p>

        <ul>
        <li>Lancem no sistema as notas que ainda não foram lançadas;</li>
        <li>Verifiquem cada pendência com atenção;</li>
        <li>Confiram se a mercadoria realmente não chegou, se não será mais entregue ou se é necessário fazer a recusa no portal GED;</li>
        <li>Registrem a justificativa no sistema, no campo <strong>“OBSERVAÇÕES”</strong>, pela filial.</li>
        </ul>

        <p>
        É muito importante que a informação esteja registrada no sistema,
        pois precisamos informar ao time da {company} o motivo pelo qual essas notas ainda não deram entrada.
        </p>
        <p style="font-family: Aptos; font-size: 14pt;">Quantidade de documentos: {quantity}</p>
        <p style="font-family: Aptos; font-size: 14pt;">Valor total: R${total}</p><br/>
        {summary}
        </div>
    </body>
</html>
"#,
        greeting = escape_html(greeting),
        period = describe_period(&period),
        company = company,
        quantity = report.quantity,
        total = report.total_value_formatted,
        summary = report.summary_markup,
    )
}

// ── Dispatchers ───────────────────────────────────────────────────────────────

/// Hand-off point to whatever delivers notifications.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Dry-run dispatcher: records each message in the log and sends nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl Dispatcher for LogDispatcher {
    fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
        info!(
            branch = %notification.branch,
            to = %notification.to.join(";"),
            cc = %notification.cc.join(";"),
            attachment = %notification.attachment_path.display(),
            "{}",
            notification.subject
        );
        Ok(())
    }
}

/// Envelope written next to the body in the outbox.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutboxEnvelope {
    pub branch: BranchCode,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub attachment_path: PathBuf,
    /// File name of the HTML body, relative to the outbox directory.
    pub body_file: String,
}

/// Writes `{branch}.json` and `{branch}.html` into an outbox directory.
#[derive(Debug, Clone)]
pub struct OutboxDispatcher {
    dir: PathBuf,
}

impl OutboxDispatcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), DispatchError> {
        std::fs::write(path, contents).map_err(|source| DispatchError::Outbox {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Dispatcher for OutboxDispatcher {
    fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| DispatchError::Outbox {
            path: self.dir.clone(),
            source,
        })?;

        let body_file = format!("{}.html", notification.branch);
        let envelope = OutboxEnvelope {
            branch: notification.branch.clone(),
            to: notification.to.clone(),
            cc: notification.cc.clone(),
            subject: notification.subject.clone(),
            attachment_path: notification.attachment_path.clone(),
            body_file: body_file.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        self.write(&self.dir.join(&body_file), notification.body_html.as_bytes())?;
        self.write(
            &self.dir.join(format!("{}.json", notification.branch)),
            json.as_bytes(),
        )?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
