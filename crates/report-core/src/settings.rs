use clap::{CommandFactory, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::PeriodScope;

// ── Dispatch mode ──────────────────────────────────────────────────────────────

/// What happens to composed notifications after the artifacts are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DispatchMode {
    /// Do not compose notifications.
    #[default]
    None,
    /// Log each notification without sending it.
    Log,
    /// Write each notification into the outbox directory.
    Outbox,
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Per-branch pending-document reports from a ledger export
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ledger-report",
    about = "Per-branch pending-document reports from a ledger export",
    version
)]
pub struct Settings {
    /// Ledger export to read (semicolon-delimited)
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Root directory for the per-branch artifacts
    #[arg(long, default_value = "Pendencias")]
    pub output_root: PathBuf,

    /// Date range used to label each branch report
    #[arg(long, value_enum, default_value_t = PeriodScope::Global)]
    pub period_scope: PeriodScope,

    /// Branches rendered in parallel (1-64)
    #[arg(long, default_value = "4", value_parser = clap::value_parser!(u32).range(1..=64))]
    pub jobs: u32,

    /// Recipient store (JSON)
    #[arg(long)]
    pub recipients: Option<PathBuf>,

    /// Company named in notification bodies
    #[arg(long, env = "COMPANY", default_value = "")]
    pub company: String,

    /// Send every notification to this address only
    #[arg(long, env = "EMAIL_TEST")]
    pub test_recipient: Option<String>,

    /// Notification hand-off
    #[arg(long, value_enum, default_value_t = DispatchMode::None)]
    pub dispatch: DispatchMode,

    /// Outbox directory for `--dispatch outbox`
    #[arg(long)]
    pub outbox: Option<PathBuf>,

    /// Timezone for greetings (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Dispatch nothing if any branch failed to render
    #[arg(long)]
    pub fail_fast: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.ledger-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_scope: Option<PeriodScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".ledger-report").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    pub fn clear() -> Result<(), std::io::Error> {
        Self::clear_at(&Self::config_path())
    }

    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with an explicit config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins; `source` is never remembered.
        if !is_arg_explicitly_set(&matches, "output_root") {
            if let Some(v) = last.output_root {
                settings.output_root = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "period_scope") {
            if let Some(v) = last.period_scope {
                settings.period_scope = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "recipients") && settings.recipients.is_none() {
            settings.recipients = last.recipients;
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Resolve the `"auto"` timezone and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    /// Outbox directory, defaulting to `{output_root}/outbox`.
    pub fn outbox_dir(&self) -> PathBuf {
        self.outbox
            .clone()
            .unwrap_or_else(|| self.output_root.join("outbox"))
    }

    /// Parallelism as a permit count.
    pub fn job_count(&self) -> usize {
        self.jobs as usize
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            output_root: Some(s.output_root.clone()),
            period_scope: Some(s.period_scope),
            recipients: s.recipients.clone(),
            timezone: Some(s.timezone.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
