use chrono::{Datelike, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::formatting::format_month_year;
use crate::models::Period;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Parse an IANA timezone name, resolving `"auto"` to the system zone.
///
/// Unknown names fall back to UTC with a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    let name = if tz_name == "auto" {
        get_system_timezone()
    } else {
        tz_name.to_string()
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

/// Returns `true` for a valid IANA timezone name.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

// ── Greeting ──────────────────────────────────────────────────────────────────

/// Greeting that opens a notification, chosen by local hour.
pub fn greeting_for_hour(hour: u32) -> &'static str {
    if hour < 12 {
        "Bom dia!"
    } else if hour < 18 {
        "Boa tarde!"
    } else {
        "Boa noite!"
    }
}

/// Greeting for the current wall-clock time in `tz`.
pub fn current_greeting(tz: Tz) -> &'static str {
    greeting_for_hour(Utc::now().with_timezone(&tz).hour())
}

// ── Period wording ────────────────────────────────────────────────────────────

/// Whole calendar months elapsed from `period.start` to `period.end`.
///
/// A month only counts once the end day reaches the start day.
pub fn whole_months_between(period: &Period) -> i32 {
    let (start, end) = (period.start, period.end);
    let mut months = (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32);
    if end.day() < start.day() {
        months -= 1;
    }
    months
}

/// Human wording of the reporting window used in notification bodies.
///
/// * at least one whole month → `"no período entre MM/YYYY até MM/YYYY"`
/// * otherwise → `"no mês MM/YYYY"`
pub fn describe_period(period: &Period) -> String {
    if whole_months_between(period) >= 1 {
        format!(
            "no período entre {} até {}",
            format_month_year(period.start),
            format_month_year(period.end)
        )
    } else {
        format!("no mês {}", format_month_year(period.start))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
