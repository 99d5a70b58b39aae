use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::data_processors::CURRENCY_ROUNDING;

/// Format a decimal with `.` thousands separators and a `,` decimal
/// separator, rounded to exactly `decimals` places.
///
/// # Examples
///
/// ```
/// use report_core::formatting::format_number_br;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_number_br(Decimal::new(123456, 2), 2), "1.234,56");
/// assert_eq!(format_number_br(Decimal::new(1234567, 0), 0), "1.234.567");
/// assert_eq!(format_number_br(Decimal::ZERO, 2), "0,00");
/// ```
pub fn format_number_br(value: Decimal, decimals: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(decimals, CURRENCY_ROUNDING);
    rounded.rescale(decimals);

    // "-0,00" is never shown.
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut result = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        result.push('-');
    }
    result.push_str(&group_thousands(int_part, '.'));
    if decimals > 0 {
        result.push(',');
        result.push_str(frac_part);
    }
    result
}

/// Format a monetary total the way reports display it: `1.234,56`.
///
/// This is the single place totals are turned into text.
pub fn format_decimal_br(value: Decimal) -> String {
    format_number_br(value, 2)
}

/// Format a date as `MM/YYYY`, as used in notification subjects.
pub fn format_month_year(date: NaiveDate) -> String {
    date.format("%m/%Y").to_string()
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert `separator` every three digits from the right of an integer string.
fn group_thousands(s: &str, separator: char) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(separator);
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
