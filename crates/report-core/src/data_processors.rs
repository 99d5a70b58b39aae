use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::ops::RangeInclusive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::debug;

use crate::models::{BranchCode, CURRENCY_SCALE};

/// Rounding applied when coercing document values to [`CURRENCY_SCALE`] digits.
///
/// Half-way cases round away from zero (`0,125` → `0.13`).
pub const CURRENCY_ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

// ── CurrencyProcessor ────────────────────────────────────────────────────────

/// Parses locale-formatted amounts such as `"1.234,56"`.
pub struct CurrencyProcessor;

impl CurrencyProcessor {
    /// Parse a raw amount cell.
    ///
    /// `.` is a grouping separator and is removed; `,` is the decimal
    /// separator. Empty cells yield `Ok(None)`. The result is rounded to
    /// [`CURRENCY_SCALE`] digits and always carries exactly that scale.
    pub fn parse(raw: &str) -> Result<Option<Decimal>, rust_decimal::Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let canonical = trimmed.replace('.', "").replace(',', ".");
        let value = Decimal::from_str(&canonical)?;
        Ok(Some(Self::round(value)))
    }

    /// Round `value` to [`CURRENCY_SCALE`] digits and pin the scale.
    pub fn round(value: Decimal) -> Decimal {
        let mut rounded = value.round_dp_with_strategy(CURRENCY_SCALE, CURRENCY_ROUNDING);
        rounded.rescale(CURRENCY_SCALE);
        rounded
    }
}

// ── IssueDateProcessor ───────────────────────────────────────────────────────

/// Day-first date parsing for the issue-date column.
pub struct IssueDateProcessor;

impl IssueDateProcessor {
    // Two-digit-year patterns come first: `%Y` would happily read "24" as
    // year 24, while `%y` rejects a four-digit year as trailing input.
    const DATE_FORMATS: &'static [&'static str] = &[
        "%d/%m/%y",
        "%d/%m/%Y",
        "%d-%m-%y",
        "%d-%m-%Y",
        "%d.%m.%Y",
        "%Y-%m-%d",
    ];

    const DATETIME_FORMATS: &'static [&'static str] = &[
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%d-%m-%Y %H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    /// Years an issue date may fall in. Spreadsheet date cells start at
    /// 1900; the upper bound is the last year the ledger export can carry.
    pub const YEAR_RANGE: RangeInclusive<i32> = 1900..=2262;

    /// Parse a raw issue-date cell; anything unrecognised yields `None`.
    ///
    /// A date that parses but falls outside [`Self::YEAR_RANGE`] (a typo such
    /// as `15/02/202`) is treated as unparsable too.
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        let parsed = Self::DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
            .or_else(|| {
                Self::DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|dt| dt.date())
            });

        match parsed {
            Some(date) if Self::YEAR_RANGE.contains(&date.year()) => Some(date),
            Some(date) => {
                debug!("IssueDateProcessor: year of \"{}\" out of range ({})", s, date);
                None
            }
            None => {
                debug!("IssueDateProcessor: could not parse date \"{}\"", s);
                None
            }
        }
    }
}

// ── BranchCodeProcessor ──────────────────────────────────────────────────────

/// Canonicalizes raw branch identifiers.
pub struct BranchCodeProcessor;

impl BranchCodeProcessor {
    /// Parse a raw branch cell into its canonical [`BranchCode`].
    ///
    /// Empty cells yield `Ok(None)`. A code whose integer form has a single
    /// digit is padded from that form (`"005"` → `"05"`); any other code keeps
    /// its text as written (`"012"` stays `"012"`).
    pub fn parse(raw: &str) -> Result<Option<BranchCode>, std::num::ParseIntError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let value: i64 = trimmed.parse()?;
        Ok(Some(BranchCode::from_cell(trimmed, value)))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── CurrencyProcessor ────────────────────────────────────────────────────

    #[test]
    fn test_currency_grouped_value() {
        let v = CurrencyProcessor::parse("1.234,56").unwrap().unwrap();
        assert_eq!(v, dec!(1234.56));
        assert_eq!(v.scale(), 2);
    }

    #[test]
    fn test_currency_fraction_only() {
        let v = CurrencyProcessor::parse("0,50").unwrap().unwrap();
        assert_eq!(v.to_string(), "0.50");
    }

    #[test]
    fn test_currency_integer_gets_two_digits() {
        let v = CurrencyProcessor::parse("100").unwrap().unwrap();
        assert_eq!(v.to_string(), "100.00");
    }

    #[test]
    fn test_currency_millions() {
        let v = CurrencyProcessor::parse("1.234.567,8").unwrap().unwrap();
        assert_eq!(v.to_string(), "1234567.80");
    }

    #[test]
    fn test_currency_negative() {
        let v = CurrencyProcessor::parse("-9.876,54").unwrap().unwrap();
        assert_eq!(v, dec!(-9876.54));
    }

    #[test]
    fn test_currency_rounds_half_up() {
        assert_eq!(CurrencyProcessor::parse("0,125").unwrap(), Some(dec!(0.13)));
        assert_eq!(CurrencyProcessor::parse("2,675").unwrap(), Some(dec!(2.68)));
        assert_eq!(CurrencyProcessor::parse("0,124").unwrap(), Some(dec!(0.12)));
        assert_eq!(CurrencyProcessor::parse("-0,125").unwrap(), Some(dec!(-0.13)));
    }

    #[test]
    fn test_currency_empty_is_none() {
        assert_eq!(CurrencyProcessor::parse("").unwrap(), None);
        assert_eq!(CurrencyProcessor::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_currency_surrounding_whitespace() {
        assert_eq!(CurrencyProcessor::parse(" 50,50 ").unwrap(), Some(dec!(50.50)));
    }

    #[test]
    fn test_currency_garbage_is_error() {
        assert!(CurrencyProcessor::parse("abc").is_err());
        assert!(CurrencyProcessor::parse("12,3,4").is_err());
    }

    // ── IssueDateProcessor ───────────────────────────────────────────────────

    #[test]
    fn test_date_day_first() {
        assert_eq!(IssueDateProcessor::parse("01/03/2024"), Some(date(2024, 3, 1)));
        assert_eq!(IssueDateProcessor::parse("31/12/2023"), Some(date(2023, 12, 31)));
    }

    #[test]
    fn test_date_two_digit_year() {
        assert_eq!(IssueDateProcessor::parse("01/03/24"), Some(date(2024, 3, 1)));
    }

    #[test]
    fn test_date_with_time_part() {
        assert_eq!(
            IssueDateProcessor::parse("15/02/2024 08:30:00"),
            Some(date(2024, 2, 15))
        );
        assert_eq!(
            IssueDateProcessor::parse("15/02/2024 08:30"),
            Some(date(2024, 2, 15))
        );
    }

    #[test]
    fn test_date_alternate_separators() {
        assert_eq!(IssueDateProcessor::parse("05-01-2024"), Some(date(2024, 1, 5)));
        assert_eq!(IssueDateProcessor::parse("05.01.2024"), Some(date(2024, 1, 5)));
    }

    #[test]
    fn test_date_iso() {
        assert_eq!(IssueDateProcessor::parse("2024-01-05"), Some(date(2024, 1, 5)));
    }

    #[test]
    fn test_date_year_out_of_range_is_none() {
        assert_eq!(IssueDateProcessor::parse("15/02/202"), None);
        assert_eq!(IssueDateProcessor::parse("01/01/0024"), None);
        assert_eq!(IssueDateProcessor::parse("01/01/1899"), None);
        assert_eq!(IssueDateProcessor::parse("01/01/9999"), None);
        assert_eq!(IssueDateProcessor::parse("0202-02-15"), None);
    }

    #[test]
    fn test_date_year_range_edges() {
        assert_eq!(IssueDateProcessor::parse("01/01/1900"), Some(date(1900, 1, 1)));
        assert_eq!(IssueDateProcessor::parse("31/12/2262"), Some(date(2262, 12, 31)));
    }

    #[test]
    fn test_date_unparsable_is_none() {
        assert_eq!(IssueDateProcessor::parse("not a date"), None);
        assert_eq!(IssueDateProcessor::parse("32/01/2024"), None);
        assert_eq!(IssueDateProcessor::parse(""), None);
    }

    // ── BranchCodeProcessor ──────────────────────────────────────────────────

    #[test]
    fn test_branch_single_digit_padded() {
        for raw in ["1", "5", "9", " 3 "] {
            let code = BranchCodeProcessor::parse(raw).unwrap().unwrap();
            assert_eq!(code.as_str().len(), 2, "raw = {raw}");
            assert!(code.as_str().starts_with('0'));
        }
    }

    #[test]
    fn test_branch_wide_codes_unchanged() {
        assert_eq!(BranchCodeProcessor::parse("12").unwrap().unwrap().as_str(), "12");
        assert_eq!(BranchCodeProcessor::parse("123").unwrap().unwrap().as_str(), "123");
    }

    #[test]
    fn test_branch_single_digit_value_is_repadded() {
        assert_eq!(BranchCodeProcessor::parse("05").unwrap().unwrap().as_str(), "05");
        assert_eq!(BranchCodeProcessor::parse("005").unwrap().unwrap().as_str(), "05");
    }

    #[test]
    fn test_branch_wide_value_keeps_text() {
        assert_eq!(BranchCodeProcessor::parse("012").unwrap().unwrap().as_str(), "012");
        assert_eq!(BranchCodeProcessor::parse(" 0123 ").unwrap().unwrap().as_str(), "0123");
    }

    #[test]
    fn test_branch_empty_is_none() {
        assert_eq!(BranchCodeProcessor::parse("").unwrap(), None);
    }

    #[test]
    fn test_branch_non_numeric_is_error() {
        assert!(BranchCodeProcessor::parse("LJ5").is_err());
    }
}
