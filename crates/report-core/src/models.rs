use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::RenderError;

/// Number of fractional digits kept for every monetary value.
pub const CURRENCY_SCALE: u32 = 2;

/// Display format used for issue dates inside artifacts.
pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";

// ── Column configuration ─────────────────────────────────────────────────────

/// Names of the source columns the pipeline coerces.
///
/// Defaults match the ledger export of the ERP the reports are built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub branch: String,
    pub issue_date: String,
    pub document_value: String,
    /// Free-text column dropped before emission.
    pub remarks: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            branch: "Loja".to_string(),
            issue_date: "Dt. Emissão".to_string(),
            document_value: "Vlr. Documento".to_string(),
            remarks: "Observações".to_string(),
        }
    }
}

/// How a retained column is stored on a [`LedgerRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Branch,
    DocumentValue,
    IssueDate,
    Passthrough,
}

/// A retained column, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub role: ColumnRole,
}

impl Column {
    pub fn new(name: impl Into<String>, role: ColumnRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

// ── Raw table ────────────────────────────────────────────────────────────────

/// The ledger exactly as read from disk: trimmed header plus raw cell text.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// File the table was read from (used in error messages).
    pub source: PathBuf,
    /// Column names, trimmed, in file order.
    pub headers: Vec<String>,
    /// One entry per data line; every row has `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of `name` in the header, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }
}

// ── BranchCode ───────────────────────────────────────────────────────────────

/// Canonical branch identifier: integer form, at least two characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchCode(String);

impl BranchCode {
    /// Build the canonical code from the integer value of a raw branch cell.
    ///
    /// One-character forms get a single leading zero; anything longer is
    /// kept as is (`5` → `"05"`, `12` → `"12"`, `123` → `"123"`).
    pub fn from_integer(value: i64) -> Self {
        let digits = value.to_string();
        if digits.chars().count() < 2 {
            Self(format!("0{digits}"))
        } else {
            Self(digits)
        }
    }

    /// Build the canonical code of a branch cell whose text is `text` and
    /// whose integer value is `value`.
    ///
    /// Only a one-digit value is rebuilt and padded; wider codes keep `text`.
    pub fn from_cell(text: &str, value: i64) -> Self {
        if value.to_string().chars().count() < 2 {
            Self::from_integer(value)
        } else {
            Self(text.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

// ── Normalized rows ──────────────────────────────────────────────────────────

/// One ledger line after field coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRow {
    /// `None` when the branch cell was empty.
    pub branch_code: Option<BranchCode>,
    /// Rounded to [`CURRENCY_SCALE`] digits; `None` when the cell was empty.
    pub document_value: Option<Decimal>,
    /// `None` when the date cell was empty or unparsable.
    pub issue_date: Option<NaiveDate>,
    /// Every other retained column, keyed by column name.
    pub passthrough: BTreeMap<String, String>,
}

impl LedgerRow {
    /// The value this row holds for `column`, typed by the column's role.
    pub fn cell(&self, column: &Column) -> CellValue<'_> {
        match column.role {
            ColumnRole::Branch => self
                .branch_code
                .as_ref()
                .map_or(CellValue::Empty, |b| CellValue::Text(b.as_str())),
            ColumnRole::DocumentValue => self
                .document_value
                .map_or(CellValue::Empty, CellValue::Number),
            ColumnRole::IssueDate => self.issue_date.map_or(CellValue::Empty, CellValue::Date),
            ColumnRole::Passthrough => match self.passthrough.get(&column.name) {
                Some(s) if !s.is_empty() => CellValue::Text(s),
                _ => CellValue::Empty,
            },
        }
    }
}

/// A typed view of one cell, used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Number(Decimal),
    Date(NaiveDate),
    Empty,
}

impl CellValue<'_> {
    /// Text shown for this cell in an artifact; empty cells yield `None`.
    pub fn display_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some((*s).to_string()),
            CellValue::Number(d) => Some(format!("{:.2}", d)),
            CellValue::Date(d) => Some(d.format(DATE_DISPLAY_FORMAT).to_string()),
            CellValue::Empty => None,
        }
    }
}

/// The whole ledger after normalization.
#[derive(Debug, Clone, Default)]
pub struct LedgerTable {
    /// Retained columns in source order (remarks already removed).
    pub columns: Vec<Column>,
    pub rows: Vec<LedgerRow>,
}

impl LedgerTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All parseable issue dates, in row order.
    pub fn issue_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().filter_map(|r| r.issue_date)
    }
}

// ── Period ───────────────────────────────────────────────────────────────────

/// Inclusive reporting window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Smallest window covering every date in `dates`; `None` for no dates.
    pub fn spanning(dates: impl IntoIterator<Item = NaiveDate>) -> Option<Self> {
        dates.into_iter().fold(None, |acc, d| match acc {
            None => Some(Period { start: d, end: d }),
            Some(p) => Some(Period {
                start: p.start.min(d),
                end: p.end.max(d),
            }),
        })
    }

    /// Folder label for the period end, `MMYYYY`.
    pub fn end_folder_label(&self) -> String {
        self.end.format("%m%Y").to_string()
    }
}

/// Which date range a branch report is labelled with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PeriodScope {
    /// One window over the whole ledger, shared by every branch.
    #[default]
    Global,
    /// Each branch uses the range of its own rows.
    #[value(name = "branch")]
    #[serde(rename = "branch")]
    PerBranch,
}

// ── Branch groups and aggregates ─────────────────────────────────────────────

/// All rows of one branch, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchGroup {
    pub branch_code: BranchCode,
    pub rows: Vec<LedgerRow>,
}

impl BranchGroup {
    /// Date range of this branch's own rows.
    pub fn own_period(&self) -> Option<Period> {
        Period::spanning(self.rows.iter().filter_map(|r| r.issue_date))
    }
}

/// Number of documents issued in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

impl MonthlyCount {
    /// Month key of `date`.
    pub fn key_of(date: NaiveDate) -> (i32, u32) {
        (date.year(), date.month())
    }

    /// Label in `YYYY-MM` form.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Per-branch statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchSummary {
    pub total_value: Decimal,
    pub quantity: usize,
    /// Ascending by `(year, month)`; rows without a date are not counted.
    pub monthly_counts: Vec<MonthlyCount>,
}

// ── Reports ──────────────────────────────────────────────────────────────────

/// Pipeline options that change report content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub period_scope: PeriodScope,
    pub columns: ColumnNames,
}

/// Final per-branch artifact handed to the notification layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchReport {
    pub branch: BranchCode,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub artifact_path: PathBuf,
    pub quantity: usize,
    /// Total in `1.234,56` form.
    pub total_value_formatted: String,
    /// HTML table of monthly counts.
    pub summary_markup: String,
}

/// Result of processing one branch when failures are isolated per branch.
#[derive(Debug)]
pub struct BranchOutcome {
    pub branch: BranchCode,
    pub result: std::result::Result<BranchReport, RenderError>,
}

impl BranchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_branch_code_pads_single_digit() {
        assert_eq!(BranchCode::from_integer(5).as_str(), "05");
        assert_eq!(BranchCode::from_integer(0).as_str(), "00");
    }

    #[test]
    fn test_branch_code_keeps_wider_codes() {
        assert_eq!(BranchCode::from_integer(12).as_str(), "12");
        assert_eq!(BranchCode::from_integer(123).as_str(), "123");
    }

    #[test]
    fn test_branch_code_from_cell() {
        assert_eq!(BranchCode::from_cell("005", 5).as_str(), "05");
        assert_eq!(BranchCode::from_cell("012", 12).as_str(), "012");
        assert_eq!(BranchCode::from_cell("12", 12).as_str(), "12");
    }

    #[test]
    fn test_branch_code_ordering_is_lexicographic() {
        let mut codes = vec![
            BranchCode::from_integer(12),
            BranchCode::from_integer(100),
            BranchCode::from_integer(5),
        ];
        codes.sort();
        let labels: Vec<&str> = codes.iter().map(BranchCode::as_str).collect();
        assert_eq!(labels, vec!["05", "100", "12"]);
    }

    #[test]
    fn test_period_spanning() {
        let p = Period::spanning([date(2024, 3, 5), date(2024, 1, 9), date(2024, 2, 1)]).unwrap();
        assert_eq!(p.start, date(2024, 1, 9));
        assert_eq!(p.end, date(2024, 3, 5));
        assert!(p.start <= p.end);
    }

    #[test]
    fn test_period_spanning_empty() {
        assert!(Period::spanning(Vec::new()).is_none());
    }

    #[test]
    fn test_period_end_folder_label() {
        let p = Period {
            start: date(2023, 11, 2),
            end: date(2024, 3, 1),
        };
        assert_eq!(p.end_folder_label(), "032024");
    }

    #[test]
    fn test_monthly_count_label() {
        let m = MonthlyCount {
            year: 2024,
            month: 3,
            count: 4,
        };
        assert_eq!(m.label(), "2024-03");
    }

    #[test]
    fn test_cell_values_by_role() {
        let mut passthrough = BTreeMap::new();
        passthrough.insert("Fornecedor".to_string(), "ACME".to_string());
        passthrough.insert("Serie".to_string(), String::new());
        let row = LedgerRow {
            branch_code: Some(BranchCode::from_integer(7)),
            document_value: Some(dec!(10.50)),
            issue_date: Some(date(2024, 3, 1)),
            passthrough,
        };

        let branch = Column::new("Loja", ColumnRole::Branch);
        let value = Column::new("Vlr. Documento", ColumnRole::DocumentValue);
        let issued = Column::new("Dt. Emissão", ColumnRole::IssueDate);
        let supplier = Column::new("Fornecedor", ColumnRole::Passthrough);
        let series = Column::new("Serie", ColumnRole::Passthrough);
        let missing = Column::new("Nada", ColumnRole::Passthrough);

        assert_eq!(row.cell(&branch).display_text().as_deref(), Some("07"));
        assert_eq!(row.cell(&value).display_text().as_deref(), Some("10.50"));
        assert_eq!(row.cell(&issued).display_text().as_deref(), Some("01/03/2024"));
        assert_eq!(row.cell(&supplier).display_text().as_deref(), Some("ACME"));
        assert_eq!(row.cell(&series), CellValue::Empty);
        assert_eq!(row.cell(&missing), CellValue::Empty);
    }

    #[test]
    fn test_branch_report_serializes_branch_as_string() {
        let report = BranchReport {
            branch: BranchCode::from_integer(5),
            period_start: date(2024, 3, 1),
            period_end: date(2024, 3, 1),
            artifact_path: PathBuf::from("/out/05/032024/Pendencias 05.xlsx"),
            quantity: 1,
            total_value_formatted: "100,00".to_string(),
            summary_markup: String::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["branch"], "05");
        assert_eq!(json["period_end"], "2024-03-01");
    }

    #[test]
    fn test_column_names_default() {
        let names = ColumnNames::default();
        assert_eq!(names.branch, "Loja");
        assert_eq!(names.issue_date, "Dt. Emissão");
        assert_eq!(names.document_value, "Vlr. Documento");
        assert_eq!(names.remarks, "Observações");
    }
}
