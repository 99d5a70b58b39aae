//! Per-branch spreadsheet artifacts.
//!
//! Each branch gets `{output_root}/{branch}/{MMYYYY}/Pendencias {branch}.xlsx`,
//! where `MMYYYY` is the month of the period end. Column widths are fitted
//! from the rows in memory before the single save, so no file is re-read.

use std::path::{Path, PathBuf};

use report_core::error::RenderError;
use report_core::models::{BranchCode, BranchGroup, CellValue, Column, LedgerRow, Period};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::layout::fit_column_widths;

/// File name prefix of every branch artifact.
pub const ARTIFACT_PREFIX: &str = "Pendencias";

const NUMBER_FORMAT: &str = "0.00";
const DATE_FORMAT: &str = "dd/mm/yyyy";

// ── Paths ─────────────────────────────────────────────────────────────────────

/// Directory holding the artifact of `branch` for `period`.
pub fn artifact_dir(output_root: &Path, branch: &BranchCode, period: &Period) -> PathBuf {
    output_root
        .join(branch.as_str())
        .join(period.end_folder_label())
}

/// Full path of the artifact of `branch` for `period`.
pub fn artifact_path(output_root: &Path, branch: &BranchCode, period: &Period) -> PathBuf {
    artifact_dir(output_root, branch, period).join(format!("{} {}.xlsx", ARTIFACT_PREFIX, branch))
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Write the spreadsheet of `group` and return its path.
///
/// The sheet has a header row with the names of `columns` followed by one
/// row per ledger row, in order. An existing file at the same path is
/// replaced.
pub fn write_branch_workbook(
    group: &BranchGroup,
    columns: &[Column],
    output_root: &Path,
    period: &Period,
) -> Result<PathBuf, RenderError> {
    let dir = artifact_dir(output_root, &group.branch_code, period);
    std::fs::create_dir_all(&dir).map_err(|source| RenderError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let path = artifact_path(output_root, &group.branch_code, period);
    let to_render_error = |e: XlsxError| RenderError::Workbook {
        path: path.clone(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    fill_worksheet(worksheet, columns, &group.rows).map_err(to_render_error)?;
    workbook.save(&path).map_err(to_render_error)?;

    debug!(
        "Wrote {} rows for branch {} to {}",
        group.rows.len(),
        group.branch_code,
        path.display()
    );
    Ok(path)
}

fn fill_worksheet(
    worksheet: &mut Worksheet,
    columns: &[Column],
    rows: &[LedgerRow],
) -> Result<(), XlsxError> {
    let header_format = Format::new().set_bold();
    let number_format = Format::new().set_num_format(NUMBER_FORMAT);
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    for (col, column) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_num(col)?, &column.name, &header_format)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let sheet_row = row_num(idx + 1)?;
        for (col, column) in columns.iter().enumerate() {
            let sheet_col = col_num(col)?;
            match row.cell(column) {
                CellValue::Text(text) => {
                    worksheet.write_string(sheet_row, sheet_col, text)?;
                }
                CellValue::Number(value) => match value.to_f64() {
                    Some(number) => {
                        worksheet.write_number_with_format(
                            sheet_row,
                            sheet_col,
                            number,
                            &number_format,
                        )?;
                    }
                    None => {
                        worksheet.write_string(sheet_row, sheet_col, value.to_string())?;
                    }
                },
                CellValue::Date(date) => {
                    let excel_date = excel_date(date)?;
                    worksheet.write_datetime_with_format(
                        sheet_row,
                        sheet_col,
                        &excel_date,
                        &date_format,
                    )?;
                }
                CellValue::Empty => {}
            }
        }
    }

    for (col, width) in fit_column_widths(columns, rows).into_iter().enumerate() {
        worksheet.set_column_width(col_num(col)?, width as f64)?;
    }

    Ok(())
}

fn excel_date(date: chrono::NaiveDate) -> Result<ExcelDateTime, XlsxError> {
    use chrono::Datelike;

    let year = u16::try_from(date.year()).map_err(|_| {
        XlsxError::ParameterError(format!("date {} is outside the spreadsheet range", date))
    })?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)
}

fn col_num(idx: usize) -> Result<u16, XlsxError> {
    u16::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

fn row_num(idx: usize) -> Result<u32, XlsxError> {
    u32::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
