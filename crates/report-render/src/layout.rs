use report_core::models::{Column, LedgerRow};

/// Characters added to the widest cell of a column.
pub const WIDTH_PADDING: usize = 2;

/// Width of every column in `columns`, computed from the rows in memory.
///
/// A column is as wide as its longest display text (header included),
/// counted in characters, plus [`WIDTH_PADDING`]. Empty cells are ignored.
pub fn fit_column_widths(columns: &[Column], rows: &[LedgerRow]) -> Vec<usize> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.name.chars().count()).collect();

    for row in rows {
        for (width, column) in widths.iter_mut().zip(columns) {
            if let Some(text) = row.cell(column).display_text() {
                *width = (*width).max(text.chars().count());
            }
        }
    }

    widths.into_iter().map(|w| w + WIDTH_PADDING).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use report_core::models::{BranchCode, ColumnRole};
    use rust_decimal_macros::dec;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("Loja", ColumnRole::Branch),
            Column::new("Fornecedor", ColumnRole::Passthrough),
            Column::new("Dt. Emissão", ColumnRole::IssueDate),
            Column::new("Vlr", ColumnRole::DocumentValue),
        ]
    }

    fn row(supplier: &str, value: rust_decimal::Decimal) -> LedgerRow {
        let mut row = LedgerRow {
            branch_code: Some(BranchCode::from_integer(5)),
            document_value: Some(value),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };
        row.passthrough
            .insert("Fornecedor".to_string(), supplier.to_string());
        row
    }

    #[test]
    fn test_header_only_widths() {
        let widths = fit_column_widths(&columns(), &[]);
        assert_eq!(widths, vec![6, 12, 13, 5]);
    }

    #[test]
    fn test_widest_cell_wins() {
        let rows = vec![
            row("ACME", dec!(1.00)),
            row("Distribuidora São João Ltda", dec!(123456.78)),
        ];
        let widths = fit_column_widths(&columns(), &rows);

        // "Distribuidora São João Ltda" has 27 characters.
        assert_eq!(widths[1], 29);
        // "01/03/2024" is shorter than the header.
        assert_eq!(widths[2], 13);
        // "123456.78"
        assert_eq!(widths[3], 11);
    }

    #[test]
    fn test_width_counts_characters_not_bytes() {
        let cols = vec![Column::new("A", ColumnRole::Passthrough)];
        let mut r = LedgerRow::default();
        r.passthrough.insert("A".to_string(), "ção".to_string());
        assert_eq!(fit_column_widths(&cols, &[r]), vec![5]);
    }
}
