use report_core::formatting::escape_html;
use report_core::models::MonthlyCount;

/// Header of the month column.
pub const MONTH_HEADER: &str = "Ano-Mes";
/// Header of the count column.
pub const COUNT_HEADER: &str = "Quantidade por mês";

/// Render monthly document counts as the HTML table embedded in
/// notification bodies.
///
/// Rows follow the order of `counts`. An empty slice yields a table whose
/// `<tbody>` has no rows.
pub fn render_monthly_summary(counts: &[MonthlyCount]) -> String {
    let mut html = String::new();
    html.push_str("<table border=\"0\" class=\"dataframe table\" id=\"tabela_mes\">\n");
    html.push_str("  <thead>\n");
    html.push_str("    <tr style=\"text-align: center;\">\n");
    html.push_str(&format!("      <th>{}</th>\n", escape_html(MONTH_HEADER)));
    html.push_str(&format!("      <th>{}</th>\n", escape_html(COUNT_HEADER)));
    html.push_str("    </tr>\n");
    html.push_str("  </thead>\n");
    html.push_str("  <tbody>\n");
    for month in counts {
        html.push_str("    <tr>\n");
        html.push_str(&format!("      <td>{}</td>\n", escape_html(&month.label())));
        html.push_str(&format!("      <td>{}</td>\n", month.count));
        html.push_str("    </tr>\n");
    }
    html.push_str("  </tbody>\n");
    html.push_str("</table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year: i32, month: u32, count: usize) -> MonthlyCount {
        MonthlyCount { year, month, count }
    }

    #[test]
    fn test_single_month_table() {
        let html = render_monthly_summary(&[month(2024, 3, 2)]);
        let expected = [
            "<table border=\"0\" class=\"dataframe table\" id=\"tabela_mes\">",
            "  <thead>",
            "    <tr style=\"text-align: center;\">",
            "      <th>Ano-Mes</th>",
            "      <th>Quantidade por mês</th>",
            "    </tr>",
            "  </thead>",
            "  <tbody>",
            "    <tr>",
            "      <td>2024-03</td>",
            "      <td>2</td>",
            "    </tr>",
            "  </tbody>",
            "</table>",
        ]
        .join("\n");
        assert_eq!(html, expected);
    }

    #[test]
    fn test_months_keep_given_order() {
        let html = render_monthly_summary(&[month(2023, 12, 1), month(2024, 1, 5)]);
        let dec = html.find("2023-12").unwrap();
        let jan = html.find("2024-01").unwrap();
        assert!(dec < jan);
        assert_eq!(html.matches("<tr>").count(), 2);
    }

    #[test]
    fn test_empty_counts_have_empty_body() {
        let html = render_monthly_summary(&[]);
        assert!(html.contains("<tbody>\n  </tbody>"));
        assert!(!html.contains("<td>"));
        assert!(html.contains("<th>Ano-Mes</th>"));
    }
}
