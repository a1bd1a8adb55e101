//! CSV export helpers with spreadsheet formula-injection protection.

fn needs_formula_guard(value: &str) -> bool {
    matches!(value.chars().next(), Some('=' | '+' | '-' | '@'))
}

/// Prefixes cells that a spreadsheet would evaluate as a formula.
pub fn sanitize_cell(value: &str) -> String {
    if needs_formula_guard(value) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}

/// Writes a header and rows into a CSV string; every cell is sanitized.
pub fn write_csv(header: &[&str], rows: &[Vec<String>]) -> anyhow::Result<String> {
    let mut writer = ::csv::WriterBuilder::new()
        .quote_style(::csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(|cell| sanitize_cell(cell)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_cell_guards_formulas() {
        assert_eq!(sanitize_cell("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(sanitize_cell("@cmd"), "'@cmd");
        assert_eq!(sanitize_cell("Ana"), "Ana");
    }

    #[test]
    fn write_csv_quotes_every_cell() {
        let csv = write_csv(
            &["name", "amount"],
            &[vec!["Ana \"A\"".to_string(), "-10".to_string()]],
        )
        .expect("csv");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("\"name\",\"amount\""));
        assert_eq!(lines.next(), Some("\"Ana \"\"A\"\"\",\"'-10\""));
    }
}
