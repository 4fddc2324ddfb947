//! Plain-text tables for terminal output.
//!
//! Columns whose every body cell looks numeric (counts, years, percentages)
//! are right-aligned; everything else is left-aligned.

use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let alignments = (0..column_count)
        .map(|idx| {
            let numeric = !rows.is_empty()
                && rows
                    .iter()
                    .all(|row| row.get(idx).is_some_and(|cell| looks_numeric(cell)));
            if numeric { Align::Right } else { Align::Left }
        })
        .collect::<Vec<_>>();

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &alignments));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &alignments));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &alignments));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// Two-column `metric  value` listing.
pub fn print_key_values(pairs: &[(&str, String)]) {
    let headers = vec!["metric".to_string(), "value".to_string()];
    let rows = pairs
        .iter()
        .map(|(key, value)| vec![key.to_string(), value.clone()])
        .collect::<Vec<_>>();
    print_table(&headers, &rows);
}

fn format_row(values: &[String], widths: &[usize], alignments: &[Align]) -> String {
    let mut cells = Vec::with_capacity(widths.len());
    for (idx, width) in widths.iter().enumerate() {
        let value = values.get(idx).map(String::as_str).unwrap_or("");
        let sanitized = sanitize_cell(value);
        let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
        let cell = match alignments.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => format!("{sanitized}{padding}"),
            Align::Right => format!("{padding}{sanitized}"),
        };
        cells.push(cell);
    }
    cells.join("  ").trim_end().to_string()
}

fn looks_numeric(value: &str) -> bool {
    let trimmed = value.trim().trim_end_matches('%');
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn right_aligns_numeric_columns() {
        let rendered = render_table(
            &strings(&["departamento", "fallecidos"]),
            &[strings(&["LIMA", "120"]), strings(&["JUNÍN", "7"])],
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "departamento  fallecidos");
        assert_eq!(lines[1], "------------  ----------");
        assert_eq!(lines[2], "LIMA                 120");
        assert_eq!(lines[3], "JUNÍN                  7");
    }

    #[test]
    fn percentages_count_as_numeric_and_newlines_are_flattened() {
        let rendered = render_table(
            &strings(&["k", "share"]),
            &[strings(&["a\nb", "33.33%"]), strings(&["c", "5.00%"])],
        );
        assert!(rendered.contains("a b"));
        assert!(rendered.lines().last().unwrap().ends_with(" 5.00%"));
    }
}
