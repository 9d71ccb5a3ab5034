//! Plain-text tables for terminal output.

use std::fmt::Write as _;

use crate::workbook::Tab;

/// Renders `rows` under `headers` with two-space gutters and a dashed rule.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| cell_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(headers, &widths));
    let rule = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let rule_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&rule, &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// Display rows of `tab` prefixed by their spreadsheet row numbers.
pub fn numbered_rows(tab: &Tab, limit: usize) -> (Vec<String>, Vec<Vec<String>>) {
    let (headers, rows) = tab.display_rows();
    let mut numbered_headers = Vec::with_capacity(headers.len() + 1);
    numbered_headers.push("row".to_string());
    numbered_headers.extend(headers);
    let rows = rows
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, row)| {
            let mut numbered = Vec::with_capacity(row.len() + 1);
            numbered.push(Tab::sheet_row(idx).to_string());
            numbered.extend(row);
            numbered
        })
        .collect();
    (numbered_headers, rows)
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = flatten(value);
            let pad = width.saturating_sub(cell_width(&cell));
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}

// Line breaks inside a cell would split the table row.
fn flatten(value: &str) -> String {
    value
        .chars()
        .map(|ch| if matches!(ch, '\n' | '\r' | '\t') { ' ' } else { ch })
        .collect()
}
