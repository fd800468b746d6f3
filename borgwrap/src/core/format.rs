//! Human-readable rendering for archive listings.

const SIZE_UNITS: [&str; 8] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "Zi"];

/// Extra spaces after the widest cell of each column.
const COLUMN_PADDING: usize = 4;

/// Render a byte count with binary units, truncating toward zero (`1536` → `1KiB`).
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024;
        unit += 1;
    }
    format!("{value}{}B", SIZE_UNITS[unit])
}

/// Render an archive duration in whole seconds.
pub fn format_duration(seconds: f64) -> String {
    format!("{}s", seconds.max(0.0).trunc() as u64)
}

/// Left-justified table; every column is as wide as its widest cell plus padding.
///
/// Trailing spaces are trimmed from each line. The result ends with a newline.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    for row in std::iter::once(&header_cells).chain(rows.iter()) {
        let mut line = String::new();
        for (cell, width) in row.iter().zip(&widths) {
            line.push_str(&format!("{cell:<w$}", w = width + COLUMN_PADDING));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
