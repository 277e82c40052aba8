use crate::grid::CellValue;
use crate::normalize::{normalize_digits, parse_amount};
use std::collections::HashMap;

/// Cells whose text marks the end of a data table.
pub const TOTAL_ROW_MARKERS: [&str; 4] = ["total", "grand total", "اجمالي", "الإجمالي"];

/// A located header row: its index, the column index per required name, and
/// the data region beneath it.
#[derive(Debug, Clone)]
pub struct HeaderTable<'a> {
    pub header_row: usize,
    pub columns: HashMap<String, usize>,
    pub data_rows: &'a [Vec<CellValue>],
}

impl HeaderTable<'_> {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// The cell under a mapped column for one data row.
    pub fn cell<'r>(&self, row: &'r [CellValue], name: &str) -> Option<&'r CellValue> {
        self.column_index(name).and_then(|idx| row.get(idx))
    }
}

/// Scans every cell for an exact trimmed, case-folded match against any of
/// the label variants. Results come back in row-major scan order.
pub fn find_cells_by_label(
    matrix: &[Vec<CellValue>],
    label_variants: &[&str],
) -> Vec<(usize, usize)> {
    let targets: Vec<String> = label_variants
        .iter()
        .map(|v| v.trim().to_lowercase())
        .collect();

    let mut matches = Vec::new();
    for (r, row) in matrix.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if let CellValue::Text(s) = cell {
                let normalized = s.trim().to_lowercase();
                if targets.iter().any(|t| *t == normalized) {
                    matches.push((r, c));
                }
            }
        }
    }
    matches
}

/// Finds the first numeric value around `(row, col)` in increasing Manhattan
/// distance, up to `radius`. The origin itself is excluded. Ties at equal
/// distance resolve by scan order: row offset outer, column offset inner.
/// A heuristic label-adjacent lookup, not a Euclidean nearest.
pub fn find_nearest_number(
    matrix: &[Vec<CellValue>],
    row: usize,
    col: usize,
    radius: usize,
) -> Option<f64> {
    for distance in 1..=radius as i64 {
        for dr in -distance..=distance {
            let spread = distance - dr.abs();
            let column_offsets = if spread == 0 {
                vec![0]
            } else {
                vec![-spread, spread]
            };
            for dc in column_offsets {
                let r = row as i64 + dr;
                let c = col as i64 + dc;
                if r < 0 || c < 0 {
                    continue;
                }
                let cell = matrix.get(r as usize).and_then(|line| line.get(c as usize));
                if let Some(value) = cell.and_then(parse_amount) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Normalizes a cell for header-name comparison: display text with digits
/// normalized, NBSP and runs of whitespace collapsed, trimmed, lowercased.
pub fn normalize_label(cell: &CellValue) -> String {
    normalize_label_text(&cell.display_text())
}

fn normalize_label_text(text: &str) -> String {
    normalize_digits(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn match_header_row<'a>(
    matrix: &'a [Vec<CellValue>],
    normalized_required: &[(String, String)],
    r: usize,
) -> Option<HeaderTable<'a>> {
    let row = &matrix[r];
    let mut columns = HashMap::new();

    for (original, target) in normalized_required {
        if let Some(idx) = row.iter().position(|cell| normalize_label(cell) == *target) {
            columns.insert(original.clone(), idx);
        }
    }

    if columns.len() == normalized_required.len() {
        Some(HeaderTable {
            header_row: r,
            columns,
            data_rows: &matrix[r + 1..],
        })
    } else {
        None
    }
}

fn normalized_pairs(required: &[&str]) -> Vec<(String, String)> {
    required
        .iter()
        .map(|name| (name.to_string(), normalize_label_text(name)))
        .collect()
}

/// Finds the first row at or after `start_row` where every required header
/// name matches some cell (order-independent, first matching column wins
/// per name). Returns `None` when no row in the remaining range qualifies.
pub fn locate_header_row<'a>(
    matrix: &'a [Vec<CellValue>],
    required: &[&str],
    start_row: usize,
) -> Option<HeaderTable<'a>> {
    let pairs = normalized_pairs(required);
    (start_row..matrix.len()).find_map(|r| match_header_row(matrix, &pairs, r))
}

/// Collects every qualifying header row found scanning from each preferred
/// start row, deduplicated by row index. Callers score the candidates (for
/// example by parsed-row count) instead of trusting the first hit, which
/// guards against decoy header-like rows elsewhere in the sheet.
pub fn locate_header_row_candidates<'a>(
    matrix: &'a [Vec<CellValue>],
    required: &[&str],
    preferred_starts: &[usize],
) -> Vec<HeaderTable<'a>> {
    let pairs = normalized_pairs(required);
    let mut candidates: Vec<HeaderTable<'a>> = Vec::new();

    for &start in preferred_starts {
        for r in start..matrix.len() {
            if candidates.iter().any(|c| c.header_row == r) {
                continue;
            }
            if let Some(table) = match_header_row(matrix, &pairs, r) {
                candidates.push(table);
            }
        }
    }

    candidates
}

/// True when every cell is absent or whitespace-only text.
pub fn is_empty_row(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_blank)
}

/// True when any cell's trimmed, case-folded text is a recognized total-row
/// marker.
pub fn is_total_row(row: &[CellValue]) -> bool {
    row.iter().any(|cell| {
        matches!(cell, CellValue::Text(s)
            if TOTAL_ROW_MARKERS.contains(&s.trim().to_lowercase().as_str()))
    })
}
