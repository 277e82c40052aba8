use crate::error::DecodeError;
use crate::normalize;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// A decoded cell. Everything the extraction pipeline sees is one of these
/// four shapes; the normalizer functions match exhaustively over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    /// True for absent cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) | CellValue::Date(_) => false,
        }
    }

    /// The cell coerced to display text: numbers without a trailing ".0",
    /// dates in canonical form, absent cells as the empty string.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format!("{}", n),
            CellValue::Date(d) => normalize::format_canonical(*d),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

/// A sheet's used range as a dense rectangular matrix, row-major.
/// Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    grid: Vec<Vec<CellValue>>,
}

/// Rows reinterpreted against a header row: the header text per column plus
/// the data rows beneath it.
#[derive(Debug, Clone)]
pub struct RowRecords {
    headers: Vec<String>,
    normalized_headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Collapses runs of whitespace (including NBSP), trims, and case-folds, so
/// header matching tolerates spelling drift like doubled spaces.
pub fn normalize_column_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Sheet {
    /// Builds a sheet from raw rows, padding ragged rows out to a rectangle.
    pub fn new(name: impl Into<String>, mut grid: Vec<Vec<CellValue>>) -> Self {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut grid {
            row.resize(width, CellValue::Empty);
        }
        Self {
            name: name.into(),
            grid,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dense cell matrix over the sheet's used range.
    pub fn grid(&self) -> &[Vec<CellValue>] {
        &self.grid
    }

    /// Reinterprets the sheet as a header row at `header_offset` followed by
    /// data rows. Fully blank data rows are skipped.
    pub fn row_records(&self, header_offset: usize) -> RowRecords {
        if header_offset >= self.grid.len() {
            return RowRecords {
                headers: Vec::new(),
                normalized_headers: Vec::new(),
                rows: Vec::new(),
            };
        }

        let headers: Vec<String> = self.grid[header_offset]
            .iter()
            .map(CellValue::display_text)
            .collect();
        let normalized_headers = headers
            .iter()
            .map(|h| normalize_column_name(h))
            .collect();
        let rows = self.grid[header_offset + 1..]
            .iter()
            .filter(|row| !row.iter().all(CellValue::is_blank))
            .cloned()
            .collect();

        RowRecords {
            headers,
            normalized_headers,
            rows,
        }
    }

    /// Finds the header offset in 0..=3 whose header row misses the fewest
    /// of `required`, preferring the first offset on ties and
    /// short-circuiting on a complete match. Returns the offset and the
    /// required columns still missing there.
    ///
    /// Source sheets sometimes carry a title row or two above the real
    /// header, so the offset is not guaranteed.
    pub fn resolve_header_offset(&self, required: &[&str]) -> (usize, Vec<String>) {
        let mut best: Option<(usize, Vec<String>)> = None;

        for offset in 0..=3usize {
            let records = self.row_records(offset);
            if records.rows.is_empty() {
                continue;
            }

            let missing: Vec<String> = required
                .iter()
                .filter(|col| {
                    let target = normalize_column_name(col);
                    !records.normalized_headers.contains(&target)
                })
                .map(|col| col.to_string())
                .collect();

            let better = match &best {
                Some((_, best_missing)) => missing.len() < best_missing.len(),
                None => true,
            };
            if better {
                let done = missing.is_empty();
                best = Some((offset, missing));
                if done {
                    break;
                }
            }
        }

        match best {
            Some((offset, missing)) => {
                if !missing.is_empty() {
                    debug!(
                        "sheet '{}': best header offset {} still missing {} column(s)",
                        self.name,
                        offset,
                        missing.len()
                    );
                }
                (offset, missing)
            }
            // Nothing but blank rows; nothing to report missing against.
            None => (0, Vec::new()),
        }
    }
}

impl RowRecords {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Looks up a cell in `row` by header name, matching with the same
    /// whitespace/case normalization used for offset resolution. The first
    /// matching header wins.
    pub fn column<'a>(&self, row: &'a [CellValue], target: &str) -> Option<&'a CellValue> {
        let target = normalize_column_name(target);
        self.normalized_headers
            .iter()
            .position(|h| *h == target)
            .and_then(|idx| row.get(idx))
    }
}

/// An ordered collection of named sheets, created once per report run and
/// read-only thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Decodes a spreadsheet container from an in-memory buffer. Format
    /// detection and cell typing are delegated to calamine; every sheet's
    /// used range becomes a dense [`CellValue`] matrix.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, DecodeError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        let names = workbook.sheet_names().to_vec();

        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook.worksheet_range(&name)?;
            let grid = range
                .rows()
                .map(|row| row.iter().map(convert_cell).collect())
                .collect();
            sheets.push(Sheet::new(name, grid));
        }

        debug!("decoded workbook with {} sheet(s)", sheets.len());
        Ok(Self { sheets })
    }

    /// Wraps sheets that were already decoded elsewhere.
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Looks up a sheet by name; both sides are trimmed before comparing
    /// since sheet names carry incidental whitespace.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        let target = name.trim();
        self.sheets.iter().find(|s| s.name.trim() == target)
    }

    /// Looks up the first sheet whose raw name satisfies `pred`.
    pub fn sheet_by(&self, pred: impl Fn(&str) -> bool) -> Option<&Sheet> {
        self.sheets.iter().find(|s| pred(&s.name))
    }
}

fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|ndt| CellValue::Date(ndt.date()))
            .or_else(|| normalize::excel_serial_to_date(dt.as_f64()).map(CellValue::Date))
            .unwrap_or(CellValue::Empty),
        Data::DateTimeIso(s) => normalize::parse_loose_date(s)
            .or_else(|| parse_iso_date(s))
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
