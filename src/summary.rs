use crate::error::{ErrorKind, ValidationError};
use crate::grid::{CellValue, Workbook};
use crate::locate::{
    find_cells_by_label, find_nearest_number, is_empty_row, is_total_row, locate_header_row,
    locate_header_row_candidates, HeaderTable,
};
use crate::normalize::{normalize_digits, parse_amount, parse_date, parse_loose_date};
use chrono::{Datelike, NaiveDate};
use log::debug;
use std::collections::HashSet;

use crate::schema::{
    BasicBalances, CustomerReceivableSummary, MonthlyExpenseLine, MonthlyExpenseTotals,
    MonthlyExpensesTable, ReceivableRow, ReceivablesTable, ReceivablesTotals, SummaryReport,
};

const REPORT_SHEET: &str = "report";
const REVENUE_SHEET_VARIANTS: [&str; 2] = ["الايرادات", "الإيرادات"];

const BANK_BALANCE_LABELS: [&str; 1] = ["رصيد البنك"];
const SAFE_BALANCE_LABELS: [&str; 2] = ["رصيد الخزينه", "رصيد الخزينة"];
const TOTAL_LOANS_LABELS: [&str; 1] = ["اجمالي السلف"];
const TOTAL_CUSTODY_LABELS: [&str; 1] = ["اجمالي العهد"];

const MONTHLY_SECTION_LABELS: [&str; 2] = ["المصروفات الشهريه", "المصروفات الشهرية"];
const MONTHLY_HEADERS: [&str; 3] = ["المبلغ", "المدفوع", "الباقي"];
const NOTES_HEADER: &str = "ملاحظات";
const UNNAMED_LINE: &str = "غير مسمى";

const RECEIVABLE_HEADERS: [&str; 6] = [
    "الشهر",
    "العميل",
    "المطلوب تحويله",
    "المبلغ المسدد",
    "المستحق",
    "14%",
];
const MONTH_UNKNOWN: &str = "غير محدد";

/// Rows with a receivable at or below this are treated as noise, not data.
const RECEIVABLE_THRESHOLD: f64 = 1.0;

/// Consecutive empty rows that terminate the receivables table.
const RECEIVABLE_EMPTY_RUN: usize = 3;

const ARABIC_MONTH_LABELS: [&str; 12] = [
    "يناير",
    "فبراير",
    "مارس",
    "أبريل",
    "مايو",
    "يونيو",
    "يوليو",
    "أغسطس",
    "سبتمبر",
    "أكتوبر",
    "نوفمبر",
    "ديسمبر",
];

/// The summary report plus the sheet/table errors gathered on the way.
/// `report` is `None` only when neither summary sheet exists.
#[derive(Debug, Clone)]
pub struct SummaryExtraction {
    pub report: Option<SummaryReport>,
    pub errors: Vec<ValidationError>,
}

/// Extracts the summary section: KPIs and the monthly expenses table from
/// the "report" sheet, receivables from the revenues sheet. Each missing
/// sheet is an independent error and the other sheet still extracts.
pub fn extract_summary_report(workbook: &Workbook, target_date: NaiveDate) -> SummaryExtraction {
    let mut errors = Vec::new();
    let mut report = SummaryReport::default();

    let report_sheet = workbook.sheet_by(|name| name.trim().to_lowercase() == REPORT_SHEET);
    let revenue_sheet = workbook.sheet_by(|name| {
        let normalized = name.trim().to_lowercase();
        REVENUE_SHEET_VARIANTS.contains(&normalized.as_str())
    });

    match report_sheet {
        None => errors.push(ValidationError::new(
            ErrorKind::Sheet,
            "شيت report غير موجود",
        )),
        Some(sheet) => {
            let matrix = sheet.grid();

            report.report_date = detect_report_date(matrix);
            report.date_warning = report
                .report_date
                .map(|found| found != target_date)
                .unwrap_or(false);

            report.kpis = BasicBalances {
                bank_balance: extract_kpi(matrix, &BANK_BALANCE_LABELS),
                safe_balance: extract_kpi(matrix, &SAFE_BALANCE_LABELS),
                total_loans: extract_kpi(matrix, &TOTAL_LOANS_LABELS),
                total_custody: extract_kpi(matrix, &TOTAL_CUSTODY_LABELS),
            };

            let (monthly, mut monthly_errors) = extract_monthly_expenses(matrix);
            report.monthly_expenses = monthly;
            errors.append(&mut monthly_errors);
        }
    }

    match revenue_sheet {
        None => errors.push(ValidationError::new(
            ErrorKind::Sheet,
            "شيت الإيرادات غير موجود",
        )),
        Some(sheet) => {
            debug!("receivables: using sheet '{}'", sheet.name().trim());
            let (receivables, mut receivable_errors) = extract_receivables(sheet.grid());
            report.receivables = receivables;
            errors.append(&mut receivable_errors);
        }
    }

    let report = if report_sheet.is_none() && revenue_sheet.is_none() {
        None
    } else {
        Some(report)
    };

    SummaryExtraction { report, errors }
}

/// First cell in the top-left 20×20 block that parses as a date, scanning
/// row-major.
fn detect_report_date(matrix: &[Vec<CellValue>]) -> Option<NaiveDate> {
    let max_rows = matrix.len().min(20);
    for row in &matrix[..max_rows] {
        let max_cols = row.len().min(20);
        for cell in &row[..max_cols] {
            if let Some(date) = parse_date(cell) {
                return Some(date);
            }
        }
    }
    None
}

/// First nearest-number hit across every label match, in match order.
fn extract_kpi(matrix: &[Vec<CellValue>], label_variants: &[&str]) -> Option<f64> {
    find_cells_by_label(matrix, label_variants)
        .into_iter()
        .find_map(|(r, c)| find_nearest_number(matrix, r, c, 3))
}

fn extract_monthly_expenses(
    matrix: &[Vec<CellValue>],
) -> (MonthlyExpensesTable, Vec<ValidationError>) {
    let start_row = find_cells_by_label(matrix, &MONTHLY_SECTION_LABELS)
        .first()
        .map(|(r, _)| *r)
        .unwrap_or(0);

    let Some(table) = locate_header_row(matrix, &MONTHLY_HEADERS, start_row) else {
        let missing: Vec<String> = MONTHLY_HEADERS.iter().map(|h| h.to_string()).collect();
        let error = ValidationError::with_details(
            ErrorKind::Table,
            "تعذر العثور على عناوين جدول المصروفات الشهرية",
            missing.clone(),
        );
        return (
            MonthlyExpensesTable {
                missing_headers: missing,
                ..MonthlyExpensesTable::default()
            },
            vec![error],
        );
    };

    // The notes column is optional and matched by exact trimmed text, then
    // excluded (with the mapped columns) from the name-cell search.
    let header_row = &matrix[table.header_row];
    let notes_col = header_row
        .iter()
        .position(|cell| matches!(cell, CellValue::Text(s) if s.trim() == NOTES_HEADER));

    let mut used_columns: HashSet<usize> = table.columns.values().copied().collect();
    if let Some(idx) = notes_col {
        used_columns.insert(idx);
    }

    let mut lines = Vec::new();
    for row in table.data_rows {
        if is_empty_row(row) || is_total_row(row) {
            break;
        }

        let name = name_cell(row, &used_columns);
        let amount = table.cell(row, "المبلغ").and_then(parse_amount).unwrap_or(0.0);
        let paid = table.cell(row, "المدفوع").and_then(parse_amount).unwrap_or(0.0);
        let remaining = table.cell(row, "الباقي").and_then(parse_amount).unwrap_or(0.0);
        let notes = notes_col
            .and_then(|idx| row.get(idx))
            .map(|cell| cell.display_text().trim().to_string())
            .unwrap_or_default();

        // A row survives if any single field is non-trivial.
        if !name.is_empty() || amount != 0.0 || paid != 0.0 || remaining != 0.0 || !notes.is_empty()
        {
            lines.push(MonthlyExpenseLine {
                name: if name.is_empty() {
                    UNNAMED_LINE.to_string()
                } else {
                    name
                },
                amount,
                paid,
                remaining,
                notes,
            });
        }
    }

    let totals = lines.iter().fold(MonthlyExpenseTotals::default(), |mut acc, line| {
        acc.amount += line.amount;
        acc.paid += line.paid;
        acc.remaining += line.remaining;
        acc
    });

    (
        MonthlyExpensesTable {
            lines,
            totals,
            missing_headers: Vec::new(),
            found: true,
        },
        Vec::new(),
    )
}

/// Leftmost non-blank text cell outside the excluded columns, trimmed.
fn name_cell(row: &[CellValue], excluded: &HashSet<usize>) -> String {
    for (idx, cell) in row.iter().enumerate() {
        if excluded.contains(&idx) {
            continue;
        }
        if let CellValue::Text(s) = cell {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    String::new()
}

fn extract_receivables(matrix: &[Vec<CellValue>]) -> (ReceivablesTable, Vec<ValidationError>) {
    let candidates = locate_header_row_candidates(matrix, &RECEIVABLE_HEADERS, &[2, 0]);
    debug!("receivables: {} header candidate(s)", candidates.len());

    if candidates.is_empty() {
        let missing: Vec<String> = RECEIVABLE_HEADERS.iter().map(|h| h.to_string()).collect();
        let error = ValidationError::with_details(
            ErrorKind::Table,
            "تعذر العثور على جدول الإيرادات والمستحقات",
            missing.clone(),
        );
        return (
            ReceivablesTable {
                missing_headers: missing,
                ..ReceivablesTable::default()
            },
            vec![error],
        );
    }

    // Parse every candidate independently and keep the interpretation that
    // yields the most rows; a decoy header-like row elsewhere in the sheet
    // produces fewer usable rows. First candidate wins ties.
    let parsed: Vec<(&HeaderTable, Vec<ReceivableRow>)> = candidates
        .iter()
        .map(|candidate| (candidate, parse_receivable_rows(candidate)))
        .collect();
    let (best_header, rows) = parsed
        .into_iter()
        .reduce(|best, curr| if curr.1.len() > best.1.len() { curr } else { best })
        .expect("candidates is non-empty");
    debug!(
        "receivables: chose header row {} with {} row(s)",
        best_header.header_row,
        rows.len()
    );

    let totals = rows.iter().fold(ReceivablesTotals::default(), |mut acc, row| {
        acc.receivables_total += row.receivable;
        acc.to_transfer_total += row.to_transfer;
        acc.paid_total += row.paid;
        acc.tax14_total += row.tax14;
        acc
    });

    let customer_summary = summarize_customers(&rows);

    (
        ReceivablesTable {
            rows,
            totals,
            customer_summary,
            missing_headers: Vec::new(),
            found: true,
        },
        Vec::new(),
    )
}

fn parse_receivable_rows(table: &HeaderTable) -> Vec<ReceivableRow> {
    let mut rows = Vec::new();
    let mut consecutive_empty = 0usize;

    for row in table.data_rows {
        if is_empty_row(row) {
            consecutive_empty += 1;
            if consecutive_empty >= RECEIVABLE_EMPTY_RUN {
                break;
            }
            continue;
        }
        consecutive_empty = 0;

        if is_total_row(row) {
            break;
        }

        let receivable = table.cell(row, "المستحق").and_then(parse_amount).unwrap_or(0.0);
        if receivable <= RECEIVABLE_THRESHOLD {
            continue;
        }

        let to_transfer = table
            .cell(row, "المطلوب تحويله")
            .and_then(parse_amount)
            .unwrap_or(0.0);
        let paid = table
            .cell(row, "المبلغ المسدد")
            .and_then(parse_amount)
            .unwrap_or(0.0);
        let tax14 = table.cell(row, "14%").and_then(parse_amount).unwrap_or(0.0);
        let customer = table
            .cell(row, "العميل")
            .map(|cell| cell.display_text().trim().to_string())
            .unwrap_or_default();
        let month = table
            .cell(row, "الشهر")
            .map(interpret_month_cell)
            .unwrap_or_else(unknown_month);

        rows.push(ReceivableRow {
            month_label: month.label,
            month_key: month.key,
            year: month.year,
            month_number: month.month_number,
            customer,
            to_transfer,
            paid,
            receivable,
            tax14,
        });
    }

    rows
}

/// Per-customer receivable sums, descending; stable sort keeps ties in
/// first-appearance order.
fn summarize_customers(rows: &[ReceivableRow]) -> Vec<CustomerReceivableSummary> {
    let mut summary: Vec<CustomerReceivableSummary> = Vec::new();
    for row in rows {
        match summary.iter_mut().find(|s| s.customer == row.customer) {
            Some(entry) => entry.receivable += row.receivable,
            None => summary.push(CustomerReceivableSummary {
                customer: row.customer.clone(),
                receivable: row.receivable,
            }),
        }
    }
    summary.sort_by(|a, b| {
        b.receivable
            .partial_cmp(&a.receivable)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summary
}

struct MonthInfo {
    label: String,
    key: String,
    year: Option<i32>,
    month_number: Option<u32>,
}

fn unknown_month() -> MonthInfo {
    MonthInfo {
        label: MONTH_UNKNOWN.to_string(),
        key: MONTH_UNKNOWN.to_string(),
        year: None,
        month_number: None,
    }
}

fn month_with_year(month: u32, year: i32) -> MonthInfo {
    MonthInfo {
        label: ARABIC_MONTH_LABELS[(month - 1) as usize].to_string(),
        key: format!("{}-{:02}", year, month),
        year: Some(year),
        month_number: Some(month),
    }
}

/// Interprets a receivables month cell: a month-name token with optional
/// year, then a structured date, then a lenient free-text date, and finally
/// the raw trimmed text as both label and sort key.
fn interpret_month_cell(cell: &CellValue) -> MonthInfo {
    if let Some(info) = parse_month_token(&cell.display_text()) {
        return info;
    }

    if let Some(date) = parse_date(cell) {
        return month_with_year(date.month(), date.year());
    }

    if let CellValue::Text(s) = cell {
        if let Some(date) = parse_loose_date(s) {
            return month_with_year(date.month(), date.year());
        }
    }

    let fallback = cell.display_text().trim().to_string();
    if fallback.is_empty() {
        unknown_month()
    } else {
        MonthInfo {
            key: fallback.clone(),
            label: fallback,
            year: None,
            month_number: None,
        }
    }
}

// Longest spelling first per month so the remainder check sees the full
// token before its abbreviation.
const ENGLISH_MONTHS: [(&str, u32); 24] = [
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

// Keys are pre-normalized: lowercased with hamza-seated alefs flattened to
// the bare alef, so both إ/أ/آ spellings match.
const ARABIC_MONTHS: [(&str, u32); 14] = [
    ("يناير", 1),
    ("فبراير", 2),
    ("مارس", 3),
    ("ابريل", 4),
    ("مايو", 5),
    ("يونيو", 6),
    ("يونيه", 6),
    ("يوليو", 7),
    ("يوليه", 7),
    ("اغسطس", 8),
    ("سبتمبر", 9),
    ("اكتوبر", 10),
    ("نوفمبر", 11),
    ("ديسمبر", 12),
];

fn is_month_separator(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == '/'
}

/// Two-digit years fold into 1900s/2000s around 50; longer years pass
/// through.
fn normalize_year(digits: &str) -> Option<i32> {
    let year: i32 = digits.parse().ok()?;
    if digits.len() == 2 {
        Some(if year >= 50 { 1900 + year } else { 2000 + year })
    } else {
        Some(year)
    }
}

fn parse_month_token(raw: &str) -> Option<MonthInfo> {
    let normalized = normalize_digits(raw);
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();

    // English month names require a year after at least one separator.
    for (name, month) in ENGLISH_MONTHS {
        if let Some(rest) = lower.strip_prefix(name) {
            let year_part = rest.trim_start_matches(is_month_separator);
            let has_separator = !rest.is_empty() && rest.len() != year_part.len();
            if has_separator
                && (2..=4).contains(&year_part.len())
                && year_part.chars().all(|c| c.is_ascii_digit())
            {
                if let Some(year) = normalize_year(year_part) {
                    return Some(month_with_year(month, year));
                }
            }
        }
    }

    // Arabic month names, year optional.
    let flattened: String = lower
        .chars()
        .map(|c| match c {
            'إ' | 'أ' | 'آ' => 'ا',
            other => other,
        })
        .collect();
    let mut parts = flattened.split(is_month_separator).filter(|p| !p.is_empty());
    let first = parts.next()?;
    let month = ARABIC_MONTHS
        .iter()
        .find(|(name, _)| *name == first)
        .map(|(_, number)| *number)?;

    if let Some(year_part) = parts.next() {
        if (2..=4).contains(&year_part.len()) && year_part.chars().all(|c| c.is_ascii_digit()) {
            if let Some(year) = normalize_year(year_part) {
                return Some(month_with_year(month, year));
            }
        }
    }

    let label = ARABIC_MONTH_LABELS[(month - 1) as usize].to_string();
    Some(MonthInfo {
        key: label.clone(),
        label,
        year: None,
        month_number: Some(month),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Sheet;

    fn t(s: &str) -> CellValue {
        CellValue::from(s)
    }

    fn n(v: f64) -> CellValue {
        CellValue::from(v)
    }

    fn e() -> CellValue {
        CellValue::Empty
    }

    fn target() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn report_sheet() -> Sheet {
        Sheet::new(
            "Report",
            vec![
                vec![t("تقرير يومي"), t("2024-01-05")],
                vec![t("رصيد البنك"), n(250000.0)],
                vec![t("رصيد الخزينة"), n(18000.0)],
                vec![t("اجمالي السلف"), n(7000.0)],
                vec![t("اجمالي العهد"), n(3500.0)],
                vec![e()],
                vec![t("المصروفات الشهرية")],
                vec![t("البند"), t("المبلغ"), t("المدفوع"), t("الباقي"), t("ملاحظات")],
                vec![t("إيجار"), n(12000.0), n(12000.0), n(0.0), e()],
                vec![t("كهرباء"), n(3000.0), n(1000.0), n(2000.0), t("متبقي فاتورة")],
                vec![t("اجمالي"), n(15000.0), n(13000.0), n(2000.0), e()],
            ],
        )
    }

    fn revenue_sheet() -> Sheet {
        Sheet::new(
            "الايرادات",
            vec![
                vec![t("جدول الشهور")],
                vec![e()],
                vec![
                    t("الشهر"),
                    t("العميل"),
                    t("المطلوب تحويله"),
                    t("المبلغ المسدد"),
                    t("المستحق"),
                    t("14%"),
                ],
                vec![t("يناير 2024"), t("شركة ألف"), n(1000.0), n(400.0), n(600.0), n(84.0)],
                vec![t("فبراير 2024"), t("شركة باء"), n(2000.0), n(1100.0), n(900.0), n(126.0)],
                vec![e()],
                vec![t("فبراير 2024"), t("شركة جيم"), n(1500.0), n(600.0), n(900.0), n(126.0)],
                vec![t("مارس 2024"), t("شركة ألف"), n(500.0), n(499.0), n(1.0), n(0.14)],
                vec![t("الإجمالي"), e(), n(5000.0), n(2599.0), n(2401.0), n(336.14)],
            ],
        )
    }

    #[test]
    fn test_full_summary_extraction() {
        let workbook = Workbook::from_sheets(vec![report_sheet(), revenue_sheet()]);
        let extraction = extract_summary_report(&workbook, target());
        assert!(extraction.errors.is_empty());

        let report = extraction.report.unwrap();
        assert_eq!(report.report_date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert!(!report.date_warning);

        assert_eq!(report.kpis.bank_balance, Some(250000.0));
        assert_eq!(report.kpis.safe_balance, Some(18000.0));
        assert_eq!(report.kpis.total_loans, Some(7000.0));
        assert_eq!(report.kpis.total_custody, Some(3500.0));

        let monthly = &report.monthly_expenses;
        assert!(monthly.found);
        assert_eq!(monthly.lines.len(), 2);
        assert_eq!(monthly.totals.amount, 15000.0);
        assert_eq!(monthly.totals.remaining, 2000.0);

        let receivables = &report.receivables;
        assert!(receivables.found);
        assert_eq!(receivables.rows.len(), 3);
        assert_eq!(receivables.totals.receivables_total, 2400.0);
    }

    #[test]
    fn test_date_warning_on_mismatch() {
        let workbook = Workbook::from_sheets(vec![report_sheet(), revenue_sheet()]);
        let other_day = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let extraction = extract_summary_report(&workbook, other_day);
        assert!(extraction.report.unwrap().date_warning);
    }

    #[test]
    fn test_each_missing_sheet_is_an_independent_error() {
        let workbook = Workbook::from_sheets(vec![revenue_sheet()]);
        let extraction = extract_summary_report(&workbook, target());
        assert_eq!(extraction.errors.len(), 1);
        assert_eq!(extraction.errors[0].kind, ErrorKind::Sheet);

        // The revenues sheet still extracted.
        let report = extraction.report.unwrap();
        assert!(report.receivables.found);
        assert!(!report.monthly_expenses.found);
    }

    #[test]
    fn test_both_sheets_missing_yields_no_summary() {
        let workbook = Workbook::from_sheets(vec![Sheet::new("أخرى", vec![])]);
        let extraction = extract_summary_report(&workbook, target());
        assert!(extraction.report.is_none());
        assert_eq!(extraction.errors.len(), 2);
    }

    #[test]
    fn test_monthly_expense_row_rules() {
        let sheet = Sheet::new(
            "report",
            vec![
                vec![t("المصروفات الشهريه")],
                vec![t("البند"), t("المبلغ"), t("المدفوع"), t("الباقي"), t("ملاحظات")],
                // All-trivial row: dropped.
                vec![e(), n(0.0), n(0.0), n(0.0), t(" ")],
                // Only notes non-trivial: kept, name defaulted.
                vec![e(), n(0.0), n(0.0), n(0.0), t("تحت التسوية")],
                vec![t("مياه"), n(700.0), n(700.0), n(0.0), e()],
            ],
        );
        let (table, errors) = extract_monthly_expenses(sheet.grid());
        assert!(errors.is_empty());
        assert_eq!(table.lines.len(), 2);
        assert_eq!(table.lines[0].name, UNNAMED_LINE);
        assert_eq!(table.lines[0].notes, "تحت التسوية");
        assert_eq!(table.lines[1].name, "مياه");
    }

    #[test]
    fn test_monthly_expenses_header_missing_reports_table_error() {
        let sheet = Sheet::new("report", vec![vec![t("رصيد البنك"), n(5.0)]]);
        let (table, errors) = extract_monthly_expenses(sheet.grid());
        assert!(!table.found);
        assert_eq!(table.missing_headers.len(), 3);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Table);
    }

    #[test]
    fn test_receivable_threshold_is_strict() {
        let matrix = vec![
            RECEIVABLE_HEADERS.iter().map(|h| t(h)).collect::<Vec<_>>(),
            vec![t("يناير 24"), t("أ"), n(10.0), n(9.0), n(1.0), n(0.0)],
            vec![t("يناير 24"), t("ب"), n(10.0), n(9.0), n(1.01), n(0.0)],
        ];
        let (table, _) = extract_receivables(&matrix);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].customer, "ب");
        assert_eq!(table.rows[0].receivable, 1.01);
    }

    #[test]
    fn test_three_blank_rows_terminate_receivables() {
        let matrix = vec![
            RECEIVABLE_HEADERS.iter().map(|h| t(h)).collect::<Vec<_>>(),
            vec![t("يناير 24"), t("أ"), n(0.0), n(0.0), n(100.0), n(0.0)],
            vec![e()],
            vec![e()],
            vec![e()],
            // Valid row after the gap: must not be reached.
            vec![t("فبراير 24"), t("ب"), n(0.0), n(0.0), n(200.0), n(0.0)],
        ];
        let (table, _) = extract_receivables(&matrix);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_single_blank_rows_are_skipped_and_counter_resets() {
        let matrix = vec![
            RECEIVABLE_HEADERS.iter().map(|h| t(h)).collect::<Vec<_>>(),
            vec![t("يناير 24"), t("أ"), n(0.0), n(0.0), n(100.0), n(0.0)],
            vec![e()],
            vec![e()],
            vec![t("فبراير 24"), t("ب"), n(0.0), n(0.0), n(200.0), n(0.0)],
            vec![e()],
            vec![e()],
            vec![t("مارس 24"), t("ج"), n(0.0), n(0.0), n(300.0), n(0.0)],
        ];
        let (table, _) = extract_receivables(&matrix);
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_total_row_terminates_immediately() {
        let matrix = vec![
            RECEIVABLE_HEADERS.iter().map(|h| t(h)).collect::<Vec<_>>(),
            vec![t("يناير 24"), t("أ"), n(0.0), n(0.0), n(100.0), n(0.0)],
            vec![t("Total"), e(), e(), e(), n(100.0), e()],
            vec![t("فبراير 24"), t("ب"), n(0.0), n(0.0), n(200.0), n(0.0)],
        ];
        let (table, _) = extract_receivables(&matrix);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_decoy_header_loses_to_richer_candidate() {
        // A header-shaped row at the top with no usable data under it, and
        // the real table further down with two rows: candidate scoring must
        // pick the real one.
        let header: Vec<CellValue> = RECEIVABLE_HEADERS.iter().map(|h| t(h)).collect();
        let mut matrix = vec![header.clone()];
        matrix.push(vec![e()]);
        matrix.push(vec![e()]);
        matrix.push(vec![e()]);
        matrix.push(header);
        matrix.push(vec![t("يناير 24"), t("أ"), n(0.0), n(0.0), n(100.0), n(0.0)]);
        matrix.push(vec![t("فبراير 24"), t("ب"), n(0.0), n(0.0), n(200.0), n(0.0)]);

        let (table, _) = extract_receivables(&matrix);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_customer_summary_orders_descending_with_stable_ties() {
        let matrix = vec![
            RECEIVABLE_HEADERS.iter().map(|h| t(h)).collect::<Vec<_>>(),
            vec![t("يناير 24"), t("A"), n(0.0), n(0.0), n(300.0), n(0.0)],
            vec![t("يناير 24"), t("B"), n(0.0), n(0.0), n(500.0), n(0.0)],
            vec![t("فبراير 24"), t("C"), n(0.0), n(0.0), n(900.0), n(0.0)],
            vec![t("فبراير 24"), t("B"), n(0.0), n(0.0), n(400.0), n(0.0)],
        ];
        let (table, _) = extract_receivables(&matrix);
        let order: Vec<&str> = table
            .customer_summary
            .iter()
            .map(|s| s.customer.as_str())
            .collect();
        // B and C both sum to 900; B appeared first.
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_month_token_english_and_arabic() {
        let info = parse_month_token("Jan 24").unwrap();
        assert_eq!(info.month_number, Some(1));
        assert_eq!(info.year, Some(2024));
        assert_eq!(info.key, "2024-01");
        assert_eq!(info.label, "يناير");

        let info = parse_month_token("september-1999").unwrap();
        assert_eq!(info.key, "1999-09");

        let info = parse_month_token("أبريل 2024").unwrap();
        assert_eq!(info.month_number, Some(4));
        assert_eq!(info.label, "أبريل");

        // Hamza variant spelling of the same month.
        let info = parse_month_token("ابريل 2024").unwrap();
        assert_eq!(info.month_number, Some(4));

        // Year-less Arabic month keeps the label as its key.
        let info = parse_month_token("مايو").unwrap();
        assert_eq!(info.year, None);
        assert_eq!(info.key, "مايو");

        assert!(parse_month_token("jan").is_none());
        assert!(parse_month_token("ليس شهرا").is_none());
    }

    #[test]
    fn test_two_digit_year_windowing() {
        assert_eq!(parse_month_token("may 49").unwrap().year, Some(2049));
        assert_eq!(parse_month_token("may 50").unwrap().year, Some(1950));
    }

    #[test]
    fn test_month_cell_fallbacks() {
        // Structured date cell.
        let info = interpret_month_cell(&CellValue::Date(
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        ));
        assert_eq!(info.key, "2024-04");
        assert_eq!(info.label, "أبريل");

        // Excel serial.
        let info = interpret_month_cell(&n(45292.0));
        assert_eq!(info.key, "2024-01");

        // Free-text datetime.
        let info = interpret_month_cell(&t("2024-04-01T00:00:00"));
        assert_eq!(info.key, "2024-04");

        // Unintelligible text falls back to the raw trimmed value.
        let info = interpret_month_cell(&t(" شهر الافتتاح "));
        assert_eq!(info.label, "شهر الافتتاح");
        assert_eq!(info.key, "شهر الافتتاح");
        assert_eq!(info.year, None);

        // Blank cell.
        let info = interpret_month_cell(&e());
        assert_eq!(info.label, MONTH_UNKNOWN);
    }

    #[test]
    fn test_kpi_absent_when_label_or_number_missing() {
        let sheet = Sheet::new(
            "report",
            vec![
                vec![t("رصيد البنك"), t("غير متاح"), t("نص"), t("نص")],
                vec![t("نص"), t("نص"), t("نص"), t("نص")],
            ],
        );
        assert_eq!(extract_kpi(sheet.grid(), &BANK_BALANCE_LABELS), None);
        assert_eq!(extract_kpi(sheet.grid(), &TOTAL_LOANS_LABELS), None);
    }
}
