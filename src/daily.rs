use crate::error::{ErrorKind, ValidationError};
use crate::grid::{CellValue, RowRecords, Sheet, Workbook};
use crate::normalize::{parse_amount, parse_date};
use crate::schema::{CustodyRow, DailyReport, DailyTotals, ExpenseRow, LoanRow};
use chrono::NaiveDate;
use log::debug;

/// The three daily ledger sheets, matched by trimmed exact name.
pub const EXPENSES_SHEET: &str = "الخزينه";
pub const LOANS_SHEET: &str = "خزينه السلف";
pub const CUSTODY_SHEET: &str = "العهد";

const DATE_COLUMN: &str = "التاريخ";

const EXPENSE_COLUMNS: [&str; 10] = [
    "التاريخ",
    "البيان",
    "اسم الشركه المنصرف لها",
    "اسم الموظف المنصرف له",
    "القسم",
    "الفرع",
    "نوع المصروف",
    "رقم الفاتورة",
    "المنصرف",
    "ملاحظات",
];

const LOAN_COLUMNS: [&str; 9] = [
    "التاريخ",
    "اسم الموظف",
    "الكود",
    "القسم",
    "الفرع",
    "سلفه / سداد",
    "السلفه",
    "طريق السداد",
    "ملاحظات",
];

const CUSTODY_COLUMNS: [&str; 11] = [
    "التاريخ",
    "البيان",
    "المنصرف اليه",
    "القسم",
    "التصنيف",
    "نوع المصروف",
    "رقم الفاتورة / كود موظف",
    "رقم إيصال الصرف/ استلام",
    "العهدة / سداد",
    "العهدة",
    "ملاحظات",
];

// Direction-field vocabulary. Matching is substring containment, so a cell
// carrying both a disbursement and a repayment marker counts on both sides.
const LOAN_OUT_MARKERS: [&str; 2] = ["سلفه", "سلفة"];
const CUSTODY_OUT_MARKERS: [&str; 2] = ["عهدة", "العهدة"];
const REPAYMENT_MARKER: &str = "سداد";

/// The daily ledger plus any non-fatal column errors gathered on the way.
#[derive(Debug, Clone)]
pub struct DailyExtraction {
    pub report: DailyReport,
    pub errors: Vec<ValidationError>,
}

/// Extracts the three daily ledgers for `target_date`.
///
/// All three sheets must exist (trimmed-name match); otherwise the whole
/// extraction aborts with a single sheet error listing every missing name
/// and no partial ledger is returned. Missing columns are non-fatal: they
/// are reported and extraction proceeds with whatever mapped.
pub fn extract_daily_report(
    workbook: &Workbook,
    target_date: NaiveDate,
) -> Result<DailyExtraction, ValidationError> {
    let missing: Vec<String> = [EXPENSES_SHEET, LOANS_SHEET, CUSTODY_SHEET]
        .iter()
        .filter(|name| workbook.sheet(name).is_none())
        .map(|name| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ValidationError::with_details(
            ErrorKind::Sheet,
            "الصفحات التالية غير موجودة في الملف",
            missing,
        ));
    }

    let mut errors = Vec::new();

    let expenses_sheet = workbook.sheet(EXPENSES_SHEET).expect("checked above");
    let loans_sheet = workbook.sheet(LOANS_SHEET).expect("checked above");
    let custody_sheet = workbook.sheet(CUSTODY_SHEET).expect("checked above");

    let expenses = extract_rows(expenses_sheet, &EXPENSE_COLUMNS, target_date, &mut errors, |records, row, date| {
        ExpenseRow {
            date,
            description: text(records, row, "البيان"),
            company: text(records, row, "اسم الشركه المنصرف لها"),
            employee: text(records, row, "اسم الموظف المنصرف له"),
            department: text(records, row, "القسم"),
            branch: text(records, row, "الفرع"),
            expense_type: text(records, row, "نوع المصروف"),
            invoice_number: text(records, row, "رقم الفاتورة"),
            amount: amount(records, row, "المنصرف"),
            notes: text(records, row, "ملاحظات"),
        }
    });

    let loans = extract_rows(loans_sheet, &LOAN_COLUMNS, target_date, &mut errors, |records, row, date| {
        LoanRow {
            date,
            employee: text(records, row, "اسم الموظف"),
            code: text(records, row, "الكود"),
            department: text(records, row, "القسم"),
            branch: text(records, row, "الفرع"),
            direction: text(records, row, "سلفه / سداد"),
            amount: amount(records, row, "السلفه"),
            repayment_method: text(records, row, "طريق السداد"),
            notes: text(records, row, "ملاحظات"),
        }
    });

    let custody = extract_rows(custody_sheet, &CUSTODY_COLUMNS, target_date, &mut errors, |records, row, date| {
        CustodyRow {
            date,
            description: text(records, row, "البيان"),
            recipient: text(records, row, "المنصرف اليه"),
            department: text(records, row, "القسم"),
            category: text(records, row, "التصنيف"),
            expense_type: text(records, row, "نوع المصروف"),
            invoice_or_employee_code: text(records, row, "رقم الفاتورة / كود موظف"),
            receipt_number: text(records, row, "رقم إيصال الصرف/ استلام"),
            direction: text(records, row, "العهدة / سداد"),
            amount: amount(records, row, "العهدة"),
            notes: text(records, row, "ملاحظات"),
        }
    });

    let totals = compute_totals(&expenses, &loans, &custody);
    debug!(
        "daily ledger for {}: {} expense(s), {} loan(s), {} custody row(s)",
        target_date,
        expenses.len(),
        loans.len(),
        custody.len()
    );

    Ok(DailyExtraction {
        report: DailyReport {
            date: target_date,
            expenses,
            loans,
            custody,
            totals,
        },
        errors,
    })
}

/// Resolves the best header offset for `sheet`, reports residual missing
/// columns, and converts every row whose date cell resolves to exactly the
/// target date. Rows with non-matching or unparseable dates are excluded
/// silently.
fn extract_rows<T>(
    sheet: &Sheet,
    required: &[&str],
    target_date: NaiveDate,
    errors: &mut Vec<ValidationError>,
    build: impl Fn(&RowRecords, &[CellValue], NaiveDate) -> T,
) -> Vec<T> {
    let (offset, missing) = sheet.resolve_header_offset(required);
    if !missing.is_empty() {
        errors.push(ValidationError::with_details(
            ErrorKind::Column,
            format!("أعمدة مفقودة في صفحة \"{}\"", sheet.name().trim()),
            missing,
        ));
    }

    let records = sheet.row_records(offset);
    let mut rows = Vec::new();
    for row in records.rows() {
        let date = records.column(row, DATE_COLUMN).and_then(parse_date);
        if date == Some(target_date) {
            rows.push(build(&records, row, target_date));
        }
    }
    rows
}

fn text(records: &RowRecords, row: &[CellValue], column: &str) -> String {
    records
        .column(row, column)
        .map(CellValue::display_text)
        .unwrap_or_default()
}

fn amount(records: &RowRecords, row: &[CellValue], column: &str) -> f64 {
    records
        .column(row, column)
        .and_then(parse_amount)
        .unwrap_or(0.0)
}

fn compute_totals(expenses: &[ExpenseRow], loans: &[LoanRow], custody: &[CustodyRow]) -> DailyTotals {
    let expenses_total = expenses.iter().map(|r| r.amount).sum::<f64>();

    let loans_out = loans
        .iter()
        .filter(|r| LOAN_OUT_MARKERS.iter().any(|m| r.direction.contains(m)))
        .map(|r| r.amount)
        .sum::<f64>();
    let loans_in = loans
        .iter()
        .filter(|r| r.direction.contains(REPAYMENT_MARKER))
        .map(|r| r.amount)
        .sum::<f64>();

    let custody_out = custody
        .iter()
        .filter(|r| CUSTODY_OUT_MARKERS.iter().any(|m| r.direction.contains(m)))
        .map(|r| r.amount)
        .sum::<f64>();
    let custody_in = custody
        .iter()
        .filter(|r| r.direction.contains(REPAYMENT_MARKER))
        .map(|r| r.amount)
        .sum::<f64>();

    DailyTotals {
        expenses_total,
        loans_out,
        loans_in,
        custody_out,
        custody_in,
        total_out: expenses_total + loans_out + custody_out,
    }
}
