use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single expense paid out of the main till on the target day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub date: NaiveDate,
    /// البيان: free-text description of the expense.
    pub description: String,
    /// اسم الشركه المنصرف لها
    pub company: String,
    /// اسم الموظف المنصرف له
    pub employee: String,
    /// القسم
    pub department: String,
    /// الفرع
    pub branch: String,
    /// نوع المصروف
    pub expense_type: String,
    /// رقم الفاتورة
    pub invoice_number: String,
    /// المنصرف: the amount paid out. Defaults to 0 when unparseable.
    pub amount: f64,
    /// ملاحظات
    pub notes: String,
}

/// An employee loan movement (disbursement or repayment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRow {
    pub date: NaiveDate,
    /// اسم الموظف
    pub employee: String,
    /// الكود
    pub code: String,
    /// القسم
    pub department: String,
    /// الفرع
    pub branch: String,
    /// سلفه / سداد: free-text direction field distinguishing a
    /// disbursement from a repayment.
    pub direction: String,
    /// السلفه: the loan amount. Defaults to 0 when unparseable.
    pub amount: f64,
    /// طريق السداد
    pub repayment_method: String,
    /// ملاحظات
    pub notes: String,
}

/// A custody/float advance movement (hand-out or settlement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustodyRow {
    pub date: NaiveDate,
    /// البيان
    pub description: String,
    /// المنصرف اليه
    pub recipient: String,
    /// القسم
    pub department: String,
    /// التصنيف
    pub category: String,
    /// نوع المصروف
    pub expense_type: String,
    /// رقم الفاتورة / كود موظف
    pub invoice_or_employee_code: String,
    /// رقم إيصال الصرف/ استلام
    pub receipt_number: String,
    /// العهدة / سداد: free-text direction field.
    pub direction: String,
    /// العهدة: the custody amount. Defaults to 0 when unparseable.
    pub amount: f64,
    /// ملاحظات
    pub notes: String,
}

/// Aggregates over one day's ledger rows, recomputed fully per extraction.
///
/// Direction matching is substring containment over free text, so a
/// degenerate cell containing both the disbursement and repayment markers
/// counts on both sides. That ambiguity is inherited from the source data
/// and is deliberately not deduplicated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyTotals {
    pub expenses_total: f64,
    pub loans_out: f64,
    pub loans_in: f64,
    pub custody_out: f64,
    pub custody_in: f64,
    /// expenses_total + loans_out + custody_out
    pub total_out: f64,
}

/// The daily ledger section of the report: all rows matching the target
/// date across the three daily sheets, plus their totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub expenses: Vec<ExpenseRow>,
    pub loans: Vec<LoanRow>,
    pub custody: Vec<CustodyRow>,
    pub totals: DailyTotals,
}

/// The four top-level balances of the summary sheet, each independently
/// resolvable or absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BasicBalances {
    pub bank_balance: Option<f64>,
    pub safe_balance: Option<f64>,
    pub total_loans: Option<f64>,
    pub total_custody: Option<f64>,
}

/// One named line of the monthly expenses table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyExpenseLine {
    pub name: String,
    pub amount: f64,
    pub paid: f64,
    pub remaining: f64,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyExpenseTotals {
    pub amount: f64,
    pub paid: f64,
    pub remaining: f64,
}

/// The monthly expenses table. `found` distinguishes "table absent or
/// unparseable" from "table present but empty".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyExpensesTable {
    pub lines: Vec<MonthlyExpenseLine>,
    pub totals: MonthlyExpenseTotals,
    pub missing_headers: Vec<String>,
    pub found: bool,
}

/// One per-customer-per-month receivable entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivableRow {
    /// Human-readable month label (Arabic month name, or the raw cell text
    /// when the month could not be interpreted).
    pub month_label: String,
    /// Sortable month key, "YYYY-MM" when the month resolved.
    pub month_key: String,
    pub year: Option<i32>,
    pub month_number: Option<u32>,
    pub customer: String,
    /// المطلوب تحويله
    pub to_transfer: f64,
    /// المبلغ المسدد
    pub paid: f64,
    /// المستحق
    pub receivable: f64,
    /// The 14% tax column.
    pub tax14: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReceivablesTotals {
    pub receivables_total: f64,
    pub to_transfer_total: f64,
    pub paid_total: f64,
    pub tax14_total: f64,
}

/// Receivable sum for one customer, used in the descending summary list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerReceivableSummary {
    pub customer: String,
    pub receivable: f64,
}

/// The receivables table extracted from the revenues sheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReceivablesTable {
    pub rows: Vec<ReceivableRow>,
    pub totals: ReceivablesTotals,
    /// Per-customer receivable sums, descending, ties in first-appearance
    /// order.
    pub customer_summary: Vec<CustomerReceivableSummary>,
    pub missing_headers: Vec<String>,
    pub found: bool,
}

/// Everything extracted from the "report" and revenues sheets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryReport {
    /// First date found in the top-left block of the report sheet.
    pub report_date: Option<NaiveDate>,
    /// True only when a report date was found and differs from the target.
    pub date_warning: bool,
    pub kpis: BasicBalances,
    pub monthly_expenses: MonthlyExpensesTable,
    pub receivables: ReceivablesTable,
}

/// The full report for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub daily: DailyReport,
    /// Absent when neither the "report" sheet nor the revenues sheet exists.
    pub summary: Option<SummaryReport>,
}

/// Top-level outcome: the bundle (when extraction got that far) plus every
/// accumulated validation error, in the order they were produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub data: Option<ReportBundle>,
    pub errors: Vec<ValidationError>,
}
