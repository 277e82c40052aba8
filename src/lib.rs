//! # Treasury Report Builder
//!
//! A library for extracting normalized, validated daily treasury reports
//! from semi-structured Arabic Excel workbooks.
//!
//! The input workbooks are real operational files, not clean schemas:
//! header rows drift by a few offsets under title rows, labels appear in
//! near-duplicate spellings, numeric cells mix Arabic-Indic and ASCII
//! digits, and some tables are found by scanning for a label and taking the
//! nearest numeric neighbor. The pipeline here is built around that:
//!
//! - **Normalization** ([`normalize`]): digit/locale normalization, amount
//!   and date coercion into canonical typed values.
//! - **Grid access** ([`grid`]): a decoded workbook as dense cell matrices,
//!   plus header-keyed row records with best-effort header offset search.
//! - **Table location** ([`locate`]): label search, nearest-number lookup,
//!   and header-row discovery with candidate scoring.
//! - **Extraction** ([`daily`], [`summary`]): the three daily ledgers
//!   filtered to a target date with totals, and the summary sheet's KPIs,
//!   monthly expenses, and receivables.
//!
//! Validation problems are accumulated as [`ValidationError`] values and
//! returned alongside whatever data was still extractable; the library
//! always prefers degraded output over no output.
//!
//! ## Example
//!
//! ```rust,ignore
//! use treasury_report_builder::build_report;
//! use chrono::NaiveDate;
//!
//! let buffer = std::fs::read("daily.xlsx")?;
//! let target = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
//! let outcome = build_report(&buffer, target);
//!
//! if let Some(bundle) = outcome.data {
//!     println!("total out: {}", bundle.daily.totals.total_out);
//! }
//! for error in &outcome.errors {
//!     eprintln!("{}", error);
//! }
//! ```

pub mod daily;
pub mod error;
pub mod grid;
pub mod locate;
pub mod normalize;
pub mod schema;
pub mod summary;

pub use daily::{extract_daily_report, DailyExtraction};
pub use error::{DecodeError, ErrorKind, ValidationError};
pub use grid::{CellValue, RowRecords, Sheet, Workbook};
pub use normalize::*;
pub use schema::*;
pub use summary::{extract_summary_report, SummaryExtraction};

use chrono::NaiveDate;
use log::{info, warn};

/// User-facing message for an undecodable input buffer.
const FILE_ERROR_MESSAGE: &str =
    "فشل في قراءة الملف. تأكد من أن الملف بصيغة Excel صحيحة (.xlsx)";

pub struct ReportBuilder;

impl ReportBuilder {
    /// Decodes `buffer` and builds the report for `target_date`.
    ///
    /// Decode failure yields a single `file` error and no data. A missing
    /// daily sheet yields a single `sheet` error and no data. Otherwise the
    /// daily and summary extractions both run and their errors concatenate,
    /// daily first.
    pub fn build(buffer: &[u8], target_date: NaiveDate) -> ReportOutcome {
        let workbook = match Workbook::from_bytes(buffer) {
            Ok(workbook) => workbook,
            Err(err) => {
                warn!("workbook decode failed: {}", err);
                return ReportOutcome {
                    data: None,
                    errors: vec![ValidationError::new(ErrorKind::File, FILE_ERROR_MESSAGE)],
                };
            }
        };

        Self::build_from_workbook(&workbook, target_date)
    }

    /// Builds the report from an already-decoded workbook.
    pub fn build_from_workbook(workbook: &Workbook, target_date: NaiveDate) -> ReportOutcome {
        info!("building treasury report for {}", target_date);

        let mut errors = Vec::new();

        let daily = match daily::extract_daily_report(workbook, target_date) {
            Ok(extraction) => {
                errors.extend(extraction.errors);
                extraction.report
            }
            Err(sheet_error) => {
                return ReportOutcome {
                    data: None,
                    errors: vec![sheet_error],
                };
            }
        };

        let summary = summary::extract_summary_report(workbook, target_date);
        errors.extend(summary.errors);

        ReportOutcome {
            data: Some(ReportBundle {
                daily,
                summary: summary.report,
            }),
            errors,
        }
    }
}

/// Convenience wrapper over [`ReportBuilder::build`].
pub fn build_report(buffer: &[u8], target_date: NaiveDate) -> ReportOutcome {
    ReportBuilder::build(buffer, target_date)
}

/// Convenience wrapper over [`ReportBuilder::build_from_workbook`].
pub fn build_report_from_workbook(workbook: &Workbook, target_date: NaiveDate) -> ReportOutcome {
    ReportBuilder::build_from_workbook(workbook, target_date)
}
