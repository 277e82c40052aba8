use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where in the extraction pipeline a validation error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The input buffer could not be decoded as a workbook. Fatal: no data
    /// is returned for the run.
    File,
    /// A required sheet is absent. Fatal for the three daily ledger sheets
    /// as a group; independently recoverable for the report/revenue sheets.
    Sheet,
    /// A required column is missing even after the best-effort header offset
    /// search. Extraction continues with whatever columns mapped.
    Column,
    /// A required header row could not be located inside an existing sheet.
    /// The affected sub-table is marked not-found with an empty data set.
    Table,
}

/// A recoverable validation problem surfaced to the user.
///
/// Errors are accumulated into a list and returned alongside whatever data
/// was still extractable; they are never propagated with `?` past the
/// top-level call. Messages are user-facing Arabic; `details` carries the
/// names involved (missing sheets, missing columns).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(
        kind: ErrorKind,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            details,
        }
    }
}

/// Failure at the workbook decoding boundary.
#[derive(Debug, Error)]
#[error("failed to decode workbook: {0}")]
pub struct DecodeError(#[from] pub calamine::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_uses_message() {
        let err = ValidationError::with_details(
            ErrorKind::Sheet,
            "الصفحات التالية غير موجودة في الملف",
            vec!["العهد".to_string()],
        );
        assert_eq!(err.to_string(), "الصفحات التالية غير موجودة في الملف");
        assert_eq!(err.details, vec!["العهد"]);
    }

    #[test]
    fn test_error_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ErrorKind::Column).unwrap();
        assert_eq!(json, "\"column\"");
    }
}
