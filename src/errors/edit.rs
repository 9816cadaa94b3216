//! Errors raised while staging a cell edit

use thiserror::Error;

/// A staged edit the column configuration does not allow
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    /// No column with this logical field name
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    /// The column exists but is not editable
    #[error("Field '{0}' is read-only")]
    ReadOnlyField(String),

    /// The row id is not part of the loaded record set
    #[error("Row '{0}' not found")]
    UnknownRow(String),

    /// The value does not fit the column type
    #[error("Field '{field}' expects a {expected} value")]
    TypeMismatch {
        /// Logical field name
        field: String,
        /// Expected column type
        expected: &'static str,
    },

    /// A date column received a string that is not `YYYY-MM-DD`
    #[error("Field '{field}' has invalid date '{value}'")]
    InvalidDate {
        /// Logical field name
        field: String,
        /// Rejected input
        value: String,
    },
}

impl EditError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EditError::UnknownField(_) | EditError::UnknownRow(_))
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            EditError::UnknownField(_) | EditError::UnknownRow(_) => "NOT_FOUND",
            EditError::ReadOnlyField(_) => "FORBIDDEN",
            EditError::TypeMismatch { .. } | EditError::InvalidDate { .. } => "VALIDATION_FAILED",
        }
    }
}
