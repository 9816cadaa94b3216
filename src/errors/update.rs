//! Errors raised by a single record update

use std::collections::BTreeMap;

use thiserror::Error;

/// Failure of one field-update request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpdateError {
    /// No record with this id exists in the backend
    #[error("Record '{0}' not found")]
    NotFound(String),

    /// The backend refused the update, optionally with per-field diagnostics
    #[error("Update of record '{record_id}' rejected: {message}")]
    Rejected {
        /// Id of the record the update targeted
        record_id: String,
        /// Backend message
        message: String,
        /// Field-level validation messages keyed by backend field identifier
        field_errors: BTreeMap<String, Vec<String>>,
    },

    /// Transport or backend failure unrelated to the submitted values
    #[error("Record service error while updating '{record_id}': {message}")]
    Service {
        /// Id of the record the update targeted
        record_id: String,
        /// Backend message
        message: String,
    },
}

impl UpdateError {
    /// Id of the record this failure belongs to
    pub fn record_id(&self) -> &str {
        match self {
            UpdateError::NotFound(id) => id,
            UpdateError::Rejected { record_id, .. } | UpdateError::Service { record_id, .. } => {
                record_id
            }
        }
    }

    /// Structured field diagnostics, when the backend supplied any
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            UpdateError::Rejected { field_errors, .. } if !field_errors.is_empty() => {
                Some(field_errors)
            }
            _ => None,
        }
    }

    /// Check if this is a client error (bad values submitted)
    pub fn is_client_error(&self) -> bool {
        matches!(self, UpdateError::Rejected { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpdateError::NotFound(_))
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            UpdateError::NotFound(_) => "NOT_FOUND",
            UpdateError::Rejected { .. } => "VALIDATION_FAILED",
            UpdateError::Service { .. } => "SERVICE_ERROR",
        }
    }
}
