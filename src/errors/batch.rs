//! Aggregate commit errors

use indexmap::IndexMap;
use thiserror::Error;

use super::UpdateError;

/// Aggregate failure of a commit
///
/// The display string is deliberately generic; callers that need to know
/// which rows failed can inspect `outcomes`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    /// One or more of the per-record updates failed
    #[error("Error updating records")]
    PartialFailure {
        /// Number of failed updates
        failed: usize,
        /// Number of updates issued
        total: usize,
        /// Per-row outcome in submission order
        outcomes: IndexMap<String, Result<(), UpdateError>>,
    },

    /// A load or commit is already in flight
    #[error("Grid is busy")]
    Busy,
}

impl BatchError {
    /// Build the aggregate error from a complete set of outcomes
    pub fn from_outcomes(outcomes: IndexMap<String, Result<(), UpdateError>>) -> Self {
        let failed = outcomes.values().filter(|o| o.is_err()).count();
        BatchError::PartialFailure {
            failed,
            total: outcomes.len(),
            outcomes,
        }
    }

    /// Failed updates, if any
    pub fn failures(&self) -> Vec<&UpdateError> {
        match self {
            BatchError::PartialFailure { outcomes, .. } => {
                outcomes.values().filter_map(|o| o.as_ref().err()).collect()
            }
            BatchError::Busy => Vec::new(),
        }
    }

    /// Check whether at least one row was applied despite the failure
    pub fn is_partial(&self) -> bool {
        matches!(self, BatchError::PartialFailure { failed, total, .. } if failed < total)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, BatchError::Busy)
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            BatchError::PartialFailure { .. } => "UPDATE_FAILED",
            BatchError::Busy => "BUSY",
        }
    }
}
