//! Errors raised while fetching the full record set

use std::sync::Arc;

use thiserror::Error;

/// Failure to retrieve the full record set
///
/// Cloneable so the grid can keep the last error while also returning it.
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    /// The Record Service reported a failure
    #[error("Record service error: {0}")]
    Service(String),

    /// Reading the backing store failed
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    /// The records could not be decoded
    #[error("Failed to parse records: {0}")]
    Parse(String),
}

impl LoadError {
    /// Check if retrying the same load could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LoadError::Service(_) | LoadError::Io(_))
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            LoadError::Service(_) => "SERVICE_ERROR",
            LoadError::Io(_) => "IO_ERROR",
            LoadError::Parse(_) => "PARSE_ERROR",
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Parse(err.to_string())
    }
}
