//! Domain-specific error types for pagegrid
//!
//! Every failure the grid can hit is modelled here. None of them are fatal:
//! the grid catches them at its operation boundary, logs them and reflects
//! them in its own state or in a notification.
//!
//! # Error Categories
//!
//! - **LoadError**: fetching the full record set from the Record Service
//! - **UpdateError**: a single per-record field update
//! - **BatchError**: the aggregate outcome of a commit
//! - **EditError**: staging an edit that the column configuration rejects
//! - **ConfigError**: loading or validating a grid configuration
//!
//! # Examples
//!
//! ```rust
//! use pagegrid::errors::{BatchError, UpdateError};
//!
//! let err = UpdateError::NotFound("a0k000000000001".to_string());
//! assert_eq!(err.error_code(), "NOT_FOUND");
//!
//! let batch = BatchError::Busy;
//! assert!(batch.is_busy());
//! ```

pub mod batch;
pub mod config;
pub mod edit;
pub mod load;
pub mod update;

pub use batch::BatchError;
pub use config::ConfigError;
pub use edit::EditError;
pub use load::LoadError;
pub use update::UpdateError;

/// Result type alias for load operations
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type alias for single record updates
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Result type alias for commits
pub type BatchResult<T> = Result<T, BatchError>;

/// Result type alias for edit staging
pub type EditResult<T> = Result<T, EditError>;

/// Result type alias for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_result_alias() {
        let result: LoadResult<()> = Err(LoadError::Service("unreachable".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_result_alias() {
        let result: UpdateResult<()> = Err(UpdateError::NotFound("x".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_batch_result_alias() {
        let result: BatchResult<()> = Err(BatchError::Busy);
        assert!(result.is_err());
    }

    #[test]
    fn test_edit_result_alias() {
        let result: EditResult<()> = Err(EditError::UnknownField("nope".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_result_alias() {
        let result: ConfigResult<()> = Err(ConfigError::Invalid("page_size".to_string()));
        assert!(result.is_err());
    }
}
