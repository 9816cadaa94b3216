//! Errors raised while loading a grid configuration

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The configuration parsed but is inconsistent
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Io(_) => "IO_ERROR",
            ConfigError::Parse(_) => "PARSE_ERROR",
            ConfigError::Invalid(_) => "VALIDATION_FAILED",
        }
    }
}
