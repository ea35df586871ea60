//! Log tool error types.

use thiserror::Error;

/// Errors that can occur during discovery and reading.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to list {path}: {cause}")]
    Listing { path: String, cause: String },

    #[error("failed to read {path}: {cause}")]
    Fetch { path: String, cause: String },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience alias for log tool results.
pub type LogResult<T> = Result<T, LogError>;
