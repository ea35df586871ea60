//! WebDAV transport error types.

use thiserror::Error;

/// Errors that can occur talking to the remote store.
#[derive(Debug, Error)]
pub enum DavError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("unexpected status {status} for {path}")]
    Status { status: u16, path: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for DavError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::Http(e.to_string())
        }
    }
}

/// Convenience alias for WebDAV results.
pub type DavResult<T> = Result<T, DavError>;
