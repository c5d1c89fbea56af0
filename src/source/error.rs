//! Error types for fetching snapshots.

use thiserror::Error;

/// Errors that can occur while fetching from the status endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The endpoint URL could not be built.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {0}")]
    Http(u16),

    /// HTTP request failed for another reason.
    #[error("Request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// No tokio runtime to run requests on.
    #[error("No async runtime: {0}")]
    Runtime(String),
}

impl FetchError {
    /// Whether the next poll may succeed without user intervention.
    ///
    /// Every failure that happens while talking to the endpoint is
    /// transient; setup failures are not.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::InvalidEndpoint(_) | FetchError::Runtime(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Http(status.as_u16())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
