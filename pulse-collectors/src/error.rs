//! Error types for the collectors

use std::time::Duration;

use thiserror::Error;

/// Errors a collector can report to the collector set
#[derive(Debug, Error)]
pub enum CollectError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Provider returned a non-success status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the provider
        message: String,
    },

    /// Payload could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Provider throttled us
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Collector needs a key that is not configured
    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    /// Collector exceeded its time budget
    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
}

impl From<reqwest::Error> for CollectError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CollectError::ParseError(err.to_string())
        } else {
            CollectError::RequestFailed(err.to_string())
        }
    }
}
