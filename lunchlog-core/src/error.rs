//! Error types for lunchlog-core

use thiserror::Error;

/// Main error type for the lunchlog-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Backend did not answer within the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Backend could not be reached at all
    #[error("network error: {0}")]
    Network(String),

    /// Restaurant not found
    #[error("restaurant not found: {0}")]
    RestaurantNotFound(i64),

    /// History record not found
    #[error("history record not found: {0}")]
    HistoryNotFound(i64),

    /// Caller supplied a value outside the accepted range
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A timestamp that is neither RFC 3339 nor an ISO-8601 local date-time
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl Error {
    /// Whether retrying the same request may succeed.
    ///
    /// Server-side failures (5xx), timeouts and connection failures are transient;
    /// client errors and missing resources are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { status, .. } => *status >= 500,
            Error::Timeout(_) | Error::Network(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for lunchlog-core
pub type Result<T> = std::result::Result<T, Error>;
