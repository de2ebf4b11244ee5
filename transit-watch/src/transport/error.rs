//! Transport client error types.

use std::fmt;

/// Errors from the transport.rest HTTP client.
#[derive(Debug)]
pub enum TransportError {
    /// HTTP request failed (network error, timeout, etc.)
    Http(reqwest::Error),

    /// JSON deserialization failed
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    ApiError { status: u16, message: String },

    /// Rate limited by the API
    RateLimited,

    /// Mock data missing or unreadable
    MockData(String),
}

impl TransportError {
    /// Returns true for failures worth retrying on the next cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Http(_) | TransportError::RateLimited => true,
            TransportError::ApiError { status, .. } => *status >= 500,
            TransportError::Json { .. } | TransportError::MockData(_) => false,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Http(e) => write!(f, "HTTP error: {e}"),
            TransportError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            TransportError::ApiError { status, message } => {
                write!(f, "API error {status}: {message}")
            }
            TransportError::RateLimited => write!(f, "rate limited by transport API"),
            TransportError::MockData(msg) => write!(f, "mock data: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Http(err)
    }
}
