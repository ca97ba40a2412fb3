//! Error types for put.io API operations.
//!
//! Errors are classified so callers can drive retry logic: transient errors
//! (network trouble, 5xx, rate limiting) are worth retrying, fatal errors
//! (bad credentials) mean the remote state can no longer be trusted, and
//! everything else fails the single operation without retrying.

use std::fmt;

/// Result type alias for put.io operations.
pub type Result<T> = std::result::Result<T, Error>;

/// How an error should be handled by a calling retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth retrying after a delay (network trouble, 5xx, 429).
    Transient,
    /// Credentials are invalid or rejected; abort everything.
    Fatal,
    /// The single operation failed and retrying will not help (404, 4xx).
    Permanent,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Transient => "transient",
            Self::Fatal => "fatal",
            Self::Permanent => "permanent",
        };
        write!(f, "{s}")
    }
}

/// Errors that can occur talking to the put.io API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Could not reach the API at all (DNS, TLS, connection reset, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// Access token was rejected.
    #[error("authentication failed (HTTP {status})")]
    Unauthorized {
        /// 401 or 403.
        status: u16,
    },

    /// Server asked us to back off.
    #[error("rate limited (HTTP 429)")]
    RateLimited,

    /// Non-2xx response, with put.io's error payload when it sent one.
    #[error("put.io API error (HTTP {status}): {}", message.as_deref().unwrap_or("no detail"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// put.io `error_type`, e.g. `NotFound`.
        error_type: Option<String>,
        /// put.io `error_message`.
        message: Option<String>,
    },

    /// Response body was not the JSON we expected.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Classify this error for retry handling.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Transport(_) | Error::RateLimited => ErrorClass::Transient,
            Error::Unauthorized { .. } => ErrorClass::Fatal,
            Error::Api { status, .. } if *status >= 500 => ErrorClass::Transient,
            Error::Api { .. } | Error::InvalidResponse(_) => ErrorClass::Permanent,
        }
    }

    /// Whether this error is typically short-lived and worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Whether this error means the whole run must stop.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Fatal
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => match code {
                401 | 403 => Self::Unauthorized { status: code },
                429 => Self::RateLimited,
                _ => Self::Api {
                    status: code,
                    error_type: None,
                    message: None,
                },
            },
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
