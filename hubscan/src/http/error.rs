//! Error types for HTTP operations.

use thiserror::Error;

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors that can occur while talking to a remote server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// Transport-level failure (connection refused, DNS, TLS, broken body).
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The server answered with a non-success status.
    #[error("HTTP {status} {message} from {url}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// The proxy demanded authentication that could not be satisfied.
    #[error("proxy authentication failed for {url}: {reason}")]
    ProxyAuth { url: String, reason: String },
}

impl HttpError {
    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a network-level failure rather than a server answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}
