//! Error types for session operations.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific errors.
///
/// `Connection`, `Timeout` and `Other` are for stores backed by an external
/// service; the in-memory store only raises `InvalidSessionId`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing store could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid session ID
    #[error("Invalid session ID: {0}")]
    InvalidSessionId(String),

    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,

    /// Generic error
    #[error("Session error: {0}")]
    Other(String),
}

impl SessionError {
    /// Create a new connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
