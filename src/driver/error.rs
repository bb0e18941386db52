//! Driver-specific error types.

use std::io;
use thiserror::Error;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Transient network error codes that justify a reconnect attempt.
///
/// Everything else (authentication, missing objects, syntax) fails
/// immediately without retry.
pub const TRANSIENT_CODES: &[&str] = &[
    "ECONNREFUSED",
    "ETIMEDOUT",
    "ENOTFOUND",
    "ENETUNREACH",
    "EAI_AGAIN",
];

/// Errors that can occur during driver communication.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Failed to spawn the driver process.
    #[error("failed to spawn warehouse driver: {0}")]
    SpawnFailed(#[source] io::Error),

    /// Failed to write to driver stdin.
    #[error("failed to write to driver: {0}")]
    WriteFailed(#[source] io::Error),

    /// Failed to serialize a request to JSON.
    #[error("failed to serialize request: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// Failed to deserialize a response from JSON.
    #[error("failed to deserialize response: {0}")]
    DeserializeFailed(#[source] serde_json::Error),

    /// Request timed out waiting for a response.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Driver process exited unexpectedly.
    #[error("driver process exited unexpectedly")]
    DriverExited,

    /// Response channel was closed (internal error).
    #[error("response channel closed unexpectedly")]
    ChannelClosed,

    /// Driver returned an error response.
    #[error("driver error: {message} (code: {code})")]
    Remote {
        /// Error code from the driver.
        code: String,
        /// Error message from the driver.
        message: String,
    },
}

impl DriverError {
    /// Create a remote error from an error response.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The remote error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Remote { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether this error indicates a transient network condition worth a
    /// reconnect attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Remote { code, message } => TRANSIENT_CODES
                .iter()
                .any(|c| code == c || message.contains(c)),
            _ => false,
        }
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for DriverError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Self::ChannelClosed
    }
}
