//! Remote client error types.

use thiserror::Error;

/// Result type for remote-API operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur while talking to the remote management API.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("authentication rejected with status {status}")]
    AuthRejected { status: reqwest::StatusCode },

    #[error("malformed authentication response: {0}")]
    AuthResponse(String),

    #[error("agent fetch failed: status={status} body={body}")]
    Fetch {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response envelope: {0}")]
    Envelope(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
