//! Service-level error types.

use thiserror::Error;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the sync engine and the read facade.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Remote(#[from] fleetwatch_remote::RemoteError),

    #[error(transparent)]
    Store(#[from] fleetwatch_store::StoreError),

    #[error("agent {0} not found")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}
