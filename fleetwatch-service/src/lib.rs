//! Sync orchestration and read facade for fleetwatch.
//!
//! Ties the remote session client and the agent store together: a
//! periodic, strictly sequential sync loop mirrors the remote inventory
//! into the store, while the directory facade serves filtered,
//! paginated reads concurrently.

pub mod config;
pub mod directory;
pub mod error;
pub mod sync;

pub use config::ServiceConfig;
pub use directory::AgentDirectory;
pub use error::{ServiceError, ServiceResult};
pub use sync::SyncEngine;
