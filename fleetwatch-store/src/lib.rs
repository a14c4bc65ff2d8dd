//! SQLite storage layer for fleetwatch.
//!
//! One row per remote agent, keyed by the remote system's identifier.
//! Each upsert captures a snapshot of the mutable fields and records
//! which of them changed since the previous observation.

mod agent_store;
mod error;
mod model;
mod snapshot;

pub use agent_store::AgentStore;
pub use error::{StoreError, StoreResult};
pub use model::{AgentFilter, AgentObservation, AgentPage, AgentRecord};
