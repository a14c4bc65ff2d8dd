//! Remote-API client for fleetwatch.
//!
//! Maintains a single bearer-token session against the agent-management
//! API and fetches the full agent inventory, hiding login and token
//! refresh from callers.

pub mod client;
pub mod error;
pub mod types;

pub use client::SessionClient;
pub use error::{RemoteError, RemoteResult};
pub use types::{ItemDecodeError, RemoteAgent};
