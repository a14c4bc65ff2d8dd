//! Stored agent records and query types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One observation of a remote agent — the input to an upsert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentObservation {
    pub external_id: String,
    pub name: String,
    pub address: String,
    pub status: String,
    pub group_name: String,
    pub version: String,
    /// `None` when the agent has never connected.
    pub last_connect: Option<DateTime<Utc>>,
}

/// A persisted agent row.
///
/// `current_state` is the snapshot of the mutable fields as of
/// `updated_at`; `changes` is the field-level delta against the
/// immediately preceding snapshot (`{}` on first observation or when
/// nothing changed). Delta depth is exactly one generation — this is
/// not a change log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentRecord {
    pub external_id: String,
    pub name: String,
    pub address: String,
    pub status: String,
    pub group_name: String,
    pub version: String,
    pub last_connect: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_state: Value,
    pub changes: Value,
}

impl AgentRecord {
    /// Returns true if the last sync observed at least one field change.
    pub fn has_changes(&self) -> bool {
        self.changes.as_object().is_some_and(|m| !m.is_empty())
    }
}

/// Filter and pagination parameters for listing agents.
///
/// Values are applied as given — callers are expected to clamp
/// `page`/`per_page` beforehand.
#[derive(Clone, Debug, Default)]
pub struct AgentFilter {
    pub group: Option<String>,
    pub status: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

/// One page of agent records.
#[derive(Clone, Debug, Serialize)]
pub struct AgentPage {
    pub records: Vec<AgentRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
}
