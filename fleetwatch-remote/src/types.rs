//! Wire types for the remote agent-management API.
//!
//! The envelope shape (`data`, `data.items`) is decoded strictly — its
//! absence fails the whole fetch. Individual items are decoded leniently:
//! the remote fleet is heterogeneous and older agents omit or mistype
//! fields, so every string field degrades to `""` rather than failing.
//! The one exception is `lastKeepAlive`, which must be numeric.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// One agent as reported by the remote API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteAgent {
    pub id: String,
    pub name: String,
    pub address: String,
    pub status: String,
    /// First group label, or `""` when the agent is ungrouped.
    pub group: String,
    pub version: String,
    /// Last heartbeat in epoch milliseconds; `0` means never connected.
    pub last_keep_alive: i64,
}

/// Why a single collection item could not be decoded.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ItemDecodeError {
    #[error("agent item {id:?} has a missing or non-numeric lastKeepAlive")]
    Heartbeat { id: String },
}

impl RemoteAgent {
    /// Decodes one item from the collection envelope.
    ///
    /// Missing or wrong-typed fields degrade to `""`; `group` is the
    /// first element of the `group` array when present and non-empty.
    pub fn from_item(item: &Value) -> Result<Self, ItemDecodeError> {
        let id = field_string(item.get("id"));

        let last_keep_alive = item
            .get("lastKeepAlive")
            .and_then(Value::as_f64)
            .map(|ms| ms as i64)
            .ok_or_else(|| ItemDecodeError::Heartbeat { id: id.clone() })?;

        let group = item
            .get("group")
            .and_then(Value::as_array)
            .and_then(|groups| groups.first())
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        Ok(Self {
            id,
            name: field_string(item.get("name")),
            address: field_string(item.get("ip")),
            status: field_string(item.get("status")),
            group,
            version: field_string(item.get("version")),
            last_keep_alive,
        })
    }
}

/// Best-effort stringification of a scalar JSON field.
fn field_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// `POST /security/user/authenticate` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthEnvelope {
    pub data: AuthData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthData {
    pub token: String,
}

/// `GET /agents` response body. Items stay untyped here; each one goes
/// through [`RemoteAgent::from_item`].
#[derive(Debug, Deserialize)]
pub(crate) struct AgentsEnvelope {
    pub data: AgentsData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentsData {
    pub items: Vec<Value>,
}
