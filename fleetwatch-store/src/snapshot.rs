//! Snapshot capture and field-level diffing.

use crate::model::AgentObservation;
use serde_json::{json, Map, Value};

/// Captures the six mutable fields of an observation as a snapshot
/// document. `last_connect` is rendered RFC 3339, `null` when absent.
pub(crate) fn capture(obs: &AgentObservation) -> Value {
    json!({
        "name": obs.name,
        "address": obs.address,
        "status": obs.status,
        "group_name": obs.group_name,
        "version": obs.version,
        "last_connect": obs.last_connect.map(|t| t.to_rfc3339()),
    })
}

/// Computes the delta between two consecutive snapshots.
///
/// A field is reported only when it exists in both snapshots and its
/// string rendering differs — fields first seen in the new snapshot are
/// not changes. Comparison is on string renderings, not typed values:
/// two values that render identically count as unchanged.
pub(crate) fn diff(old: &Value, new: &Value) -> Value {
    let mut changed = Map::new();
    if let (Some(old_map), Some(new_map)) = (old.as_object(), new.as_object()) {
        for (field, new_val) in new_map {
            if let Some(old_val) = old_map.get(field) {
                if render(old_val) != render(new_val) {
                    changed.insert(field.clone(), json!({ "old": old_val, "new": new_val }));
                }
            }
        }
    }
    Value::Object(changed)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
