//! The agent table and its change-tracking upsert.

use crate::error::StoreResult;
use crate::model::{AgentFilter, AgentObservation, AgentRecord};
use crate::snapshot;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const RECORD_COLUMNS: &str = "external_id, name, address, status, group_name, version, \
     last_connect, created_at, updated_at, changes, current_state";

/// Agent store backed by SQLite.
///
/// One row per external agent id. Rows are created on first observation
/// and updated on every subsequent one; they are never deleted, so an
/// agent absent from a remote fetch stays stale-but-present.
#[derive(Clone)]
pub struct AgentStore {
    conn: Arc<Mutex<Connection>>,
}

impl AgentStore {
    /// Opens or creates an agent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory agent store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persists an observation and the delta against the previous one.
    ///
    /// The new snapshot and its delta are written together with the
    /// mutable columns in a single insert-or-update statement, so a
    /// concurrent reader never sees a torn row. `created_at` is set on
    /// first insert and never touched again.
    pub fn upsert(&self, obs: &AgentObservation) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let previous: Option<String> = conn
            .query_row(
                "SELECT current_state FROM agents WHERE external_id = ?1",
                params![obs.external_id],
                |row| row.get(0),
            )
            .optional()?;

        let new_state = snapshot::capture(obs);
        let changes = match &previous {
            None => Value::Object(Default::default()),
            Some(raw) => {
                let old: Value = serde_json::from_str(raw)?;
                snapshot::diff(&old, &new_state)
            }
        };

        let now = Utc::now();
        conn.execute(
            r#"
            INSERT INTO agents (
                external_id, name, address, status, group_name, version,
                last_connect, created_at, updated_at, changes, current_state
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(external_id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                status = excluded.status,
                group_name = excluded.group_name,
                version = excluded.version,
                last_connect = excluded.last_connect,
                updated_at = excluded.updated_at,
                changes = excluded.changes,
                current_state = excluded.current_state
            "#,
            params![
                obs.external_id,
                obs.name,
                obs.address,
                obs.status,
                obs.group_name,
                obs.version,
                obs.last_connect,
                now,
                now,
                serde_json::to_string(&changes)?,
                serde_json::to_string(&new_state)?,
            ],
        )?;

        debug!(external_id = %obs.external_id, "upserted agent");
        Ok(())
    }

    /// Gets a single agent by its external id.
    pub fn get(&self, external_id: &str) -> StoreResult<Option<AgentRecord>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM agents WHERE external_id = ?1"),
                params![external_id],
                read_raw_row,
            )
            .optional()?;
        drop(conn);

        match row {
            Some(raw) => Ok(Some(raw.into_record()?)),
            None => Ok(None),
        }
    }

    /// Lists agents matching the filter, with the total match count.
    ///
    /// Pagination values are applied as given; clamping is the caller's
    /// responsibility.
    pub fn list(&self, filter: &AgentFilter) -> StoreResult<(Vec<AgentRecord>, u64)> {
        let conn = self.conn.lock().unwrap();

        let mut where_sql = String::from(" FROM agents WHERE 1=1");
        let mut args: Vec<String> = Vec::new();
        if let Some(group) = &filter.group {
            where_sql.push_str(" AND group_name = ?");
            args.push(group.clone());
        }
        if let Some(status) = &filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(status.clone());
        }

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*){where_sql}"),
            rusqlite::params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let limit = i64::from(filter.per_page);
        let offset = i64::from(filter.page.saturating_sub(1)) * limit;
        let select =
            format!("SELECT {RECORD_COLUMNS}{where_sql} ORDER BY external_id LIMIT ? OFFSET ?");

        let mut stmt = conn.prepare(&select)?;
        let mut bindings: Vec<&dyn rusqlite::ToSql> =
            args.iter().map(|a| a as &dyn rusqlite::ToSql).collect();
        bindings.push(&limit);
        bindings.push(&offset);

        let raw_rows: Vec<RawRow> = stmt
            .query_map(bindings.as_slice(), read_raw_row)?
            .collect::<Result<_, _>>()?;
        drop(stmt);
        drop(conn);

        let mut records = Vec::with_capacity(raw_rows.len());
        for raw in raw_rows {
            records.push(raw.into_record()?);
        }
        Ok((records, total as u64))
    }
}

/// A row as read from SQLite, JSON columns still unparsed.
struct RawRow {
    external_id: String,
    name: String,
    address: String,
    status: String,
    group_name: String,
    version: String,
    last_connect: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    changes: String,
    current_state: String,
}

impl RawRow {
    fn into_record(self) -> StoreResult<AgentRecord> {
        Ok(AgentRecord {
            external_id: self.external_id,
            name: self.name,
            address: self.address,
            status: self.status,
            group_name: self.group_name,
            version: self.version,
            last_connect: self.last_connect,
            created_at: self.created_at,
            updated_at: self.updated_at,
            changes: serde_json::from_str(&self.changes)?,
            current_state: serde_json::from_str(&self.current_state)?,
        })
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        external_id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        status: row.get(3)?,
        group_name: row.get(4)?,
        version: row.get(5)?,
        last_connect: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        changes: row.get(9)?,
        current_state: row.get(10)?,
    })
}

fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS agents (
            external_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT '',
            group_name TEXT NOT NULL DEFAULT '',
            version TEXT NOT NULL DEFAULT '',
            last_connect TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            changes TEXT NOT NULL DEFAULT '{}',
            current_state TEXT NOT NULL DEFAULT '{}'
        );
        CREATE INDEX IF NOT EXISTS idx_agents_group ON agents(group_name);
        CREATE INDEX IF NOT EXISTS idx_agents_status ON agents(status);
        "#,
    )?;
    Ok(())
}
