//! SQLite-backed durable client storage.
//!
//! RULE: Only store/ talks to the database.
//! The rest of the crate goes through the typed record methods in the
//! submodules; raw keys live in `types::keys`.
//!
//! Each record is one JSON value under one key, the same shape a browser
//! would keep in local storage. The event log sits beside it.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{CrbError, CrbResult},
    event::{EventLogEntry, FlowEvent},
};

mod account;
mod flow;
mod report;

pub struct ClientStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl ClientStore {
    pub fn open(path: &str) -> CrbResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> CrbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new, empty database.
    pub fn reopen(&self) -> CrbResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CrbResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_client_storage.sql"))?;
        Ok(())
    }

    // ── Key/value records ──────────────────────────────────────

    pub fn get_raw(&self, key: &str) -> CrbResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM client_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> CrbResult<()> {
        self.conn.execute(
            "INSERT INTO client_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> CrbResult<()> {
        self.conn
            .execute("DELETE FROM client_storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn contains(&self, key: &str) -> CrbResult<bool> {
        Ok(self.get_raw(key)?.is_some())
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> CrbResult<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Like `get_json`, but a record that no longer parses is logged and
    /// treated as absent. Used for the cached client records, which the
    /// workflow can always rebuild.
    pub fn get_json_or_discard<T: DeserializeOwned>(&self, key: &str) -> CrbResult<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("store: discarding unreadable {key} record: {e}");
                Ok(None)
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> CrbResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, flow_id: &str, event: &FlowEvent) -> CrbResult<()> {
        self.conn.execute(
            "INSERT INTO flow_event (flow_id, occurred_at, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                flow_id,
                Utc::now().to_rfc3339(),
                event.type_name(),
                serde_json::to_string(event)?,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_flow(&self, flow_id: &str) -> CrbResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, flow_id, occurred_at, event_type, payload
             FROM flow_event WHERE flow_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![flow_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, flow_id, occurred_at, event_type, payload)| -> CrbResult<EventLogEntry> {
                let occurred_at = DateTime::parse_from_rfc3339(&occurred_at)
                    .map_err(|e| CrbError::Other(anyhow::anyhow!("bad event timestamp: {e}")))?
                    .with_timezone(&Utc);
                Ok(EventLogEntry {
                    id: Some(id),
                    flow_id,
                    occurred_at,
                    event_type,
                    payload,
                })
            })
            .collect()
    }

    /// Number of logged events of one type for a flow (for tests).
    pub fn event_count(&self, flow_id: &str, event_type: &str) -> CrbResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM flow_event WHERE flow_id = ?1 AND event_type = ?2",
            params![flow_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
