//! SQLite-backed durable storage area
//!
//! One `kv` table of JSON values. The single background context owns one
//! connection behind a mutex; individual calls are atomic statements, which
//! matches the storage model the core is written against (no cross-call
//! transactions). Calls are short single-row statements and run inline on
//! the async thread.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use stopllms_core::StorageArea;
use stopllms_domain::{Result, StopLlmsError};

/// Durable key/value area over a SQLite database.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path).map_err(storage_err)?)
    }

    /// Open a private in-memory database (tests, ephemeral profiles).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(storage_err)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL").map_err(storage_err)?;
        conn.pragma_update(None, "synchronous", "NORMAL").map_err(storage_err)?;
        conn.pragma_update(None, "busy_timeout", 5_000).map_err(storage_err)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(storage_err)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

#[async_trait]
impl StorageArea for SqliteStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = {
            let conn = self.conn.lock();
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(storage_err)?
        };

        raw.map(|s| serde_json::from_str(&s).map_err(|e| StopLlmsError::Storage(e.to_string())))
            .transpose()
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let serialized =
            serde_json::to_string(&value).map_err(|e| StopLlmsError::Storage(e.to_string()))?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, serialized],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key]).map_err(storage_err)?;
        Ok(())
    }
}

fn storage_err(err: rusqlite::Error) -> StopLlmsError {
    StopLlmsError::Storage(err.to_string())
}
