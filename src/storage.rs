//! Durable key-value storage backends.
//!
//! The inventory store persists the whole collection as one JSON blob under
//! a single key, so the backend only needs synchronous get/set of strings.
//! There is no cross-process coordination: two concurrent writers are
//! last-write-wins at the blob level (single-user local tool).

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Synchronous key-value storage capability.
///
/// Implementations must not throw on missing keys (`get` returns `None`).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store, used in tests and as a scratch backend.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Returns the default database path: ~/.local/share/frigo/frigo.db
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("frigo")
        .join("frigo.db")
}

/// SQLite-backed store holding blobs in a two-column kv table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and initialises the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        log::info!("Frigo DB: {}", path.display());
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(SqliteStore { conn })
    }

    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key        TEXT NOT NULL PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                 value      = excluded.value,
                 updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn memory_store_set_then_get() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn sqlite_store_set_then_get() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("frigo", "[]").unwrap();
        assert_eq!(store.get("frigo").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn sqlite_store_overwrites_existing_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("frigo", "old").unwrap();
        store.set("frigo", "new").unwrap();
        assert_eq!(store.get("frigo").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn sqlite_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frigo.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("frigo", "{\"version\":1}").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.get("frigo").unwrap().as_deref(),
            Some("{\"version\":1}")
        );
    }
}
