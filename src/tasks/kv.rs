//! Durable key-value storage for the task collection.
//!
//! The task collection is a single JSON document stored under one fixed key,
//! so the backend only needs string get/set. Writes are checked against a
//! byte quota before anything is touched on disk.

use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// String key to string value storage.
#[allow(clippy::missing_errors_doc)]
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    ///
    /// On error the previously stored value must be left intact.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Reject a write whose key plus value exceed `quota` bytes.
fn check_quota(key: &str, value: &str, quota: usize) -> Result<()> {
    let needed = key.len() + value.len();
    if needed > quota {
        return Err(Error::QuotaExceeded { needed, quota });
    }
    Ok(())
}

/// `SQLite`-backed key-value store.
///
/// Each operation opens a new connection to the database file.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db_path: PathBuf,
    quota: usize,
}

impl SqliteKeyValueStore {
    /// Open (creating if needed) the store at `db_path` with a byte quota per
    /// value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_path: impl AsRef<Path>, quota: usize) -> Result<Self> {
        let store = Self { db_path: db_path.as_ref().to_path_buf(), quota };
        store.init_schema()?;
        Ok(store)
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        check_quota(key, value, self.quota)?;

        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// In-memory key-value store, used for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryKeyValueStore {
    /// An unbounded in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An in-memory store that rejects values over `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self { items: HashMap::new(), quota: Some(quota) }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            check_quota(key, value, quota)?;
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
