//! Image blob storage.
//!
//! Blobs live in their own `SQLite` database with a fixed schema version.
//! Every call opens a connection, runs exactly one transaction and returns a
//! single result.

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};

/// Schema version recorded in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Auto-incremented id.
    pub id: i64,
    /// Encoded image bytes.
    pub blob: Vec<u8>,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// Trait for image blob storage.
#[allow(clippy::missing_errors_doc)]
pub trait ImageStore {
    /// Store a blob and return its new id.
    fn put(&self, blob: &[u8]) -> Result<i64>;

    /// Fetch a blob by id.
    fn get(&self, id: i64) -> Result<Option<Vec<u8>>>;

    /// Fetch the full record by id.
    fn get_record(&self, id: i64) -> Result<Option<ImageRecord>>;

    /// Delete a blob. Deleting a missing id is not an error.
    fn delete(&self, id: i64) -> Result<()>;
}

/// SQLite-based image store.
#[derive(Debug, Clone)]
pub struct SqliteImageStore {
    db_path: PathBuf,
}

impl SqliteImageStore {
    /// Open (creating or upgrading if needed) the image database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self { db_path: db_path.as_ref().to_path_buf() };
        drop(store.open()?);
        Ok(store)
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection, running the schema upgrade when the stored version
    /// is behind.
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;

        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version < SCHEMA_VERSION {
            Self::upgrade(&mut conn)?;
        }
        Ok(conn)
    }

    fn upgrade(conn: &mut Connection) -> Result<()> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(&format!(
            r"
            CREATE TABLE IF NOT EXISTS images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                blob BLOB NOT NULL,
                created_at INTEGER NOT NULL
            );
            PRAGMA user_version = {SCHEMA_VERSION};
            "
        ))?;
        tx.commit()?;
        Ok(())
    }
}

impl ImageStore for SqliteImageStore {
    fn put(&self, blob: &[u8]) -> Result<i64> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO images (blob, created_at) VALUES (?1, ?2)",
            params![blob, chrono::Utc::now().timestamp_millis()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    fn get(&self, id: i64) -> Result<Option<Vec<u8>>> {
        Ok(self.get_record(id)?.map(|record| record.blob))
    }

    fn get_record(&self, id: i64) -> Result<Option<ImageRecord>> {
        let conn = self.open()?;
        let record = conn
            .query_row(
                "SELECT id, blob, created_at FROM images WHERE id = ?1",
                params![id],
                |row| Ok(ImageRecord { id: row.get(0)?, blob: row.get(1)?, created_at: row.get(2)? }),
            )
            .optional()?;
        Ok(record)
    }

    fn delete(&self, id: i64) -> Result<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM images WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, SqliteImageStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteImageStore::new(dir.path().join("images.sqlite3")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_get_delete() {
        let (_dir, store) = create_test_store();

        let id = store.put(b"blob one").unwrap();
        assert_eq!(store.get(id).unwrap().as_deref(), Some(&b"blob one"[..]));

        store.delete(id).unwrap();
        assert!(store.get(id).unwrap().is_none());
    }

    #[test]
    fn test_ids_auto_increment_and_are_not_reused() {
        let (_dir, store) = create_test_store();

        let first = store.put(b"a").unwrap();
        let second = store.put(b"b").unwrap();
        assert!(second > first);

        store.delete(second).unwrap();
        let third = store.put(b"c").unwrap();
        assert!(third > second);
    }

    #[test]
    fn test_get_record_has_timestamp() {
        let (_dir, store) = create_test_store();
        let id = store.put(b"x").unwrap();

        let record = store.get_record(id).unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.blob, b"x");
        assert!(record.created_at > 0);
    }

    #[test]
    fn test_missing_id() {
        let (_dir, store) = create_test_store();
        assert!(store.get(42).unwrap().is_none());
        store.delete(42).unwrap();
    }

    #[test]
    fn test_schema_version_is_recorded() {
        let (_dir, store) = create_test_store();
        let conn = Connection::open(store.db_path()).unwrap();
        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0)).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_blobs_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("images.sqlite3");
        let id = SqliteImageStore::new(&path).unwrap().put(b"kept").unwrap();

        let reopened = SqliteImageStore::new(&path).unwrap();
        assert_eq!(reopened.get(id).unwrap().as_deref(), Some(&b"kept"[..]));
    }

    #[test]
    fn test_corrupt_database_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("images.sqlite3");
        std::fs::write(&path, "this is not a valid sqlite database").unwrap();
        assert!(SqliteImageStore::new(&path).is_err());
    }
}
