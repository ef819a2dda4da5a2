//! Task records and their persistence.
//!
//! This module provides:
//! - The [`Task`] record and its lenient JSON form
//! - [`TaskStore`], an ordered in-memory collection mirrored to storage
//! - [`KeyValueStore`] backends (`SQLite` on disk, in-memory for tests)
//!
//! # Example
//!
//! ```no_run
//! use deadlines::logging::EventLog;
//! use deadlines::tasks::{SqliteKeyValueStore, TaskStore};
//!
//! let backend = SqliteKeyValueStore::new("/tmp/tasks.sqlite3", 5 * 1024 * 1024).unwrap();
//! let store = TaskStore::load(backend, &mut EventLog::disabled());
//! for task in store.tasks() {
//!     println!("{} {}", task.deadline_text(), task.title);
//! }
//! ```

pub mod id;
pub mod kv;
pub mod models;
pub mod store;

pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use models::{DeadlineType, Task, NO_DEADLINE_TEXT};
pub use store::{sort_tasks, TaskPatch, TaskStore, STORAGE_KEY};
