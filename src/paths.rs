//! Path utilities for determining data storage locations.
//!
//! All data lives in one directory: `$DEADLINES_DATA_DIR` when set, otherwise
//! `<platform data dir>/deadlines` (e.g. `~/.local/share/deadlines`).

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DEADLINES_DATA_DIR";

/// The directory name under the platform data directory.
const DATA_DIR_NAME: &str = "deadlines";

/// The task collection database filename.
pub const TASKS_DB_FILENAME: &str = "tasks.sqlite3";

/// The image database filename.
pub const IMAGES_DB_FILENAME: &str = "images.sqlite3";

/// The config filename.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// The event log filename.
pub const EVENT_LOG_FILENAME: &str = "events.jsonl";

/// Get the data directory.
///
/// Falls back to `./.deadlines` if no platform data directory can be
/// determined.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir().map_or_else(|| PathBuf::from(".deadlines"), |d| d.join(DATA_DIR_NAME))
}

/// Path of the task collection database inside `data_dir`.
#[must_use]
pub fn tasks_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(TASKS_DB_FILENAME)
}

/// Path of the image database inside `data_dir`.
#[must_use]
pub fn images_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(IMAGES_DB_FILENAME)
}

/// Path of the config file inside `data_dir`.
#[must_use]
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILENAME)
}

/// Path of the event log inside `data_dir`.
#[must_use]
pub fn event_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(EVENT_LOG_FILENAME)
}
