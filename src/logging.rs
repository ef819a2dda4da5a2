//! Event logging.
//!
//! When `debug_logging` is enabled in the config, every notable event is
//! appended as a JSONL line to `<data dir>/events.jsonl`. Warnings are kept in
//! memory as well so the front end can show them.
//!
//! Errors are silently ignored. Logging must never fail a user action.

use crate::paths;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Severity of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Routine state changes.
    Info,
    /// Recoverable problems (corrupt data reset, orphaned blobs).
    Warn,
}

impl Level {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
        }
    }
}

/// Append-only event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Log file, `None` when file logging is disabled.
    path: Option<PathBuf>,
    /// Warning messages collected since the last `take_warnings`.
    warnings: Vec<String>,
}

impl EventLog {
    /// An event log that only collects warnings in memory.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// An event log writing to `events.jsonl` inside `data_dir`.
    #[must_use]
    pub fn in_data_dir(data_dir: &std::path::Path) -> Self {
        Self { path: Some(paths::event_log_path(data_dir)), warnings: Vec::new() }
    }

    /// Record a routine event.
    pub fn info(&mut self, event: &str, fields: Value) {
        self.write(Level::Info, event, &fields);
    }

    /// Record a warning; the message is also kept for the caller to display.
    pub fn warn(&mut self, event: &str, message: impl Into<String>, fields: Value) {
        let message = message.into();
        let mut fields = fields;
        if let Value::Object(ref mut map) = fields {
            map.insert("message".to_string(), Value::String(message.clone()));
        }
        self.write(Level::Warn, event, &fields);
        self.warnings.push(message);
    }

    /// Drain warnings collected so far.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn write(&self, level: Level, event: &str, fields: &Value) {
        let Some(path) = &self.path else {
            return;
        };

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }

        let entry = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "level": level.as_str(),
            "event": event,
            "fields": fields,
        });

        let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };

        let _ = writeln!(file, "{entry}");
    }
}
