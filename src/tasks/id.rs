//! Task ID generation.
//!
//! A task id is its creation time in milliseconds since the Unix epoch. Two
//! tasks created within the same millisecond (or after a clock step back)
//! would collide, so the id is bumped past the largest id already in use.

use crate::error::{Error, Result};
use crate::tasks::models::Task;

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Pick an id for a task created at `now_ms`, unique among `existing`.
///
/// # Errors
///
/// Returns [`Error::IdOverflow`] when the largest existing id is `i64::MAX`.
pub fn next_task_id(now_ms: i64, existing: &[Task]) -> Result<i64> {
    match existing.iter().map(|t| t.id).max() {
        Some(max) if max >= now_ms => max.checked_add(1).ok_or(Error::IdOverflow(max)),
        _ => Ok(now_ms),
    }
}
