//! Task model types.
//!
//! Tasks are stored as camelCase JSON objects. Reading is deliberately
//! lenient: older or hand-edited collections may carry `null`, numbers or
//! strings where booleans are expected, and those are coerced the way a
//! browser would treat them (truthiness) instead of rejecting the record.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Text shown when a task has neither a display nor a normalized deadline.
pub const NO_DEADLINE_TEXT: &str = "期限未設定";

/// How the deadline was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineType {
    /// A literal calendar date.
    #[default]
    Exact,
    /// A year-month plus early/middle/late.
    Rough,
}

impl DeadlineType {
    /// Get the string representation of the deadline type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Rough => "rough",
        }
    }
}

impl<'de> Deserialize<'de> for DeadlineType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_str() {
            Some("rough") => Self::Rough,
            _ => Self::Exact,
        })
    }
}

/// A tracked deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Creation timestamp in milliseconds; unique within a collection.
    pub id: i64,
    /// Short title.
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    /// How the deadline was entered.
    #[serde(default)]
    pub deadline_type: DeadlineType,
    /// Normalized, sortable deadline (`YYYY-MM-DD`).
    #[serde(default, deserialize_with = "lenient_string")]
    pub deadline: String,
    /// Human-readable deadline.
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_deadline: String,
    /// Progress percentage as written; clamped only for display.
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: i64,
    /// Image Store id of the cover image.
    #[serde(default, deserialize_with = "lenient_id")]
    pub cover_image_id: Option<i64>,
    /// Where the deliverable is handed in.
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub submit_to: Option<String>,
    /// Whether the task is done.
    #[serde(default, deserialize_with = "truthy")]
    pub completed: bool,
    /// Whether the task has been moved to the archive.
    #[serde(default, deserialize_with = "truthy")]
    pub archived: bool,
    /// Tags used by the `tag` view scope.
    #[serde(default, deserialize_with = "lenient_tags", skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<String>,
}

impl Task {
    /// The deadline parsed as a date, if it is one.
    ///
    /// Accepts `YYYY-MM-DD` and RFC 3339 timestamps.
    #[must_use]
    pub fn parsed_deadline(&self) -> Option<NaiveDate> {
        let raw = self.deadline.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
        })
    }

    /// Text shown for the deadline: display text, else the normalized
    /// deadline, else a "no deadline" marker.
    #[must_use]
    pub fn deadline_text(&self) -> &str {
        if !self.display_deadline.is_empty() {
            &self.display_deadline
        } else if !self.deadline.is_empty() {
            &self.deadline
        } else {
            NO_DEADLINE_TEXT
        }
    }

    /// Progress clamped to `0..=100`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamped_progress(&self) -> u8 {
        self.progress.clamp(0, 100) as u8
    }

    /// Whether the task carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tag_ids.iter().any(|t| t == tag_id)
    }
}

/// Browser truthiness of a JSON value.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_progress<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| n.as_f64().map_or(0, |f| f.round() as i64)),
        _ => 0,
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_i64().filter(|id| *id != 0))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => {
            items.into_iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
        }
        _ => Vec::new(),
    })
}

#[cfg(test)]
pub(crate) fn sample_task(id: i64, deadline: &str) -> Task {
    Task {
        id,
        title: format!("Task {id}"),
        deadline_type: DeadlineType::Exact,
        deadline: deadline.to_string(),
        display_deadline: deadline.to_string(),
        progress: 0,
        cover_image_id: None,
        submit_to: None,
        completed: false,
        archived: false,
        tag_ids: Vec::new(),
    }
}
