//! Task form validation and deadline normalization.
//!
//! A [`TaskForm`] holds raw user input. [`TaskForm::prepare`] validates it in
//! a fixed order (title, then the deadline field of the chosen mode, then
//! the cover image) and produces a [`PreparedTask`] without touching any
//! storage. The caller stores the image and appends the task.

use crate::error::Result;
use crate::images::{compress, CompressOptions};
use crate::tasks::{DeadlineType, Task};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static MONTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());

/// Input rejected before anything was stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The title is empty after trimming.
    #[error("タスク名を入力してください")]
    MissingTitle,

    /// Exact mode without a date.
    #[error("提出期限（日付）を入力してください")]
    MissingDate,

    /// Rough mode without a month.
    #[error("提出期限（月）を入力してください")]
    MissingMonth,

    /// A date that is not a real `YYYY-MM-DD` day.
    #[error("提出期限（日付）が正しくありません: '{0}'（YYYY-MM-DD で入力してください）")]
    InvalidDate(String),

    /// A month that is not a real `YYYY-MM` month.
    #[error("提出期限（月）が正しくありません: '{0}'（YYYY-MM で入力してください）")]
    InvalidMonth(String),

    /// An unknown part-of-month name.
    #[error("時期の指定が正しくありません: '{0}'（early / middle / late のいずれか）")]
    InvalidPart(String),

    /// A part of month given for an exact deadline.
    #[error("時期（上旬・中旬・下旬）は提出期限（月）と一緒に指定してください")]
    PartWithoutMonth,
}

/// Part of a month for rough deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoughPart {
    /// Up to the 10th.
    #[default]
    Early,
    /// Up to the 20th.
    Middle,
    /// Up to the last day.
    Late,
}

impl RoughPart {
    /// Get the string representation of the part.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Early => "early",
            Self::Middle => "middle",
            Self::Late => "late",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Early => "上旬",
            Self::Middle => "中旬",
            Self::Late => "下旬",
        }
    }

    /// Day of the month this part resolves to.
    #[must_use]
    pub fn day(self, year: i32, month: u32) -> Option<u32> {
        match self {
            Self::Early => Some(10),
            Self::Middle => Some(20),
            Self::Late => last_day_of_month(year, month),
        }
    }
}

impl fmt::Display for RoughPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoughPart {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "early" => Ok(Self::Early),
            "middle" => Ok(Self::Middle),
            "late" => Ok(Self::Late),
            _ => Err(ValidationError::InvalidPart(s.to_string())),
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt().map(|d| d.day())
}

/// A normalized deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deadline {
    /// Sortable `YYYY-MM-DD`.
    pub deadline: String,
    /// Text shown to the user.
    pub display: String,
}

/// Normalize an exact date.
///
/// # Errors
///
/// Returns [`ValidationError::MissingDate`] for blank input and
/// [`ValidationError::InvalidDate`] for anything that is not a calendar day.
pub fn normalize_exact(date: &str) -> std::result::Result<Deadline, ValidationError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(ValidationError::MissingDate);
    }
    if !DATE_RE.is_match(date) || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return Err(ValidationError::InvalidDate(date.to_string()));
    }
    Ok(Deadline { deadline: date.to_string(), display: date.to_string() })
}

/// Normalize a rough `YYYY-MM` plus part of month.
///
/// # Errors
///
/// Returns [`ValidationError::MissingMonth`] for blank input and
/// [`ValidationError::InvalidMonth`] for anything that is not a real month.
pub fn normalize_rough(month: &str, part: RoughPart) -> std::result::Result<Deadline, ValidationError> {
    let month = month.trim();
    if month.is_empty() {
        return Err(ValidationError::MissingMonth);
    }
    let invalid = || ValidationError::InvalidMonth(month.to_string());

    let caps = MONTH_RE.captures(month).ok_or_else(invalid)?;
    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let month_num: u32 = caps[2].parse().map_err(|_| invalid())?;
    let day = part.day(year, month_num).ok_or_else(invalid)?;
    let date = NaiveDate::from_ymd_opt(year, month_num, day).ok_or_else(invalid)?;

    Ok(Deadline {
        deadline: date.format("%Y-%m-%d").to_string(),
        display: format!("{}年{month_num}月{}", &caps[1], part.label()),
    })
}

/// Raw form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    /// Task title.
    pub title: String,
    /// Entry mode.
    pub deadline_type: DeadlineType,
    /// `YYYY-MM-DD`, used in exact mode.
    pub date: String,
    /// `YYYY-MM`, used in rough mode.
    pub month: String,
    /// Part of month, used in rough mode.
    pub part: RoughPart,
    /// Where the deliverable is handed in.
    pub submit_to: String,
    /// Attached cover image, as read from disk.
    pub cover_image: Option<Vec<u8>>,
    /// Tags for the new task.
    pub tag_ids: Vec<String>,
}

/// Validated form contents, ready to become a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTask {
    /// Trimmed title.
    pub title: String,
    /// Entry mode.
    pub deadline_type: DeadlineType,
    /// Normalized deadline.
    pub deadline: Deadline,
    /// Trimmed submission target, `None` when blank.
    pub submit_to: Option<String>,
    /// Compressed cover image to store.
    pub cover_image: Option<Vec<u8>>,
    /// Tags.
    pub tag_ids: Vec<String>,
}

impl TaskForm {
    /// A form in exact mode.
    #[must_use]
    pub fn exact(title: impl Into<String>, date: impl Into<String>) -> Self {
        Self { title: title.into(), date: date.into(), ..Self::default() }
    }

    /// A form in rough mode.
    #[must_use]
    pub fn rough(title: impl Into<String>, month: impl Into<String>, part: RoughPart) -> Self {
        Self {
            title: title.into(),
            deadline_type: DeadlineType::Rough,
            month: month.into(),
            part,
            ..Self::default()
        }
    }

    /// Validate and normalize, compressing the cover image if one is attached.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, or the image error if the cover
    /// cannot be converted.
    pub fn prepare(&self, compression: &CompressOptions) -> Result<PreparedTask> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle.into());
        }

        let deadline = match self.deadline_type {
            DeadlineType::Exact => normalize_exact(&self.date)?,
            DeadlineType::Rough => normalize_rough(&self.month, self.part)?,
        };

        let cover_image =
            self.cover_image.as_deref().map(|bytes| compress(bytes, compression)).transpose()?;

        let submit_to = Some(self.submit_to.trim()).filter(|s| !s.is_empty()).map(str::to_string);

        Ok(PreparedTask {
            title: title.to_string(),
            deadline_type: self.deadline_type,
            deadline,
            submit_to,
            cover_image,
            tag_ids: self.tag_ids.clone(),
        })
    }

    /// Clear every field; the mode goes back to exact and the part to early.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl PreparedTask {
    /// Build the new task record.
    #[must_use]
    pub fn into_task(self, id: i64, cover_image_id: Option<i64>) -> Task {
        Task {
            id,
            title: self.title,
            deadline_type: self.deadline_type,
            deadline: self.deadline.deadline,
            display_deadline: self.deadline.display,
            progress: 0,
            cover_image_id,
            submit_to: self.submit_to,
            completed: false,
            archived: false,
            tag_ids: self.tag_ids,
        }
    }
}
