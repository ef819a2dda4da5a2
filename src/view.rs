//! View scopes and the visible-task filter.

use crate::error::{Error, Result};
use crate::tasks::Task;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which slice of the task list is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewScope {
    /// Tasks not yet archived.
    #[default]
    Active,
    /// Archived tasks only.
    Archive,
    /// Everything.
    All,
    /// Tasks carrying the selected tag.
    Tag,
}

impl ViewScope {
    /// Get the string representation of the scope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archive => "archive",
            Self::All => "all",
            Self::Tag => "tag",
        }
    }

    /// Indicator shown on the scope toggle.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Active => "📋",
            Self::Archive => "📦",
            Self::All | Self::Tag => "📚",
        }
    }
}

impl fmt::Display for ViewScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "archive" => Ok(Self::Archive),
            "all" => Ok(Self::All),
            "tag" => Ok(Self::Tag),
            _ => Err(Error::InvalidScope(s.to_string())),
        }
    }
}

/// Current view selection. Lives for the process; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    /// Active scope.
    pub scope: ViewScope,
    /// Selected tag when `scope` is [`ViewScope::Tag`].
    pub tag_id: Option<String>,
}

impl ViewState {
    /// A view of `scope` with no tag selected.
    #[must_use]
    pub const fn new(scope: ViewScope) -> Self {
        Self { scope, tag_id: None }
    }

    /// A tag view.
    #[must_use]
    pub fn tag(tag_id: impl Into<String>) -> Self {
        Self { scope: ViewScope::Tag, tag_id: Some(tag_id.into()) }
    }

    /// Switch scope, clearing any tag selection.
    pub fn set_scope(&mut self, scope: ViewScope) {
        self.scope = scope;
        self.tag_id = None;
    }
}

/// The tasks visible under `view`, in collection order.
#[must_use]
pub fn visible_tasks<'a>(tasks: &'a [Task], view: &ViewState) -> Vec<&'a Task> {
    match view.scope {
        ViewScope::Active => tasks.iter().filter(|t| !t.archived).collect(),
        ViewScope::Archive => tasks.iter().filter(|t| t.archived).collect(),
        ViewScope::Tag => match view.tag_id.as_deref() {
            Some(tag) if !tag.is_empty() => tasks.iter().filter(|t| t.has_tag(tag)).collect(),
            _ => tasks.iter().collect(),
        },
        ViewScope::All => tasks.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::models::sample_task;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn ids(tasks: &[&Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    fn fixture() -> Vec<Task> {
        let mut archived = sample_task(2, "2025-01-02");
        archived.archived = true;
        archived.tag_ids = vec!["school".to_string()];
        let mut tagged = sample_task(3, "2025-01-03");
        tagged.tag_ids = vec!["school".to_string(), "work".to_string()];
        vec![sample_task(1, "2025-01-01"), archived, tagged]
    }

    #[test]
    fn test_active_and_archive() {
        let tasks = fixture();
        assert_eq!(ids(&visible_tasks(&tasks, &ViewState::new(ViewScope::Active))), vec![1, 3]);
        assert_eq!(ids(&visible_tasks(&tasks, &ViewState::new(ViewScope::Archive))), vec![2]);
        assert_eq!(ids(&visible_tasks(&tasks, &ViewState::new(ViewScope::All))), vec![1, 2, 3]);
    }

    #[test]
    fn test_tag_scope() {
        let tasks = fixture();
        assert_eq!(ids(&visible_tasks(&tasks, &ViewState::tag("school"))), vec![2, 3]);
        assert_eq!(ids(&visible_tasks(&tasks, &ViewState::tag("work"))), vec![3]);
        assert!(visible_tasks(&tasks, &ViewState::tag("none")).is_empty());
        assert_eq!(ids(&visible_tasks(&tasks, &ViewState::new(ViewScope::Tag))), vec![1, 2, 3]);
    }

    #[test]
    fn test_set_scope_clears_tag() {
        let mut view = ViewState::tag("school");
        view.set_scope(ViewScope::Archive);
        assert_eq!(view, ViewState::new(ViewScope::Archive));
    }

    #[test]
    fn test_scope_parsing_and_icons() {
        assert_eq!("Archive".parse::<ViewScope>().unwrap(), ViewScope::Archive);
        assert!(matches!("later".parse::<ViewScope>(), Err(Error::InvalidScope(_))));
        assert_eq!(ViewScope::Active.icon(), "📋");
        assert_eq!(ViewScope::Archive.icon(), "📦");
        assert_eq!(ViewScope::Tag.icon(), ViewScope::All.icon());
        assert_eq!(ViewScope::All.to_string(), "all");
    }

    proptest! {
        #[test]
        fn prop_active_and_archive_partition_all(flags in proptest::collection::vec(any::<bool>(), 0..30)) {
            let tasks: Vec<Task> = flags
                .iter()
                .enumerate()
                .map(|(i, archived)| {
                    let mut task = sample_task(i64::try_from(i).unwrap(), "2025-01-01");
                    task.archived = *archived;
                    task
                })
                .collect();

            let active: HashSet<i64> =
                visible_tasks(&tasks, &ViewState::new(ViewScope::Active)).iter().map(|t| t.id).collect();
            let archive: HashSet<i64> =
                visible_tasks(&tasks, &ViewState::new(ViewScope::Archive)).iter().map(|t| t.id).collect();
            let all: HashSet<i64> =
                visible_tasks(&tasks, &ViewState::new(ViewScope::All)).iter().map(|t| t.id).collect();

            prop_assert!(active.is_disjoint(&archive));
            prop_assert_eq!(active.union(&archive).copied().collect::<HashSet<_>>(), all);
        }
    }
}
