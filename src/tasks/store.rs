//! In-memory task collection mirrored to a [`KeyValueStore`].

use crate::error::{Error, Result};
use crate::logging::EventLog;
use crate::tasks::id::next_task_id;
use crate::tasks::kv::KeyValueStore;
use crate::tasks::models::Task;
use chrono::NaiveDate;
use serde_json::{json, Value};

/// Key under which the whole collection is stored.
pub const STORAGE_KEY: &str = "deadlineTasks";

/// Fields that can be changed on an existing task.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title (if Some).
    pub title: Option<String>,
    /// New submission target; `Some(None)` clears it.
    pub submit_to: Option<Option<String>>,
    /// New progress value, stored unclamped.
    pub progress: Option<i64>,
    /// New completion flag.
    pub completed: Option<bool>,
    /// New archive flag.
    pub archived: Option<bool>,
    /// Replacement tag list.
    pub tag_ids: Option<Vec<String>>,
}

impl TaskPatch {
    /// Check if any fields are set for update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.submit_to.is_none()
            && self.progress.is_none()
            && self.completed.is_none()
            && self.archived.is_none()
            && self.tag_ids.is_none()
    }

    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(submit_to) = self.submit_to {
            task.submit_to = submit_to;
        }
        if let Some(progress) = self.progress {
            task.progress = progress;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(archived) = self.archived {
            task.archived = archived;
        }
        if let Some(tag_ids) = self.tag_ids {
            task.tag_ids = tag_ids;
        }
    }
}

/// Sort key: incomplete before complete, then deadline ascending with
/// unparseable deadlines last.
fn sort_key(task: &Task) -> (bool, bool, Option<NaiveDate>) {
    let deadline = task.parsed_deadline();
    (task.completed, deadline.is_none(), deadline)
}

/// Stable sort of a task list into display order.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by_cached_key(sort_key);
}

/// Parse a persisted collection, dropping whatever cannot be read.
///
/// Returns the tasks plus a warning message per problem found.
fn parse_collection(raw: &str) -> (Vec<Task>, Vec<String>) {
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => return (Vec::new(), vec!["stored tasks are not a list; starting empty".into()]),
        Err(e) => return (Vec::new(), vec![format!("stored tasks are corrupt ({e}); starting empty")]),
    };

    let mut warnings = Vec::new();
    let tasks = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Task>(item) {
            Ok(task) => Some(task),
            Err(e) => {
                warnings.push(format!("dropped unreadable task at position {index}: {e}"));
                None
            }
        })
        .collect();
    (tasks, warnings)
}

/// Ordered task collection backed by durable storage.
#[derive(Debug)]
pub struct TaskStore<S: KeyValueStore> {
    backend: S,
    tasks: Vec<Task>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Read the persisted collection.
    ///
    /// Never fails: unreadable storage, corrupt JSON or a non-list value all
    /// yield an empty collection, with a warning recorded in `log`.
    pub fn load(backend: S, log: &mut EventLog) -> Self {
        let raw = match backend.get_item(STORAGE_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                log.warn(
                    "tasks_load_failed",
                    format!("could not read stored tasks ({e}); starting empty"),
                    json!({}),
                );
                None
            }
        };

        let mut tasks = match raw {
            Some(raw) => {
                let (tasks, warnings) = parse_collection(&raw);
                for warning in warnings {
                    log.warn("tasks_load_reset", warning, json!({}));
                }
                tasks
            }
            None => Vec::new(),
        };

        sort_tasks(&mut tasks);
        Self { backend, tasks }
    }

    /// All tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Get a task by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// An unused id for a task created at `now_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdOverflow`] if an existing id is already `i64::MAX`.
    pub fn next_id(&self, now_ms: i64) -> Result<i64> {
        next_task_id(now_ms, &self.tasks)
    }

    /// Borrow the storage backend.
    #[must_use]
    pub const fn backend(&self) -> &S {
        &self.backend
    }

    /// Serialize the full collection to the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error (e.g. quota exceeded); stored data is left as
    /// it was.
    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tasks)?;
        self.backend.set_item(STORAGE_KEY, &json)
    }

    /// Add a task, re-sort and persist.
    ///
    /// # Errors
    ///
    /// If persisting fails the task is taken back out of memory and the error
    /// returned.
    pub fn append(&mut self, task: Task) -> Result<()> {
        let previous = self.tasks.clone();
        self.tasks.push(task);
        sort_tasks(&mut self.tasks);

        if let Err(e) = self.save() {
            self.tasks = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Remove a task and persist. Returns the removed task, or `None` if no
    /// task has that id (nothing is written in that case).
    ///
    /// # Errors
    ///
    /// Returns the save error; the task stays removed from memory.
    pub fn remove(&mut self, id: i64) -> Result<Option<Task>> {
        let Some(pos) = self.tasks.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        let removed = self.tasks.remove(pos);
        self.save()?;
        Ok(Some(removed))
    }

    /// Apply `patch` to a task, re-sort and persist. Returns the updated task,
    /// or `None` if no task has that id.
    ///
    /// # Errors
    ///
    /// Returns the save error; the in-memory change is kept.
    pub fn update(&mut self, id: i64, patch: TaskPatch) -> Result<Option<Task>> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(task.clone()));
        }

        patch.apply(task);
        let updated = task.clone();
        sort_tasks(&mut self.tasks);
        self.save()?;
        Ok(Some(updated))
    }
}
