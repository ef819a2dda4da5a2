//! List rendering.
//!
//! Rendering is split in two. [`build_list_view`] is a pure function from
//! tasks and view state to a [`ListView`]; it never touches storage. The
//! [`Renderer`] wraps it with the side effects of a render pass: revoking the
//! previous pass's image handles first, and resolving cover images
//! afterwards ([`Renderer::resolve_images`]). Image patches always arrive
//! after the synchronous pass and carry no ordering guarantee.

pub mod handles;
pub mod text;

pub use handles::{HandleCache, TransientHandle};

use crate::images::ImageStore;
use crate::logging::EventLog;
use crate::tasks::Task;
use crate::view::{visible_tasks, ViewScope, ViewState};
use serde::Serialize;
use serde_json::json;

/// Placeholder character for a task with an empty title.
pub const EMPTY_TITLE_INITIAL: &str = "？";

/// Compact-view thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Thumbnail {
    /// First character of the title.
    Initial(String),
    /// A cover image that will be patched in.
    Image(i64),
}

/// One label/value row of the detail panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoRow {
    /// Stable key.
    pub key: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Display value.
    pub value: String,
}

/// Buttons offered in the detail panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Mark complete.
    Complete,
    /// Mark incomplete again.
    Reopen,
    /// Move to the archive.
    Archive,
    /// Bring back from the archive.
    Unarchive,
    /// Delete the task and its cover image.
    Delete,
}

impl Action {
    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Complete => "タスクを完了",
            Self::Reopen => "未完了に戻す",
            Self::Archive => "📦 アーカイブ",
            Self::Unarchive => "📋 一覧に戻す",
            Self::Delete => "タスクを削除",
        }
    }
}

/// Everything displayed for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCard {
    /// Task id.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Deadline text with fallbacks applied.
    pub deadline_text: String,
    /// Progress clamped to `0..=100`.
    pub progress: u8,
    /// Whether the task is completed.
    pub completed: bool,
    /// Whether the task is archived.
    pub archived: bool,
    /// Compact-view thumbnail.
    pub thumbnail: Thumbnail,
    /// Cover image shown in the detail panel.
    pub cover_image_id: Option<i64>,
    /// Detail rows.
    pub info_rows: Vec<InfoRow>,
    /// Available actions, in display order.
    pub actions: Vec<Action>,
}

impl TaskCard {
    fn from_task(task: &Task) -> Self {
        let thumbnail = task.cover_image_id.map_or_else(
            || {
                Thumbnail::Initial(
                    task.title
                        .chars()
                        .next()
                        .map_or_else(|| EMPTY_TITLE_INITIAL.to_string(), String::from),
                )
            },
            Thumbnail::Image,
        );

        let mut info_rows =
            vec![InfoRow { key: "deadline", label: "期限", value: task.deadline_text().to_string() }];
        if let Some(submit_to) = task.submit_to.as_deref().filter(|s| !s.is_empty()) {
            info_rows.push(InfoRow { key: "submitTo", label: "提出先", value: submit_to.to_string() });
        }

        let mut actions = Vec::with_capacity(3);
        if !task.archived {
            actions.push(if task.completed { Action::Reopen } else { Action::Complete });
        }
        if task.completed {
            actions.push(if task.archived { Action::Unarchive } else { Action::Archive });
        }
        actions.push(Action::Delete);

        Self {
            id: task.id,
            title: task.title.clone(),
            deadline_text: task.deadline_text().to_string(),
            progress: task.clamped_progress(),
            completed: task.completed,
            archived: task.archived,
            thumbnail,
            cover_image_id: task.cover_image_id,
            info_rows,
            actions,
        }
    }
}

/// A fully built list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    /// Scope the list was built for.
    pub scope: ViewScope,
    /// Scope indicator glyph.
    pub scope_icon: &'static str,
    /// Cards in display order.
    pub cards: Vec<TaskCard>,
}

/// Build the list for `view` from scratch.
#[must_use]
pub fn build_list_view(tasks: &[Task], view: &ViewState) -> ListView {
    ListView {
        scope: view.scope,
        scope_icon: view.scope.icon(),
        cards: visible_tasks(tasks, view).into_iter().map(TaskCard::from_task).collect(),
    }
}

/// A cover image resolved after the synchronous pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePatch {
    /// Card the image belongs to.
    pub task_id: i64,
    /// Image Store id.
    pub image_id: i64,
    /// Handle to display, or `None` when the blob is gone.
    pub handle: Option<TransientHandle>,
}

/// Render passes plus the handle cache they own.
#[derive(Debug, Default)]
pub struct Renderer {
    handles: HandleCache,
}

impl Renderer {
    /// A renderer with no live handles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pass: revoke the previous pass's handles and rebuild.
    pub fn render(&mut self, tasks: &[Task], view: &ViewState) -> ListView {
        self.handles.revoke_all();
        build_list_view(tasks, view)
    }

    /// Fetch the cover images of `list` and issue handles for them.
    ///
    /// Fetch failures are logged and reported as a patch without a handle.
    pub fn resolve_images<I: ImageStore + ?Sized>(
        &mut self,
        list: &ListView,
        images: &I,
        log: &mut EventLog,
    ) -> Vec<ImagePatch> {
        list.cards
            .iter()
            .filter_map(|card| card.cover_image_id.map(|image_id| (card.id, image_id)))
            .map(|(task_id, image_id)| {
                let handle = match images.get(image_id) {
                    Ok(Some(blob)) => Some(self.handles.allocate(image_id, blob)),
                    Ok(None) => None,
                    Err(e) => {
                        log.warn(
                            "image_fetch_failed",
                            format!("could not load cover image {image_id}: {e}"),
                            json!({"task_id": task_id, "image_id": image_id}),
                        );
                        None
                    }
                };
                ImagePatch { task_id, image_id, handle }
            })
            .collect()
    }

    /// Revoke the handle of one image (used when it is deleted).
    pub fn release_image(&mut self, image_id: i64) -> bool {
        self.handles.revoke(image_id)
    }

    /// The handle cache.
    #[must_use]
    pub const fn handles(&self) -> &HandleCache {
        &self.handles
    }
}
