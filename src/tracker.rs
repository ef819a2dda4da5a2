//! The tracker: task store, image store, view state and renderer for one
//! process lifetime.
//!
//! Every user action goes through a [`Tracker`] method. Methods that change
//! tasks persist before returning; the caller re-renders afterwards.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::form::TaskForm;
use crate::images::{ImageRecord, ImageStore, SqliteImageStore};
use crate::logging::EventLog;
use crate::paths;
use crate::render::{ImagePatch, ListView, Renderer};
use crate::tasks::id::now_millis;
use crate::tasks::{KeyValueStore, SqliteKeyValueStore, Task, TaskPatch, TaskStore};
use crate::view::{ViewScope, ViewState};
use serde_json::json;
use std::path::Path;

/// Application state.
#[derive(Debug)]
pub struct Tracker<S: KeyValueStore = SqliteKeyValueStore, I: ImageStore = SqliteImageStore> {
    store: TaskStore<S>,
    images: I,
    view: ViewState,
    renderer: Renderer,
    log: EventLog,
    config: Config,
}

impl Tracker {
    /// Open the tracker stored in `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or a database cannot be
    /// opened. A corrupt task collection is not an error; it loads empty.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let config = Config::load_or_default(data_dir)?;
        let log =
            if config.debug_logging { EventLog::in_data_dir(data_dir) } else { EventLog::disabled() };
        let backend =
            SqliteKeyValueStore::new(paths::tasks_db_path(data_dir), config.storage_quota_bytes)?;
        let images = SqliteImageStore::new(paths::images_db_path(data_dir))?;
        Ok(Self::new(backend, images, config, log))
    }
}

impl<S: KeyValueStore, I: ImageStore> Tracker<S, I> {
    /// Assemble a tracker from its parts, loading the task collection.
    pub fn new(backend: S, images: I, config: Config, mut log: EventLog) -> Self {
        let store = TaskStore::load(backend, &mut log);
        log.info("tracker_opened", json!({"tasks": store.tasks().len()}));
        Self { store, images, view: ViewState::default(), renderer: Renderer::new(), log, config }
    }

    /// All tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    /// Get a task by id.
    #[must_use]
    pub fn task(&self, id: i64) -> Option<&Task> {
        self.store.get(id)
    }

    /// The underlying task store.
    #[must_use]
    pub const fn task_store(&self) -> &TaskStore<S> {
        &self.store
    }

    /// The image store.
    #[must_use]
    pub const fn images(&self) -> &I {
        &self.images
    }

    /// The current view selection.
    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The renderer and its live handles.
    #[must_use]
    pub const fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Drain warnings raised since the last call.
    pub fn take_warnings(&mut self) -> Vec<String> {
        self.log.take_warnings()
    }

    /// Validate the form and add the task it describes.
    ///
    /// On success the form is reset and the view leaves the archive scope so
    /// the new task is visible.
    ///
    /// # Errors
    ///
    /// Validation, id and image errors leave everything untouched. If persisting
    /// fails the task is not added and its freshly stored cover image is
    /// deleted again.
    pub fn submit(&mut self, form: &mut TaskForm) -> Result<Task> {
        let prepared = form.prepare(&self.config.cover_compression())?;
        let id = self.store.next_id(now_millis())?;

        let cover_image_id = match prepared.cover_image.as_deref() {
            Some(blob) => Some(self.images.put(blob)?),
            None => None,
        };
        let task = prepared.into_task(id, cover_image_id);

        if self.view.scope == ViewScope::Archive {
            self.view.set_scope(ViewScope::Active);
        }

        if let Err(e) = self.store.append(task.clone()) {
            self.log.info("task_add_failed", json!({"id": id, "error": e.to_string()}));
            if let Some(image_id) = cover_image_id {
                self.discard_image(image_id);
            }
            return Err(e);
        }

        self.log.info(
            "task_added",
            json!({"id": id, "deadline": task.deadline, "cover_image_id": cover_image_id}),
        );
        form.reset();
        Ok(task)
    }

    /// Delete a task and, best-effort, its cover image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown id, or the save error.
    /// A failed image delete is only logged; the task is removed regardless.
    pub fn delete_task(&mut self, id: i64) -> Result<Task> {
        let cover_image_id = self.store.get(id).ok_or(Error::TaskNotFound(id))?.cover_image_id;

        if let Some(image_id) = cover_image_id {
            self.renderer.release_image(image_id);
            self.discard_image(image_id);
        }

        let removed = self.store.remove(id)?.ok_or(Error::TaskNotFound(id))?;
        self.log.info("task_removed", json!({"id": id}));
        Ok(removed)
    }

    /// Flip the completed flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown id, or the save error.
    pub fn toggle_complete(&mut self, id: i64) -> Result<Task> {
        let completed = self.require(id)?.completed;
        self.update(id, TaskPatch { completed: Some(!completed), ..TaskPatch::default() })
    }

    /// Flip the archived flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown id, or the save error.
    pub fn toggle_archive(&mut self, id: i64) -> Result<Task> {
        let archived = self.require(id)?.archived;
        self.update(id, TaskPatch { archived: Some(!archived), ..TaskPatch::default() })
    }

    /// Set progress. The value is stored as given and clamped when shown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown id, or the save error.
    pub fn set_progress(&mut self, id: i64, progress: i64) -> Result<Task> {
        self.update(id, TaskPatch { progress: Some(progress), ..TaskPatch::default() })
    }

    /// Apply an arbitrary patch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] for an unknown id, or the save error.
    pub fn update(&mut self, id: i64, patch: TaskPatch) -> Result<Task> {
        let updated = self.store.update(id, patch)?.ok_or(Error::TaskNotFound(id))?;
        self.log.info(
            "task_updated",
            json!({
                "id": id,
                "completed": updated.completed,
                "archived": updated.archived,
                "progress": updated.progress,
            }),
        );
        Ok(updated)
    }

    /// Replace the view selection.
    pub fn apply_view(&mut self, view: ViewState) {
        self.view = view;
    }

    /// Switch scope, clearing any tag selection.
    pub fn set_scope(&mut self, scope: ViewScope) {
        self.view.set_scope(scope);
    }

    /// Run a render pass for the current view.
    pub fn render(&mut self) -> ListView {
        self.renderer.render(self.store.tasks(), &self.view)
    }

    /// Resolve the cover images of a pass.
    pub fn resolve_images(&mut self, list: &ListView) -> Vec<ImagePatch> {
        self.renderer.resolve_images(list, &self.images, &mut self.log)
    }

    /// Fetch a stored image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageNotFound`] if there is no such image.
    pub fn image(&self, image_id: i64) -> Result<ImageRecord> {
        self.images.get_record(image_id)?.ok_or(Error::ImageNotFound(image_id))
    }

    fn require(&self, id: i64) -> Result<&Task> {
        self.store.get(id).ok_or(Error::TaskNotFound(id))
    }

    fn discard_image(&mut self, image_id: i64) {
        if let Err(e) = self.images.delete(image_id) {
            self.log.warn(
                "image_delete_failed",
                format!("could not delete cover image {image_id}: {e}"),
                json!({"image_id": image_id}),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{RoughPart, ValidationError};
    use crate::tasks::{MemoryKeyValueStore, STORAGE_KEY};
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;
    use tempfile::TempDir;

    type TestTracker = Tracker<MemoryKeyValueStore, SqliteImageStore>;

    fn png_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_pixel(32, 16, Rgb([200u8, 100, 50]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn tracker_with(backend: MemoryKeyValueStore) -> (TempDir, TestTracker) {
        let dir = TempDir::new().unwrap();
        let images = SqliteImageStore::new(dir.path().join("images.sqlite3")).unwrap();
        let tracker = Tracker::new(backend, images, Config::default(), EventLog::disabled());
        (dir, tracker)
    }

    fn tracker() -> (TempDir, TestTracker) {
        tracker_with(MemoryKeyValueStore::new())
    }

    fn stored(tracker: &TestTracker) -> Option<String> {
        tracker.task_store().backend().get_item(STORAGE_KEY).unwrap()
    }

    struct UndeletableImages(SqliteImageStore);

    impl ImageStore for UndeletableImages {
        fn put(&self, blob: &[u8]) -> Result<i64> {
            self.0.put(blob)
        }
        fn get(&self, id: i64) -> Result<Option<Vec<u8>>> {
            self.0.get(id)
        }
        fn get_record(&self, id: i64) -> Result<Option<ImageRecord>> {
            self.0.get_record(id)
        }
        fn delete(&self, _id: i64) -> Result<()> {
            Err(Error::Config("read-only image store".into()))
        }
    }

    #[test]
    fn test_submit_adds_and_resets_form() {
        let (_dir, mut tracker) = tracker();
        let mut form = TaskForm::rough("Report", "2025-12", RoughPart::Late);
        form.submit_to = "Office".to_string();

        let task = tracker.submit(&mut form).unwrap();
        assert_eq!(task.deadline, "2025-12-31");
        assert_eq!(task.display_deadline, "2025年12月下旬");
        assert_eq!(tracker.tasks(), &[task]);
        assert_eq!(form, TaskForm::default());
        assert!(stored(&tracker).unwrap().contains("Report"));
    }

    #[test]
    fn test_empty_title_never_mutates_storage() {
        let (_dir, mut tracker) = tracker();
        tracker.submit(&mut TaskForm::exact("First", "2025-01-01")).unwrap();
        let before = stored(&tracker);

        let mut form = TaskForm::exact("   ", "2025-01-02");
        form.cover_image = Some(png_bytes());
        let err = tracker.submit(&mut form).unwrap_err();

        assert!(matches!(err, Error::Validation(ValidationError::MissingTitle)));
        assert_eq!(stored(&tracker), before);
        assert_eq!(tracker.tasks().len(), 1);
        assert_eq!(form.title, "   ");
        assert!(tracker.images().get(1).unwrap().is_none());
    }

    #[test]
    fn test_submit_from_archive_switches_to_active() {
        let (_dir, mut tracker) = tracker();
        tracker.set_scope(ViewScope::Archive);
        tracker.submit(&mut TaskForm::exact("Report", "2025-01-01")).unwrap();
        assert_eq!(tracker.view().scope, ViewScope::Active);

        tracker.set_scope(ViewScope::All);
        tracker.submit(&mut TaskForm::exact("Other", "2025-01-01")).unwrap();
        assert_eq!(tracker.view().scope, ViewScope::All);
    }

    #[test]
    fn test_submit_ids_are_unique() {
        let (_dir, mut tracker) = tracker();
        let a = tracker.submit(&mut TaskForm::exact("A", "2025-01-01")).unwrap();
        let b = tracker.submit(&mut TaskForm::exact("B", "2025-01-01")).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_submit_after_max_id_fails_before_storing_image() {
        let mut backend = MemoryKeyValueStore::new();
        backend
            .set_item(STORAGE_KEY, r#"[{"id": 9223372036854775807, "deadline": "2025-01-01"}]"#)
            .unwrap();
        let (_dir, mut tracker) = tracker_with(backend);
        let before = stored(&tracker);

        let mut form = TaskForm::exact("Report", "2025-06-01");
        form.cover_image = Some(png_bytes());
        let err = tracker.submit(&mut form).unwrap_err();

        assert!(matches!(err, Error::IdOverflow(i64::MAX)));
        assert_eq!(tracker.tasks().len(), 1);
        assert_eq!(stored(&tracker), before);
        assert!(tracker.images().get(1).unwrap().is_none());
    }

    #[test]
    fn test_quota_failure_rolls_back_and_deletes_image() {
        let (_dir, mut tracker) = tracker_with(MemoryKeyValueStore::with_quota(64));
        let mut form = TaskForm::exact("A title long enough to blow the tiny quota", "2025-01-01");
        form.cover_image = Some(png_bytes());

        let err = tracker.submit(&mut form).unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { .. }));
        assert!(tracker.tasks().is_empty());
        assert!(stored(&tracker).is_none());
        assert!(tracker.images().get(1).unwrap().is_none());
        assert!(!form.title.is_empty());
    }

    #[test]
    fn test_delete_removes_task_and_blob() {
        let (_dir, mut tracker) = tracker();
        let mut form = TaskForm::exact("Report", "2025-01-01");
        form.cover_image = Some(png_bytes());
        let task = tracker.submit(&mut form).unwrap();
        let image_id = task.cover_image_id.unwrap();

        let list = tracker.render();
        let patches = tracker.resolve_images(&list);
        assert!(patches[0].handle.is_some());

        tracker.delete_task(task.id).unwrap();
        assert!(tracker.task(task.id).is_none());
        assert!(tracker.images().get(image_id).unwrap().is_none());
        assert!(tracker.renderer().handles().handle_for(image_id).is_none());
        assert!(matches!(tracker.image(image_id), Err(Error::ImageNotFound(_))));
    }

    #[test]
    fn test_delete_proceeds_when_image_delete_fails() {
        let dir = TempDir::new().unwrap();
        let images = UndeletableImages(SqliteImageStore::new(dir.path().join("i.sqlite3")).unwrap());
        let mut tracker =
            Tracker::new(MemoryKeyValueStore::new(), images, Config::default(), EventLog::disabled());
        let mut form = TaskForm::exact("Report", "2025-01-01");
        form.cover_image = Some(png_bytes());
        let task = tracker.submit(&mut form).unwrap();

        tracker.delete_task(task.id).unwrap();
        assert!(tracker.tasks().is_empty());
        let warnings = tracker.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("could not delete cover image"));
    }

    #[test]
    fn test_delete_unknown_task() {
        let (_dir, mut tracker) = tracker();
        assert!(matches!(tracker.delete_task(5), Err(Error::TaskNotFound(5))));
    }

    #[test]
    fn test_toggles_and_progress() {
        let (_dir, mut tracker) = tracker();
        let task = tracker.submit(&mut TaskForm::exact("Report", "2025-01-01")).unwrap();

        assert!(tracker.toggle_complete(task.id).unwrap().completed);
        assert!(tracker.toggle_archive(task.id).unwrap().archived);
        assert!(tracker.render().cards.is_empty());

        tracker.set_scope(ViewScope::Archive);
        assert_eq!(tracker.render().cards.len(), 1);

        assert!(!tracker.toggle_archive(task.id).unwrap().archived);
        assert!(!tracker.toggle_complete(task.id).unwrap().completed);

        let updated = tracker.set_progress(task.id, 150).unwrap();
        assert_eq!(updated.progress, 150);
        tracker.set_scope(ViewScope::Active);
        assert_eq!(tracker.render().cards[0].progress, 100);
        assert!(matches!(tracker.set_progress(1, 10), Err(Error::TaskNotFound(1))));
    }

    #[test]
    fn test_open_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let id = {
            let mut tracker = Tracker::open(dir.path()).unwrap();
            tracker.submit(&mut TaskForm::exact("Report", "2025-01-01")).unwrap().id
        };

        let tracker = Tracker::open(dir.path()).unwrap();
        assert_eq!(tracker.task(id).unwrap().title, "Report");
    }

    #[test]
    fn test_open_writes_event_log_when_enabled() {
        let dir = TempDir::new().unwrap();
        Config { debug_logging: true, ..Config::default() }.save_to(dir.path()).unwrap();

        let mut tracker = Tracker::open(dir.path()).unwrap();
        tracker.submit(&mut TaskForm::exact("Report", "2025-01-01")).unwrap();

        let log = std::fs::read_to_string(paths::event_log_path(dir.path())).unwrap();
        assert!(log.contains("tracker_opened"));
        assert!(log.contains("task_added"));
    }
}
