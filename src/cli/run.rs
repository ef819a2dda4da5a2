//! Command execution for the CLI.
//!
//! This module handles running CLI commands and producing output.

use crate::cli::Command;
use crate::config;
use crate::error::Result;
use crate::form::{RoughPart, TaskForm, ValidationError};
use crate::render::text;
use crate::tasks::DeadlineType;
use crate::tracker::Tracker;
use crate::view::{ViewScope, ViewState};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

/// Arguments of the `add` command.
struct AddArgs {
    title: String,
    date: Option<String>,
    month: Option<String>,
    part: Option<String>,
    submit_to: Option<String>,
    cover: Option<PathBuf>,
    tags: Vec<String>,
    scope: Option<String>,
}

/// Run a CLI command against the data in `data_dir`.
pub fn run(command: Command, data_dir: &Path) -> CliOutput {
    match command {
        Command::Version => run_version(),
        Command::EnsureConfig => run_ensure_config(data_dir),
        Command::Add { title, date, month, part, submit_to, cover, tags, scope } => {
            let args = AddArgs { title, date, month, part, submit_to, cover, tags, scope };
            with_tracker(data_dir, |tracker| run_add(tracker, args))
        }
        Command::List { scope, tag, json } => {
            with_tracker(data_dir, |tracker| run_list(tracker, scope.as_deref(), tag, json))
        }
        Command::Show { id, json } => with_tracker(data_dir, |tracker| run_show(tracker, id, json)),
        Command::Complete { id } => with_tracker(data_dir, |tracker| {
            let task = tracker.toggle_complete(id)?;
            let state = if task.completed { "complete" } else { "incomplete" };
            Ok(success_output(format!("Marked task {id} {state}")))
        }),
        Command::Archive { id } => with_tracker(data_dir, |tracker| {
            let task = tracker.toggle_archive(id)?;
            let state = if task.archived { "Archived" } else { "Unarchived" };
            Ok(success_output(format!("{state} task {id}")))
        }),
        Command::Progress { id, value } => with_tracker(data_dir, |tracker| {
            let task = tracker.set_progress(id, value)?;
            Ok(success_output(format!("Set progress of task {id} to {}%", task.clamped_progress())))
        }),
        Command::Delete { id } => with_tracker(data_dir, |tracker| {
            let task = tracker.delete_task(id)?;
            Ok(success_output(format!("Deleted task {id}: {}", task.title)))
        }),
        Command::Image { id, out } => with_tracker(data_dir, |tracker| run_image(tracker, id, &out)),
    }
}

// === Utility Commands ===

fn run_version() -> CliOutput {
    success_output(format!("deadlines v{}", crate::VERSION))
}

fn run_ensure_config(data_dir: &Path) -> CliOutput {
    match config::ensure_config_in(data_dir) {
        Ok(config) => {
            let messages = vec![
                format!("Config ensured at {}", crate::paths::config_path(data_dir).display()),
                format!("  storage_quota_bytes: {}", config.storage_quota_bytes),
                format!("  cover_max_size: {}", config.cover_max_size),
                format!("  cover_quality: {}", config.cover_quality),
                format!("  cover_format: {}", config.cover_format.as_str()),
                format!("  debug_logging: {}", config.debug_logging),
            ];
            CliOutput { exit_code: ExitCode::SUCCESS, stdout: messages, stderr: vec![] }
        }
        Err(e) => error_output(format!("Error ensuring config: {e}")),
    }
}

// === Task Commands ===

/// Open the tracker, run `f`, and attach any warnings raised on the way.
fn with_tracker<F>(data_dir: &Path, f: F) -> CliOutput
where
    F: FnOnce(&mut Tracker) -> Result<CliOutput>,
{
    let mut tracker = match Tracker::open(data_dir) {
        Ok(tracker) => tracker,
        Err(e) => return error_output(format!("Error opening data in {}: {e}", data_dir.display())),
    };

    let mut output = f(&mut tracker).unwrap_or_else(|e| error_output(format!("Error: {e}")));
    let mut stderr: Vec<String> =
        tracker.take_warnings().into_iter().map(|w| format!("Warning: {w}")).collect();
    stderr.append(&mut output.stderr);
    output.stderr = stderr;
    output
}

fn run_add(tracker: &mut Tracker, args: AddArgs) -> Result<CliOutput> {
    if let Some(scope) = args.scope.as_deref() {
        tracker.set_scope(scope.parse()?);
    }

    let mut form = TaskForm {
        title: args.title,
        submit_to: args.submit_to.unwrap_or_default(),
        tag_ids: args.tags,
        ..TaskForm::default()
    };
    match (args.month, args.part) {
        (Some(month), part) => {
            form.deadline_type = DeadlineType::Rough;
            form.month = month;
            if let Some(part) = part {
                form.part = part.parse::<RoughPart>()?;
            }
        }
        (None, Some(_)) => return Err(ValidationError::PartWithoutMonth.into()),
        (None, None) => form.date = args.date.unwrap_or_default(),
    }
    if let Some(path) = args.cover {
        form.cover_image = Some(std::fs::read(path)?);
    }

    let task = tracker.submit(&mut form)?;
    Ok(success_output(format!(
        "Added task {}: {} ({}) [view: {}]",
        task.id,
        task.title,
        task.deadline_text(),
        tracker.view().scope
    )))
}

fn run_list(
    tracker: &mut Tracker,
    scope: Option<&str>,
    tag: Option<String>,
    json: bool,
) -> Result<CliOutput> {
    let view = match (scope.map(str::parse::<ViewScope>).transpose()?, tag) {
        (Some(ViewScope::Tag) | None, Some(tag)) => ViewState::tag(tag),
        (Some(scope), _) => ViewState::new(scope),
        (None, None) => ViewState::default(),
    };
    tracker.apply_view(view);

    let list = tracker.render();
    if json {
        return Ok(json_output(&list));
    }
    let patches = tracker.resolve_images(&list);
    Ok(success_output(text::render_list(&list, &patches)?))
}

fn run_show(tracker: &mut Tracker, id: i64, json: bool) -> Result<CliOutput> {
    tracker.set_scope(ViewScope::All);
    let list = tracker.render();
    let Some(card) = list.cards.iter().find(|c| c.id == id) else {
        return Ok(error_output(format!("Task not found: {id}")));
    };
    if json {
        return Ok(json_output(card));
    }
    let patches = tracker.resolve_images(&list);
    Ok(success_output(text::render_card(card, &patches)?))
}

fn run_image(tracker: &mut Tracker, id: i64, out: &Path) -> Result<CliOutput> {
    let record = tracker.image(id)?;
    std::fs::write(out, &record.blob)?;
    let created = chrono::DateTime::from_timestamp_millis(record.created_at)
        .map_or_else(|| record.created_at.to_string(), |dt| dt.to_rfc3339());
    Ok(success_output(format!(
        "Wrote image {id} ({} bytes, created {created}) to {}",
        record.blob.len(),
        out.display()
    )))
}

// === Helpers ===

fn json_output<T: Serialize>(value: &T) -> CliOutput {
    match serde_json::to_string_pretty(value) {
        Ok(json) => CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![json], stderr: vec![] },
        Err(e) => error_output(e.to_string()),
    }
}

fn success_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![message], stderr: vec![] }
}

fn error_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message] }
}
