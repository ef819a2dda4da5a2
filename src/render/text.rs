//! Terminal rendering of list views using Tera.
//!
//! Templates are embedded at build time so the binary has no runtime file
//! dependencies.

use crate::error::{Error, Result};
use crate::render::{ImagePatch, ListView, TaskCard, Thumbnail};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

/// Embedded templates by name.
static EMBEDDED_TEMPLATES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("list.tera", include_str!("../../templates/list.tera"));
    m.insert("task.tera", include_str!("../../templates/task.tera"));
    m
});

/// Compiled engine, or the compile error as text.
static TERA: Lazy<std::result::Result<Tera, String>> = Lazy::new(|| {
    let mut tera = Tera::default();
    for (name, content) in EMBEDDED_TEMPLATES.iter() {
        tera.add_raw_template(name, content).map_err(|e| format!("{name}: {e}"))?;
    }
    Ok(tera)
});

/// Text shown in the detail panel when there is no cover to display.
pub const NO_COVER_TEXT: &str = "表紙画像（未設定）";

const PROGRESS_CELLS: u8 = 10;

#[derive(Debug, Serialize)]
struct InfoRowText<'a> {
    label: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct CardText<'a> {
    id: i64,
    title: &'a str,
    deadline_text: &'a str,
    progress: u8,
    progress_bar: String,
    completed: bool,
    archived: bool,
    thumbnail: String,
    cover: String,
    info_rows: Vec<InfoRowText<'a>>,
    actions: Vec<&'static str>,
}

impl<'a> CardText<'a> {
    fn new(card: &'a TaskCard, patch: Option<&ImagePatch>) -> Self {
        let handle = patch.and_then(|p| p.handle.as_ref());
        let thumbnail = match (&card.thumbnail, handle) {
            (Thumbnail::Initial(initial), _) => initial.clone(),
            (Thumbnail::Image(_), Some(_)) => "🖼".to_string(),
            (Thumbnail::Image(_), None) => " ".to_string(),
        };
        let cover = handle.map_or_else(|| NO_COVER_TEXT.to_string(), |h| format!("表紙画像: {}", h.as_str()));

        Self {
            id: card.id,
            title: &card.title,
            deadline_text: &card.deadline_text,
            progress: card.progress,
            progress_bar: progress_bar(card.progress),
            completed: card.completed,
            archived: card.archived,
            thumbnail,
            cover,
            info_rows: card
                .info_rows
                .iter()
                .map(|row| InfoRowText { label: row.label, value: &row.value })
                .collect(),
            actions: card.actions.iter().map(|a| a.label()).collect(),
        }
    }
}

/// A ten-cell bar for a clamped progress value.
#[must_use]
pub fn progress_bar(progress: u8) -> String {
    let filled = progress.min(100) / PROGRESS_CELLS;
    (0..PROGRESS_CELLS).map(|i| if i < filled { '■' } else { '□' }).collect()
}

fn render(name: &str, context: &Context) -> Result<String> {
    let tera = (*TERA).as_ref().map_err(|e| Error::Template(e.clone()))?;
    tera.render(name, context)
        .map_err(|e| Error::Template(format!("Failed to render template {name}: {e}")))
}

fn patch_for(patches: &[ImagePatch], task_id: i64) -> Option<&ImagePatch> {
    patches.iter().find(|p| p.task_id == task_id)
}

/// Render the compact list.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_list(list: &ListView, patches: &[ImagePatch]) -> Result<String> {
    let cards: Vec<CardText<'_>> =
        list.cards.iter().map(|card| CardText::new(card, patch_for(patches, card.id))).collect();

    let mut context = Context::new();
    context.insert("scope", list.scope.as_str());
    context.insert("scope_icon", list.scope_icon);
    context.insert("cards", &cards);
    render("list.tera", &context)
}

/// Render the detail panel of one card.
///
/// # Errors
///
/// Returns an error if the template fails to render.
pub fn render_card(card: &TaskCard, patches: &[ImagePatch]) -> Result<String> {
    let mut context = Context::new();
    context.insert("card", &CardText::new(card, patch_for(patches, card.id)));
    render("task.tera", &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{build_list_view, TransientHandle};
    use crate::tasks::models::sample_task;
    use crate::view::{ViewScope, ViewState};

    #[test]
    fn test_all_embedded_templates_compile() {
        assert!(TERA.is_ok(), "{:?}", (*TERA).as_ref().err());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), "□□□□□□□□□□");
        assert_eq!(progress_bar(35), "■■■□□□□□□□");
        assert_eq!(progress_bar(100), "■■■■■■■■■■");
    }

    #[test]
    fn test_render_list() {
        let mut done = sample_task(2, "2025-01-02");
        done.completed = true;
        done.progress = 100;
        let list = build_list_view(&[sample_task(1, "2025-01-01"), done], &ViewState::default());

        let text = render_list(&list, &[]).unwrap();
        assert!(text.starts_with("📋 active (2)"));
        assert!(text.contains("[T] Task 1  2025-01-01"));
        assert!(text.contains("✓ [T] Task 2"));
        assert!(text.contains("■■■■■■■■■■ 100%"));
    }

    #[test]
    fn test_render_empty_list() {
        let list = build_list_view(&[], &ViewState::new(ViewScope::Archive));
        let text = render_list(&list, &[]).unwrap();
        assert!(text.starts_with("📦 archive (0)"));
        assert!(text.contains("(no tasks)"));
    }

    #[test]
    fn test_render_card_details() {
        let mut task = sample_task(1, "2025-01-01");
        task.submit_to = Some("Office".to_string());
        let list = build_list_view(&[task], &ViewState::default());

        let text = render_card(&list.cards[0], &[]).unwrap();
        assert!(text.contains("期限: 2025-01-01"));
        assert!(text.contains("提出先: Office"));
        assert!(text.contains(NO_COVER_TEXT));
        assert!(text.contains("タスクを完了 / タスクを削除"));
    }

    #[test]
    fn test_render_card_with_resolved_cover() {
        let mut task = sample_task(1, "2025-01-01");
        task.cover_image_id = Some(9);
        let list = build_list_view(&[task], &ViewState::default());
        let mut cache = crate::render::HandleCache::new();
        let handle: TransientHandle = cache.allocate(9, vec![1]);
        let patches = vec![ImagePatch { task_id: 1, image_id: 9, handle: Some(handle.clone()) }];

        let text = render_card(&list.cards[0], &patches).unwrap();
        assert!(text.contains(handle.as_str()));
        assert!(render_list(&list, &patches).unwrap().contains("[🖼]"));
    }
}
