use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::{
    branches_view, diff_view, help_overlay, log_view, stashes_view, status_view, theme,
};
use crate::app::{App, View};
use crate::keymap::{key_label, Action};
use crate::views::branches::BranchesMode;
use crate::views::diff::DiffMode;
use crate::views::stash_diff::StashDiffMode;
use crate::views::stashes::StashesMode;
use crate::views::status::StatusMode;

pub fn draw_layout(f: &mut Frame, app: &App) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_content(f, chunks[0], app);
    draw_status_bar(f, chunks[1], app);

    if let Some((title, lines)) = help_for(app) {
        let area = f.area();
        help_overlay::draw_help(f, area, title, lines);
    }
}

fn draw_content(f: &mut Frame, area: Rect, app: &App) {
    let keys = &app.keys;
    match &app.view {
        View::Status => status_view::draw_status(f, area, &app.status, keys),
        View::Diff(v) => diff_view::draw_diff(f, area, v),
        View::Branches(v) => branches_view::draw_branches(f, area, v, keys),
        View::Stashes(v) => stashes_view::draw_stashes(f, area, v, keys),
        View::StashDiff(_, v) => diff_view::draw_stash_diff(f, area, v),
        View::Log(v) => log_view::draw_log(f, area, v),
    }
}

/// Help popup for the front view, when it is showing help.
fn help_for(app: &App) -> Option<(&'static str, Vec<Line<'static>>)> {
    let keys = &app.keys;
    match &app.view {
        View::Status if app.status.mode == StatusMode::Help => {
            Some(("Help", help_overlay::status_help(keys)))
        }
        View::Diff(v) if matches!(v.mode, DiffMode::Help { .. }) => {
            Some(("Help", help_overlay::diff_help(keys)))
        }
        View::Branches(v) if v.mode == BranchesMode::Help => {
            Some(("Help", help_overlay::branches_help(keys)))
        }
        View::Stashes(v) if v.mode == StashesMode::Help => {
            Some(("Help", help_overlay::stashes_help(keys)))
        }
        View::StashDiff(_, v) if matches!(v.mode, StashDiffMode::Help { .. }) => {
            Some(("Help", help_overlay::stash_diff_help(keys)))
        }
        View::Log(v) if v.show_help => Some(("Help", help_overlay::log_help(keys))),
        _ => None,
    }
}

/// Right-hand context for the status bar.
fn context(app: &App) -> Option<String> {
    match &app.view {
        View::Status => app.status.current_item().map(|item| item.file.description()),
        View::Diff(v) if !v.hunks.is_empty() => {
            Some(format!("hunk {}/{}", v.cursor + 1, v.hunks.len()))
        }
        View::Branches(v) => v.current_branch().map(|b| b.name.clone()),
        View::Stashes(v) => v.current_stash().map(|s| s.reference()),
        View::StashDiff(_, v) => Some(crate::model::stash::stash_ref(v.index)),
        _ => None,
    }
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut left_spans: Vec<Span> = vec![Span::styled(
        format!(" {} ", app.view.name()),
        theme::VIEW_BADGE,
    )];

    if matches!(app.view, View::Status) && app.status.visual_anchor.is_some() {
        left_spans.push(Span::styled(" VISUAL ", theme::VISUAL_BADGE));
    }
    if let Some(text) = context(app) {
        left_spans.push(Span::styled(format!(" {} ", text), theme::STATUS_BAR));
    }

    let keys = &app.keys;
    let back = if matches!(app.view, View::Status) {
        (key_label(keys.key(Action::Quit)), "quit")
    } else {
        (key_label("esc"), "back")
    };
    let hints = [(key_label(keys.key(Action::Help)), "help"), back];

    let mut hint_spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints.into_iter().enumerate() {
        if i > 0 {
            hint_spans.push(Span::styled("  ", theme::STATUS_BAR));
        }
        hint_spans.push(Span::styled(key, theme::HINT_KEY));
        hint_spans.push(Span::styled(":", theme::HINT_DESC));
        hint_spans.push(Span::styled(desc, theme::HINT_DESC));
    }
    hint_spans.push(Span::styled(" ", theme::STATUS_BAR));

    let left_width: usize = left_spans.iter().map(|s| s.width()).sum();
    let hint_width: usize = hint_spans.iter().map(|s| s.width()).sum();
    let gap = usize::from(area.width).saturating_sub(left_width + hint_width);

    let mut spans = left_spans;
    spans.push(Span::styled(" ".repeat(gap), theme::STATUS_BAR));
    spans.extend(hint_spans);

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
