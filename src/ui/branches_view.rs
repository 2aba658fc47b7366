use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::help_overlay;
use super::theme;
use super::util::{ellipsize, input_spans};
use crate::keymap::{key_list, Action, Keymap};
use crate::views::branches::{BranchesMode, BranchesView};

const SUBJECT_WIDTH: usize = 50;

pub fn draw_branches(f: &mut Frame, area: Rect, view: &BranchesView, keys: &Keymap) {
    f.render_widget(Paragraph::new(lines(view, keys)), area);
}

pub fn lines(view: &BranchesView, keys: &Keymap) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let force = matches!(view.mode, BranchesMode::ConfirmForceDelete { .. });

    if let (Some(e), false) = (&view.error, force) {
        lines.push(Line::styled(format!("Error: {}", e), theme::ERROR));
        lines.push(Line::default());
    }

    if !view.loaded {
        lines.push(Line::styled("Loading...", theme::MUTED));
        return lines;
    }
    if view.branches.is_empty() {
        lines.push(Line::styled("No branches found", theme::EMPTY_STATE));
        return lines;
    }

    lines.push(Line::styled("Branches", theme::SECTION_HEADER));
    lines.push(Line::default());

    let start = view.scroll.min(view.branches.len());
    let end = (start + view.visible_rows()).min(view.branches.len());
    if start > 0 {
        lines.push(Line::styled(format!("  ↑ {} more above", start), theme::MUTED));
    }
    for (i, branch) in view.branches.iter().enumerate().take(end).skip(start) {
        let cursor = if i == view.cursor { "> " } else { "  " };
        let marker = if branch.is_current { "* " } else { "  " };
        let name_style = if i == view.cursor {
            theme::LIST_SELECTED
        } else if branch.is_current {
            theme::STAGED
        } else {
            ratatui::style::Style::new()
        };
        let mut spans = vec![
            Span::raw(cursor),
            Span::styled(format!("{}{}", marker, branch.name), name_style),
        ];
        if let Some(track) = branch.track_label() {
            spans.push(Span::styled(format!(" {}", track), theme::MUTED));
        }
        if !branch.last_commit.is_empty() {
            spans.push(Span::styled(
                format!(" - {}", ellipsize(&branch.last_commit, SUBJECT_WIDTH)),
                theme::MUTED,
            ));
        }
        lines.push(Line::from(spans));
    }
    if end < view.branches.len() {
        lines.push(Line::styled(
            format!("  ↓ {} more below", view.branches.len() - end),
            theme::MUTED,
        ));
    }

    match &view.mode {
        BranchesMode::ConfirmDelete { name, input } => {
            lines.push(Line::default());
            let mut spans = vec![Span::styled(
                format!("Type '{}' to delete: ", name),
                theme::CONFIRM,
            )];
            spans.extend(input_spans(input));
            spans.push(Span::styled("  (esc to cancel)", theme::MUTED));
            lines.push(Line::from(spans));
        }
        BranchesMode::ConfirmForceDelete { name } => {
            lines.push(Line::default());
            if let Some(ref e) = view.error {
                lines.push(Line::styled(e.clone(), theme::ERROR));
            }
            lines.push(Line::styled(
                format!("Force delete '{}'? (y/n) ", name),
                theme::CONFIRM,
            ));
        }
        BranchesMode::NewBranch(input) => {
            lines.push(Line::default());
            let mut spans = vec![Span::raw("New branch name: ")];
            spans.extend(input_spans(input));
            spans.push(Span::styled(
                "  (enter to create, esc to cancel)",
                theme::MUTED,
            ));
            lines.push(Line::from(spans));
        }
        BranchesMode::Navigate if view.show_verbose_help => {
            let k = |a| keys.key(a);
            lines.push(Line::default());
            lines.extend(help_overlay::help_bar(vec![vec![
                (key_list(&[k(Action::Down), k(Action::Up)]), "navigate"),
                (key_list(&[k(Action::Right), "enter"]), "checkout"),
                (k(Action::NewBranch).to_string(), "new"),
                (k(Action::Delete).to_string(), "delete"),
                (k(Action::Help).to_string(), "help"),
                (key_list(&[k(Action::Left), "esc"]), "back"),
            ]]));
        }
        BranchesMode::Navigate | BranchesMode::Help => {}
    }
    lines
}
