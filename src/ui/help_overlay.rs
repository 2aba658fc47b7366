use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::theme;
use super::util::pad_to;
use crate::keymap::{double_key, key_list, Action, Keymap};

const RULE: &str = "─────────────────────────────────────────────────────────────────";
const COLUMN_WIDTH: usize = 18;

/// Draw help lines in a centered box over a cleared screen.
pub fn draw_help(f: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    f.render_widget(Clear, area);

    let widest = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
    let width = (widest + 4).min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);

    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(area.width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vert[1]);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(theme::BORDER_ACTIVE);

    f.render_widget(Paragraph::new(lines).block(block), horiz[1]);
}

/// Title followed by `key  description` rows.
fn table(title: &str, rows: Vec<(String, &'static str)>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(title.to_string(), theme::HELP_TITLE)),
        Line::from(""),
    ];
    for (key, desc) in rows {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(pad_to(&key, 8), theme::HELP_KEY),
            Span::raw("  "),
            Span::styled(desc, theme::HELP_DESC),
        ]));
    }
    lines
}

/// Status view help: five titled columns laid side by side.
pub fn status_help(keys: &Keymap) -> Vec<Line<'static>> {
    let k = |a| keys.key(a);
    let top = double_key(k(Action::Top));
    let columns: Vec<(&str, Vec<(String, &str)>)> = vec![
        (
            "Navigation",
            vec![
                (key_list(&[k(Action::Down), k(Action::Up)]), "up/down"),
                (key_list(&[top.as_str(), k(Action::Bottom)]), "top/bottom"),
                (k(Action::Select).to_string(), "select"),
                (k(Action::Visual).to_string(), "visual"),
            ],
        ),
        (
            "Staging",
            vec![
                ("SPACE".to_string(), "toggle"),
                (key_list(&[k(Action::Stage), k(Action::StageAll)]), "stage"),
                (key_list(&[k(Action::Unstage), k(Action::UnstageAll)]), "unstage"),
                (k(Action::Discard).to_string(), "discard"),
            ],
        ),
        (
            "Actions",
            vec![
                (key_list(&[k(Action::Commit), k(Action::CommitEdit)]), "commit"),
                (k(Action::Push).to_string(), "push"),
                (key_list(&[k(Action::Stash), k(Action::StashAll)]), "stash"),
            ],
        ),
        (
            "Views",
            vec![
                (key_list(&[k(Action::FileDiff), k(Action::Right)]), "file diff"),
                (key_list(&[k(Action::AllDiffs), k(Action::FullDiff)]), "all diffs"),
                (k(Action::Branches).to_string(), "branches"),
                (k(Action::Stashes).to_string(), "stashes"),
                (k(Action::Log).to_string(), "log"),
            ],
        ),
        (
            "General",
            vec![
                (k(Action::Help).to_string(), "help"),
                (k(Action::VerboseHelp).to_string(), "help mode"),
                (key_list(&[k(Action::Quit), "esc"]), "quit"),
            ],
        ),
    ];

    let mut header = Vec::new();
    for (title, _) in &columns {
        header.push(Span::styled(title.to_string(), theme::SECTION_HEADER));
        header.push(Span::raw(" ".repeat(COLUMN_WIDTH.saturating_sub(title.len()))));
    }
    let mut lines = vec![Line::from(header)];

    let rows = columns.iter().map(|(_, items)| items.len()).max().unwrap_or(0);
    for row in 0..rows {
        let mut spans = Vec::new();
        for (_, items) in &columns {
            match items.get(row) {
                Some((key, desc)) => {
                    let key = pad_to(key, 6);
                    let used = key.chars().count() + desc.chars().count();
                    spans.push(Span::styled(key, theme::HELP_KEY));
                    spans.push(Span::styled(desc.to_string(), theme::HELP_DESC));
                    spans.push(Span::raw(" ".repeat(COLUMN_WIDTH.saturating_sub(used))));
                }
                None => spans.push(Span::raw(" ".repeat(COLUMN_WIDTH))),
            }
        }
        lines.push(Line::from(spans));
    }
    lines
}

pub fn diff_help(keys: &Keymap) -> Vec<Line<'static>> {
    let k = |a| keys.key(a);
    table(
        "Diff View Shortcuts",
        vec![
            (key_list(&[k(Action::Right), "→", "enter"]), "View hunk detail (scrollable)"),
            (key_list(&[k(Action::Left), "←", "esc"]), "Go back"),
            (key_list(&[k(Action::Down), k(Action::Up), "↓", "↑"]), "Navigate / scroll"),
            (double_key(k(Action::Top)), "Go to top"),
            (k(Action::Bottom).to_string(), "Go to bottom"),
            ("SPACE".to_string(), "Toggle stage/unstage hunk"),
            (k(Action::Stage).to_string(), "Stage hunk"),
            (k(Action::Unstage).to_string(), "Unstage hunk"),
            (k(Action::Discard).to_string(), "Discard hunk (unstaged only)"),
            (k(Action::Help).to_string(), "Toggle help"),
            (k(Action::Quit).to_string(), "Quit"),
        ],
    )
}

pub fn branches_help(keys: &Keymap) -> Vec<Line<'static>> {
    let k = |a| keys.key(a);
    table(
        "Branches Shortcuts",
        vec![
            (key_list(&[k(Action::Down), k(Action::Up), "↓", "↑"]), "Move down/up"),
            (double_key(k(Action::Top)), "Go to top"),
            (k(Action::Bottom).to_string(), "Go to bottom"),
            (key_list(&[k(Action::Right), "enter", "→"]), "Checkout branch"),
            (k(Action::NewBranch).to_string(), "Create new branch"),
            (k(Action::Delete).to_string(), "Delete branch"),
            (k(Action::Help).to_string(), "Toggle help"),
            (key_list(&[k(Action::Left), "←", "esc"]), "Go back"),
        ],
    )
}

pub fn stashes_help(keys: &Keymap) -> Vec<Line<'static>> {
    let k = |a| keys.key(a);
    table(
        "Stashes Shortcuts",
        vec![
            (key_list(&[k(Action::Down), k(Action::Up), "↓", "↑"]), "Move down/up"),
            (double_key(k(Action::Top)), "Go to top"),
            (k(Action::Bottom).to_string(), "Go to bottom"),
            (key_list(&[k(Action::Right), "→"]), "View stash diff"),
            (k(Action::Stage).to_string(), "Apply stash (keep in list)"),
            (k(Action::Push).to_string(), "Pop stash (apply and remove)"),
            (k(Action::Delete).to_string(), "Drop stash (delete)"),
            (k(Action::Help).to_string(), "Toggle help"),
            (key_list(&[k(Action::Left), "←", "esc"]), "Go back"),
        ],
    )
}

pub fn stash_diff_help(keys: &Keymap) -> Vec<Line<'static>> {
    let k = |a| keys.key(a);
    table(
        "Stash Diff Shortcuts",
        vec![
            (key_list(&[k(Action::Right), "→"]), "View hunk detail"),
            (key_list(&[k(Action::Left), "←", "esc"]), "Go back"),
            (key_list(&[k(Action::Down), k(Action::Up), "↓", "↑"]), "Navigate / scroll"),
            (key_list(&[k(Action::Top), k(Action::Bottom)]), "Go to top/bottom"),
            (k(Action::Help).to_string(), "Toggle help"),
        ],
    )
}

pub fn log_help(keys: &Keymap) -> Vec<Line<'static>> {
    let k = |a| keys.key(a);
    table(
        "Log Shortcuts",
        vec![
            (key_list(&[k(Action::Down), k(Action::Up), "↓", "↑"]), "Scroll"),
            ("ctrl+d/ctrl+u".to_string(), "Half page down/up"),
            (key_list(&[k(Action::Top), k(Action::Bottom)]), "Go to top/bottom"),
            (k(Action::Help).to_string(), "Toggle help"),
            (key_list(&[k(Action::Left), "esc", k(Action::Log)]), "Go back"),
        ],
    )
}

/// Muted rule followed by `key desc` pairs, one line per group.
pub fn help_bar(groups: Vec<Vec<(String, &'static str)>>) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(RULE, theme::MUTED)];
    for group in groups {
        let mut spans = Vec::new();
        for (key, desc) in group {
            spans.push(Span::styled(key, theme::HELP_KEY));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(desc, theme::HELP_DESC));
            spans.push(Span::raw("  "));
        }
        lines.push(Line::from(spans));
    }
    lines
}

pub fn rule() -> Line<'static> {
    Line::styled(RULE, theme::MUTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::util::line_text;

    #[test]
    fn status_columns_use_live_bindings() {
        let keys = Keymap::with_overrides([("stage", "x")]).unwrap();
        let lines = status_help(&keys);
        let header = line_text(&lines[0]);
        assert!(header.starts_with("Navigation        Staging"));
        assert!(lines.iter().any(|l| line_text(l).contains("x/A   stage")));
        assert!(lines.iter().any(|l| line_text(l).contains("gg/G  top/bottom")));
        assert!(lines.iter().any(|l| line_text(l).contains("q/ESC quit")));
    }

    #[test]
    fn tables_pad_keys() {
        let lines = diff_help(&Keymap::default());
        assert_eq!(line_text(&lines[0]), "Diff View Shortcuts");
        assert_eq!(
            line_text(&lines[2]),
            "  l/→/Enter  View hunk detail (scrollable)"
        );
        assert_eq!(line_text(&lines[5]), "  gg        Go to top");
    }
}
