use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::help_overlay;
use super::theme;
use super::util::{input_spans, plural};
use crate::keymap::{key_list, Action, Keymap};
use crate::model::status::{Section, StatusItem};
use crate::views::status::{StashScope, StatusMode, StatusView};

pub fn draw_status(f: &mut Frame, area: Rect, view: &StatusView, keys: &Keymap) {
    f.render_widget(Paragraph::new(lines(view, keys)), area);
}

fn section_style(section: Section) -> Style {
    match section {
        Section::Staged => theme::STAGED,
        Section::Unstaged => theme::UNSTAGED,
        Section::Untracked => theme::UNTRACKED,
    }
}

fn section_title(section: Section) -> &'static str {
    match section {
        Section::Staged => "Changes to be committed:",
        Section::Unstaged => "Changes not staged for commit:",
        Section::Untracked => "Untracked files:",
    }
}

pub fn lines(view: &StatusView, keys: &Keymap) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(ref e) = view.error {
        lines.push(Line::styled(format!("Error: {}", e), theme::ERROR));
    }

    let Some(ref status) = view.status else {
        lines.push(Line::styled("Loading...", theme::MUTED));
        return lines;
    };

    lines.push(Line::from(format!("On branch {}", view.branch.name)));
    lines.extend(view.branch.tracking_lines().into_iter().map(Line::from));

    if status.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from("Nothing to commit, working tree clean"));
        lines.extend(prompt(view));
        lines.extend(help_bar(view, keys));
        return lines;
    }

    if view.visual_anchor.is_some() {
        lines.push(Line::styled("-- VISUAL --", theme::SECTION_HEADER));
    } else {
        lines.push(Line::default());
    }

    let start = view.scroll.min(view.items.len());
    let end = (start + view.visible_rows()).min(view.items.len());

    if start > 0 {
        lines.push(Line::styled(
            format!("  ↑ {} more above", start),
            theme::MUTED,
        ));
    }

    for i in start..end {
        let item = &view.items[i];
        let opens_section = i == 0 || view.items[i - 1].section != item.section;
        if opens_section || i == start {
            lines.push(Line::styled(section_title(item.section), theme::SECTION_HEADER));
        }
        lines.push(item_line(item, i == view.cursor, view.selected.contains(&i)));

        let closes_section = view
            .items
            .get(i + 1)
            .map_or(true, |next| next.section != item.section);
        if closes_section {
            lines.push(Line::default());
        }
    }

    if end < view.items.len() {
        lines.push(Line::styled(
            format!("  ↓ {} more below", view.items.len() - end),
            theme::MUTED,
        ));
    }

    lines.extend(prompt(view));
    lines.extend(help_bar(view, keys));
    lines
}

fn item_line(item: &StatusItem, at_cursor: bool, selected: bool) -> Line<'static> {
    let prefix = if at_cursor { ">       " } else { "        " };
    let mut spans = vec![Span::raw(prefix)];

    if item.section == Section::Untracked {
        spans.push(Span::styled("??", theme::UNTRACKED));
    } else {
        for (c, style) in [
            (item.file.index, theme::STAGED),
            (item.file.work, theme::UNSTAGED),
        ] {
            if c == ' ' {
                spans.push(Span::raw(" "));
            } else {
                spans.push(Span::styled(c.to_string(), style));
            }
        }
    }
    spans.push(Span::raw(" "));
    spans.push(Span::styled(item.file.label(), section_style(item.section)));

    let line = Line::from(spans);
    if selected {
        line.style(theme::VISUAL)
    } else {
        line
    }
}

fn scope_subject(scope: &StashScope) -> String {
    match scope {
        StashScope::All => "all changes".to_string(),
        StashScope::Files(items) if items.len() == 1 => format!("'{}'", items[0].file.label()),
        StashScope::Files(items) => format!("{} files", items.len()),
    }
}

fn prompt(view: &StatusView) -> Vec<Line<'static>> {
    let mut lines = vec![Line::default()];
    match &view.mode {
        StatusMode::Navigate | StatusMode::Help => return Vec::new(),
        StatusMode::ConfirmDiscard { targets, confirm } => {
            let subject = match targets.as_slice() {
                [only] => format!("'{}'", only.file.label()),
                many => format!("{} files", many.len()),
            };
            lines.push(Line::styled(
                format!(
                    "Discard {}? Type 'yes' to confirm: {}",
                    subject, confirm.input
                ),
                theme::CONFIRM,
            ));
        }
        StatusMode::ConfirmPush => {
            let ahead = view.branch.ahead as usize;
            lines.push(Line::styled(
                format!(
                    "Push {} {} to '{}'? (y/n) ",
                    ahead,
                    plural(ahead, "commit", "commits"),
                    view.branch.upstream
                ),
                theme::CONFIRM,
            ));
        }
        StatusMode::ConfirmPushNew { remote } => {
            lines.push(Line::styled(
                format!(
                    "Push branch '{}' to '{}'? (y/n) ",
                    view.branch.name, remote
                ),
                theme::CONFIRM,
            ));
        }
        StatusMode::ConfirmStash { scope, confirm, .. } => {
            lines.push(Line::styled(
                format!(
                    "Stash {}? Type 'yes' to confirm: {}",
                    scope_subject(scope),
                    confirm.input
                ),
                theme::CONFIRM,
            ));
        }
        StatusMode::StashInput { scope, input } => {
            lines.push(Line::from(format!("Stash {}", scope_subject(scope))));
            let mut spans = vec![Span::raw("Stash message: ")];
            spans.extend(input_spans(input));
            spans.push(Span::styled("  (enter to confirm, esc to cancel)", theme::MUTED));
            lines.push(Line::from(spans));
        }
        StatusMode::CommitInput(input) => {
            let mut spans = vec![Span::raw("Commit message: ")];
            spans.extend(input_spans(input));
            spans.push(Span::styled("  (enter to commit, esc to cancel)", theme::MUTED));
            lines.push(Line::from(spans));
        }
    }
    lines
}

fn help_bar(view: &StatusView, keys: &Keymap) -> Vec<Line<'static>> {
    if !view.show_verbose_help {
        return Vec::new();
    }
    let k = |a| keys.key(a);
    let mut lines = vec![Line::default()];
    lines.extend(help_overlay::help_bar(vec![
        vec![
            (key_list(&[k(Action::Down), k(Action::Up)]), "navigate"),
            ("SPACE".to_string(), "stage/unstage"),
            (key_list(&[k(Action::Stage), k(Action::StageAll)]), "stage"),
            (key_list(&[k(Action::Unstage), k(Action::UnstageAll)]), "unstage"),
            (k(Action::Discard).to_string(), "discard"),
            (key_list(&[k(Action::Commit), k(Action::CommitEdit)]), "commit"),
            (k(Action::Push).to_string(), "push"),
        ],
        vec![
            (k(Action::Select).to_string(), "select"),
            (k(Action::Visual).to_string(), "visual"),
            (k(Action::FileDiff).to_string(), "diff"),
            (k(Action::AllDiffs).to_string(), "all diffs"),
            (k(Action::Branches).to_string(), "branches"),
            (k(Action::Stashes).to_string(), "stashes"),
            (k(Action::Log).to_string(), "log"),
            (k(Action::VerboseHelp).to_string(), "hide help"),
        ],
    ]));
    lines
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::data::worker::Outcome;
    use crate::model::status::{BranchStatus, FileStatus, StatusResult};
    use crate::ui::util::line_text;
    use crate::views::status::tests::key;

    fn file(path: &str, index: char, work: char) -> FileStatus {
        FileStatus {
            path: path.to_string(),
            display_path: path.to_string(),
            index,
            work,
            original_path: None,
            original_display_path: None,
        }
    }

    fn view_with(files: Vec<FileStatus>, height: u16) -> StatusView {
        let keys = Rc::new(Keymap::default());
        let mut view = StatusView::new(keys, false, height);
        let mut status = StatusResult::default();
        for f in files {
            status.push(f);
        }
        view.apply(Outcome::Status {
            status,
            branch: BranchStatus {
                name: "main".to_string(),
                upstream: "origin/main".to_string(),
                ahead: 2,
                behind: 0,
            },
            background: false,
        });
        view
    }

    fn texts(view: &StatusView) -> Vec<String> {
        lines(view, &Keymap::default()).iter().map(line_text).collect()
    }

    #[test]
    fn loading_before_first_status() {
        let view = StatusView::new(Rc::new(Keymap::default()), false, 30);
        assert_eq!(texts(&view), vec!["Loading..."]);
    }

    #[test]
    fn sections_render_like_git_status() {
        let view = view_with(
            vec![file("a.rs", 'M', ' '), file("b.rs", ' ', 'M'), file("c.rs", '?', '?')],
            40,
        );
        let text = texts(&view);
        assert_eq!(text[0], "On branch main");
        assert_eq!(text[1], "Your branch is ahead of 'origin/main' by 2 commits.");
        assert_eq!(text[2], "");
        assert_eq!(text[3], "Changes to be committed:");
        assert_eq!(text[4], ">       M  a.rs");
        assert_eq!(text[5], "");
        assert_eq!(text[6], "Changes not staged for commit:");
        assert_eq!(text[7], "         M b.rs");
        assert_eq!(text[9], "Untracked files:");
        assert_eq!(text[10], "        ?? c.rs");
    }

    #[test]
    fn clean_tree_message() {
        let view = view_with(Vec::new(), 40);
        let text = texts(&view);
        assert!(text.contains(&"Nothing to commit, working tree clean".to_string()));
    }

    #[test]
    fn overflow_indicators() {
        let files = (0..20).map(|i| file(&format!("f{:02}", i), ' ', 'M')).collect();
        let mut view = view_with(files, 17);
        assert_eq!(view.visible_rows(), 5);
        view.handle_key(key('G'));
        let text = texts(&view);
        assert!(text.contains(&"  ↑ 15 more above".to_string()));
        assert!(text.contains(&"Changes not staged for commit:".to_string()));
        assert!(!text.iter().any(|l| l.contains("more below")));
    }

    #[test]
    fn push_prompt_counts_commits() {
        let mut view = view_with(vec![file("a.rs", ' ', 'M')], 40);
        view.mode = StatusMode::ConfirmPush;
        let text = texts(&view);
        assert!(text.contains(&"Push 2 commits to 'origin/main'? (y/n) ".to_string()));
    }

    #[test]
    fn verbose_help_follows_bindings() {
        let mut view = view_with(vec![file("a.rs", ' ', 'M')], 40);
        view.show_verbose_help = true;
        let text = texts(&view);
        let bar = text.iter().find(|l| l.starts_with("j/k navigate")).cloned();
        assert!(bar.is_some_and(|l| l.contains("a/A stage")));
    }
}
