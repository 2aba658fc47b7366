use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::help_overlay;
use super::theme;
use crate::keymap::{key_list, Action, Keymap};
use crate::views::stashes::{StashesMode, StashesView};

pub fn draw_stashes(f: &mut Frame, area: Rect, view: &StashesView, keys: &Keymap) {
    f.render_widget(Paragraph::new(lines(view, keys)), area);
}

pub fn lines(view: &StashesView, keys: &Keymap) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(ref e) = view.error {
        lines.push(Line::styled(format!("Error: {}", e), theme::ERROR));
    }
    if !view.loaded {
        lines.push(Line::styled("Loading...", theme::MUTED));
        return lines;
    }
    if view.stashes.is_empty() {
        lines.push(Line::styled("No stashes", theme::EMPTY_STATE));
        return lines;
    }

    lines.push(Line::from(vec![
        Span::styled("> git stash list", theme::SECTION_HEADER),
        Span::raw("  "),
        Span::styled("(esc to go back)", theme::MUTED),
    ]));
    lines.push(help_overlay::rule());
    lines.push(Line::default());

    let start = view.scroll.min(view.stashes.len());
    let end = (start + view.visible_rows()).min(view.stashes.len());
    if start > 0 {
        lines.push(Line::styled(format!("  ↑ {} more above", start), theme::MUTED));
    }
    for (i, stash) in view.stashes.iter().enumerate().take(end).skip(start) {
        if i == view.cursor {
            lines.push(Line::styled(format!("> {}", stash.label()), theme::LIST_SELECTED));
        } else {
            lines.push(Line::from(format!("  {}", stash.label())));
        }
    }
    if end < view.stashes.len() {
        lines.push(Line::styled(
            format!("  ↓ {} more below", view.stashes.len() - end),
            theme::MUTED,
        ));
    }

    match &view.mode {
        StashesMode::Confirm { action, stash } => {
            lines.push(Line::default());
            lines.push(Line::styled(
                format!("{} {}? (y/n) ", action.verb(), stash.reference()),
                theme::CONFIRM,
            ));
        }
        StashesMode::Navigate if view.show_verbose_help => {
            let k = |a| keys.key(a);
            lines.push(Line::default());
            lines.extend(help_overlay::help_bar(vec![vec![
                (key_list(&[k(Action::Down), k(Action::Up)]), "navigate"),
                (key_list(&[k(Action::Right), "→"]), "view diff"),
                (k(Action::Stage).to_string(), "apply"),
                (k(Action::Push).to_string(), "pop"),
                (k(Action::Delete).to_string(), "drop"),
                (k(Action::Help).to_string(), "help"),
                (key_list(&[k(Action::Left), "esc"]), "back"),
            ]]));
        }
        StashesMode::Navigate | StashesMode::Help => {}
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::data::worker::Outcome;
    use crate::model::stash::Stash;
    use crate::ui::util::line_text;
    use crate::views::status::tests::key;

    fn loaded(verbose: bool) -> StashesView {
        let mut view = StashesView::new(Rc::new(Keymap::default()), verbose, 30);
        view.apply(Outcome::Stashes(vec![
            Stash {
                index: 0,
                branch: "main".to_string(),
                message: "WIP on main: tidy".to_string(),
            },
            Stash {
                index: 1,
                branch: String::new(),
                message: "older".to_string(),
            },
        ]));
        view
    }

    fn texts(view: &StashesView) -> Vec<String> {
        lines(view, &Keymap::default()).iter().map(line_text).collect()
    }

    #[test]
    fn list_with_header() {
        let text = texts(&loaded(false));
        assert_eq!(text[0], "> git stash list  (esc to go back)");
        assert_eq!(text[3], "> stash@{0} on main: WIP on main: tidy");
        assert_eq!(text[4], "  stash@{1}: older");
    }

    #[test]
    fn confirm_names_the_stash() {
        let mut view = loaded(true);
        view.handle_key(key('j'));
        view.handle_key(key('p'));
        let text = texts(&view);
        assert_eq!(text.last().map(String::as_str), Some("Pop stash@{1}? (y/n) "));
        assert!(!text.iter().any(|l| l.contains("view diff")));
    }

    #[test]
    fn empty_state() {
        let mut view = StashesView::new(Rc::new(Keymap::default()), false, 30);
        view.apply(Outcome::Stashes(Vec::new()));
        assert_eq!(texts(&view), vec!["No stashes"]);
    }
}
