use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::theme;
use super::util::{anchor_bottom, diff_line};
use crate::model::diff::Hunk;
use crate::views::diff::{DiffMode, DiffView, Pane};
use crate::views::scroll_to;
use crate::views::stash_diff::{StashDiffMode, StashDiffView};

pub fn draw_diff(f: &mut Frame, area: Rect, view: &DiffView) {
    let lines = anchor_bottom(lines(view), area.height);
    f.render_widget(Paragraph::new(lines), area);
}

pub fn draw_stash_diff(f: &mut Frame, area: Rect, view: &StashDiffView) {
    let lines = anchor_bottom(stash_lines(view), area.height);
    f.render_widget(Paragraph::new(lines), area);
}

fn side_label(hunk: &Hunk) -> &'static str {
    if hunk.staged {
        "[Staged]"
    } else {
        "[Unstaged]"
    }
}

fn title(tag: Option<&str>, hunk: &Hunk) -> Line<'static> {
    let text = match tag {
        Some(tag) => format!("─── {} {} {} ───", tag, hunk.display_path, hunk.header),
        None => format!("─── {} {} ───", hunk.display_path, hunk.header),
    };
    Line::styled(text, theme::SECTION_HEADER)
}

/// Scrolled window into one hunk followed by its title.
fn detail(
    hunk: &Hunk,
    tag: Option<&str>,
    scroll: usize,
    rows: usize,
    lines: &mut Vec<Line<'static>>,
) {
    let total = hunk.lines.len();
    let start = scroll.min(total);
    let end = (start + rows).min(total);
    lines.extend(hunk.lines[start..end].iter().map(diff_line));
    lines.push(Line::default());
    if total > rows {
        lines.push(Line::styled(
            format!("Lines {}-{} of {}", start + 1, end, total),
            theme::MUTED,
        ));
    }
    lines.push(title(tag, hunk));
}

struct HunkList<'a> {
    hunks: &'a [Hunk],
    cursor: usize,
    offset: usize,
    rows: usize,
    height: u16,
    tagged: bool,
}

impl HunkList<'_> {
    /// Preview of the cursor hunk above a windowed list of all hunks.
    fn render(&self, lines: &mut Vec<Line<'static>>) {
        let start = self.offset.min(self.hunks.len());
        let end = (start + self.rows).min(self.hunks.len());
        let indicators = usize::from(start > 0) + usize::from(end < self.hunks.len());
        let fixed = (end - start) + indicators;

        if let Some(hunk) = self.hunks.get(self.cursor) {
            let tag = self.tagged.then(|| side_label(hunk));
            lines.push(title(tag, hunk));
            let height = usize::from(self.height);
            let available = if height > fixed + 5 {
                height - fixed - 5
            } else {
                50
            };
            lines.extend(hunk.lines.iter().take(available).map(diff_line));
            if hunk.lines.len() > available {
                lines.push(Line::styled(
                    format!(
                        "... {} more lines (l/→ to view full hunk)",
                        hunk.lines.len() - available
                    ),
                    theme::MUTED,
                ));
            }
            lines.push(Line::default());
        }

        if start > 0 {
            lines.push(Line::styled(format!("  ↑ {} more above", start), theme::MUTED));
        }
        for (i, hunk) in self.hunks.iter().enumerate().take(end).skip(start) {
            let cursor = if i == self.cursor { "> " } else { "  " };
            let mut spans = vec![Span::raw(cursor)];
            if self.tagged {
                if hunk.staged {
                    spans.push(Span::styled("[S]", theme::HUNK_STAGED));
                } else {
                    spans.push(Span::styled("[U]", theme::HUNK_UNSTAGED));
                }
                spans.push(Span::raw(" "));
            }
            spans.push(Span::raw(format!(
                "@@ {} +{} -{}",
                hunk.display_path,
                hunk.additions(),
                hunk.deletions()
            )));
            let line = Line::from(spans);
            lines.push(if i == self.cursor {
                line.style(theme::LIST_SELECTED)
            } else {
                line
            });
        }
        if end < self.hunks.len() {
            lines.push(Line::styled(
                format!("  ↓ {} more below", self.hunks.len() - end),
                theme::MUTED,
            ));
        }
    }
}

pub fn lines(view: &DiffView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(ref e) = view.error {
        lines.push(Line::styled(format!("Error: {}", e), theme::ERROR));
    }
    if !view.loaded {
        lines.push(Line::styled("Loading...", theme::MUTED));
        return lines;
    }
    if view.hunks.is_empty() {
        lines.push(Line::styled("No changes", theme::EMPTY_STATE));
        return lines;
    }

    let pane = match &view.mode {
        DiffMode::List => Pane::List,
        DiffMode::Detail => Pane::Detail,
        DiffMode::ConfirmDiscard { back, .. } | DiffMode::Help { back } => *back,
    };

    match (pane, view.current_hunk()) {
        (Pane::Detail, Some(hunk)) => detail(
            hunk,
            Some(side_label(hunk)),
            view.scroll,
            view.detail_rows(),
            &mut lines,
        ),
        _ => HunkList {
            hunks: &view.hunks,
            cursor: view.cursor,
            offset: view.list_scroll,
            rows: view.list_rows(),
            height: view.height,
            tagged: true,
        }
        .render(&mut lines),
    }

    if let (DiffMode::ConfirmDiscard { confirm, .. }, Some(hunk)) =
        (&view.mode, view.current_hunk())
    {
        lines.push(Line::default());
        lines.push(Line::styled(
            format!(
                "Discard hunk from '{}'? Type 'yes' to confirm: {}",
                hunk.display_path, confirm.input
            ),
            theme::CONFIRM,
        ));
    }
    lines
}

pub fn stash_lines(view: &StashDiffView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(ref e) = view.error {
        lines.push(Line::styled(format!("Error: {}", e), theme::ERROR));
    }
    if !view.loaded {
        lines.push(Line::styled("Loading...", theme::MUTED));
        return lines;
    }
    if view.hunks.is_empty() {
        lines.push(Line::styled("No changes in stash", theme::EMPTY_STATE));
        return lines;
    }

    let in_detail = matches!(
        view.mode,
        StashDiffMode::Detail | StashDiffMode::Help { detail: true }
    );
    match (in_detail, view.current_hunk()) {
        (true, Some(hunk)) => detail(hunk, None, view.scroll, view.detail_rows(), &mut lines),
        _ => {
            let rows = view.detail_rows().clamp(1, 10);
            HunkList {
                hunks: &view.hunks,
                cursor: view.cursor,
                offset: scroll_to(view.cursor, 0, rows),
                rows,
                height: view.height,
                tagged: false,
            }
            .render(&mut lines)
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::data::worker::Outcome;
    use crate::keymap::Keymap;
    use crate::model::diff::{parse_diff, CombinedDiff};
    use crate::ui::util::line_text;
    use crate::views::status::tests::key;

    const TWO_HUNKS: &str = "\
diff --git a/a.txt b/a.txt
index 1111111..2222222 100644
--- a/a.txt
+++ b/a.txt
@@ -1,2 +1,2 @@
-one
+uno
 two
@@ -10,2 +10,3 @@ fn tail
 ten
+ten and a half
 eleven
";

    fn texts(lines: Vec<Line<'static>>) -> Vec<String> {
        lines.iter().map(line_text).collect()
    }

    fn loaded(text: &str) -> DiffView {
        let mut view = DiffView::new(Rc::new(Keymap::default()), Vec::new(), 40);
        view.apply(Outcome::Diff(CombinedDiff::unstaged_only(parse_diff(text))));
        view
    }

    #[test]
    fn states_before_content() {
        let view = DiffView::new(Rc::new(Keymap::default()), Vec::new(), 40);
        assert_eq!(texts(lines(&view)), vec!["Loading..."]);
        let view = loaded("");
        assert_eq!(texts(lines(&view)), vec!["No changes"]);
    }

    #[test]
    fn list_shows_preview_and_rows() {
        let view = loaded(TWO_HUNKS);
        let text = texts(lines(&view));
        assert_eq!(text[0], "─── [Unstaged] a.txt @@ -1,2 +1,2 @@ ───");
        assert_eq!(text[1], "-one");
        assert_eq!(text[4], "");
        assert_eq!(text[5], "> [U] @@ a.txt +1 -1");
        assert_eq!(text[6], "  [U] @@ a.txt +1 -0");
    }

    #[test]
    fn detail_ends_with_title() {
        let mut view = loaded(TWO_HUNKS);
        view.handle_key(key('l'));
        let text = texts(lines(&view));
        assert_eq!(text.last().map(String::as_str), Some("─── [Unstaged] a.txt @@ -1,2 +1,2 @@ ───"));
        assert!(!text.iter().any(|l| l.starts_with("Lines ")));
    }

    #[test]
    fn discard_prompt_echoes_input() {
        let mut view = loaded(TWO_HUNKS);
        view.handle_key(key('d'));
        view.handle_key(key('y'));
        let text = texts(lines(&view));
        assert_eq!(
            text.last().map(String::as_str),
            Some("Discard hunk from 'a.txt'? Type 'yes' to confirm: y")
        );
    }

    #[test]
    fn stash_rows_have_no_side_tag() {
        let mut view = StashDiffView::new(Rc::new(Keymap::default()), 0, 40);
        view.apply(Outcome::Diff(CombinedDiff::unstaged_only(parse_diff(TWO_HUNKS))));
        let text = texts(stash_lines(&view));
        assert_eq!(text[0], "─── a.txt @@ -1,2 +1,2 @@ ───");
        assert!(text.contains(&"> @@ a.txt +1 -1".to_string()));
    }
}
