use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use super::theme;
use crate::model::diff::{DiffLine, LineKind};
use crate::views::TextInput;

/// Truncate a string to at most `max_chars` Unicode scalar values.
/// Returns a borrowed slice if possible; no allocation when not truncated.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Shorten to `max_chars`, ending in `...` when cut.
pub fn ellipsize(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", truncate_chars(s, max_chars.saturating_sub(3)))
    }
}

/// Right-pad to `width` display columns.
pub fn pad_to(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(w)))
}

/// Prepend blank lines so the content sits at the bottom of `height` rows.
pub fn anchor_bottom(mut lines: Vec<Line<'static>>, height: u16) -> Vec<Line<'static>> {
    let height = usize::from(height);
    if lines.len() < height {
        let mut padded = vec![Line::default(); height - lines.len()];
        padded.append(&mut lines);
        padded
    } else {
        lines
    }
}

pub fn diff_line(line: &DiffLine) -> Line<'static> {
    let style = match line.kind {
        LineKind::Added => theme::DIFF_ADD,
        LineKind::Removed => theme::DIFF_REMOVE,
        LineKind::Context => theme::DIFF_CONTEXT,
    };
    Line::styled(line.content.clone(), style)
}

/// Text field contents with the cursor cell highlighted.
pub fn input_spans(input: &TextInput) -> Vec<Span<'static>> {
    let value = input.value();
    let cursor = input.cursor();
    let before: String = value.chars().take(cursor).collect();
    let at: String = value.chars().skip(cursor).take(1).collect();
    let after: String = value.chars().skip(cursor + 1).collect();

    vec![
        Span::raw(before),
        Span::styled(if at.is_empty() { " ".to_string() } else { at }, theme::INPUT_CURSOR),
        Span::raw(after),
    ]
}

pub fn line_text(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

pub fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 {
        one
    } else {
        many
    }
}
