use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::theme;
use super::util::anchor_bottom;
use crate::views::log::LogView;

pub fn draw_log(f: &mut Frame, area: Rect, view: &LogView) {
    let lines = anchor_bottom(lines(view), area.height);
    f.render_widget(Paragraph::new(lines), area);
}

fn styled(line: &str) -> Line<'static> {
    if line.starts_with("commit ") {
        Line::styled(line.to_string(), theme::STAGED)
    } else if line.starts_with("Author:") || line.starts_with("Date:") {
        Line::styled(line.to_string(), theme::MUTED)
    } else {
        Line::from(line.to_string())
    }
}

pub fn lines(view: &LogView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(ref e) = view.error {
        lines.push(Line::styled(format!("Error: {}", e), theme::ERROR));
    }
    if !view.loaded {
        lines.push(Line::styled("Loading...", theme::MUTED));
        return lines;
    }
    lines.extend(
        view.lines
            .iter()
            .skip(view.scroll)
            .take(view.visible_rows())
            .map(|l| styled(l)),
    );
    lines
}
