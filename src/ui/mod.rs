pub mod branches_view;
pub mod diff_view;
pub mod help_overlay;
pub mod layout;
pub mod log_view;
pub mod stashes_view;
pub mod status_view;
pub mod theme;
pub mod util;

use ratatui::Frame;

use crate::app::App;

/// Main draw dispatcher.
pub fn draw(f: &mut Frame, app: &App) {
    layout::draw_layout(f, app);
}
