use ratatui::style::{Color, Modifier, Style};

// Status bar
pub const STATUS_BAR: Style = Style::new().fg(Color::White).bg(Color::DarkGray);
pub const VIEW_BADGE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Cyan)
    .add_modifier(Modifier::BOLD);
pub const VISUAL_BADGE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Blue)
    .add_modifier(Modifier::BOLD);

// Footer hints
pub const HINT_KEY: Style = Style::new().fg(Color::Yellow).bg(Color::DarkGray);
pub const HINT_DESC: Style = Style::new().fg(Color::Gray).bg(Color::DarkGray);

// Text
pub const MUTED: Style = Style::new().fg(Color::DarkGray);
pub const EMPTY_STATE: Style = Style::new()
    .fg(Color::DarkGray)
    .add_modifier(Modifier::ITALIC);
pub const ERROR: Style = Style::new().fg(Color::Red);
pub const CONFIRM: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);
pub const INPUT_CURSOR: Style = Style::new().add_modifier(Modifier::REVERSED);

// List items
pub const LIST_SELECTED: Style = Style::new()
    .bg(Color::DarkGray)
    .add_modifier(Modifier::BOLD);
pub const VISUAL: Style = Style::new().fg(Color::Blue).bg(Color::DarkGray);
pub const SECTION_HEADER: Style = Style::new().fg(Color::Blue).add_modifier(Modifier::BOLD);

// File sections
pub const STAGED: Style = Style::new().fg(Color::Green);
pub const UNSTAGED: Style = Style::new().fg(Color::Red);
pub const UNTRACKED: Style = Style::new().fg(Color::Yellow);

// Git diff
pub const DIFF_ADD: Style = Style::new().fg(Color::Green);
pub const DIFF_REMOVE: Style = Style::new().fg(Color::Red);
pub const DIFF_CONTEXT: Style = Style::new().fg(Color::DarkGray);
pub const HUNK_STAGED: Style = Style::new().fg(Color::Green);
pub const HUNK_UNSTAGED: Style = Style::new().fg(Color::Red);

// Help overlay
pub const HELP_TITLE: Style = Style::new().fg(Color::Blue).add_modifier(Modifier::BOLD);
pub const HELP_KEY: Style = Style::new().fg(Color::Yellow);
pub const HELP_DESC: Style = Style::new().fg(Color::Gray);
pub const BORDER_ACTIVE: Style = Style::new().fg(Color::Cyan);
