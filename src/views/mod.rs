pub mod branches;
pub mod diff;
pub mod log;
pub mod stash_diff;
pub mod stashes;
pub mod status;

use crossterm::event::KeyEvent;
use tui_textarea::TextArea;

use crate::data::worker::Job;

/// What a key press or completion asks the shell to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Run(Job),
    Quit,
    /// Suspend the terminal and run `git commit` with the user's editor.
    CommitWithEditor,
}

/// Tracks the first half of a `gg` style double press.
#[derive(Debug, Default, Clone)]
pub struct DoubleKey {
    armed: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Press {
    /// Second consecutive press.
    Fired,
    /// First press; wait for another.
    Armed,
    /// Some other key; any pending press is forgotten.
    Other,
}

impl DoubleKey {
    pub fn feed(&mut self, is_top: bool) -> Press {
        match (is_top, self.armed) {
            (true, true) => {
                self.armed = false;
                Press::Fired
            }
            (true, false) => {
                self.armed = true;
                Press::Armed
            }
            (false, _) => {
                self.armed = false;
                Press::Other
            }
        }
    }

    pub fn reset(&mut self) {
        self.armed = false;
    }
}

/// Input for a "type a word to confirm" prompt. Only lowercase letters are
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedConfirm {
    word: &'static str,
    pub input: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfirmStep {
    Pending,
    Accepted,
    Cancelled,
}

impl TypedConfirm {
    pub fn new(word: &'static str) -> Self {
        Self {
            word,
            input: String::new(),
        }
    }

    pub fn yes() -> Self {
        Self::new("yes")
    }

    pub fn feed(&mut self, token: &str) -> ConfirmStep {
        match token {
            "esc" => ConfirmStep::Cancelled,
            "enter" if self.input == self.word => ConfirmStep::Accepted,
            "enter" => ConfirmStep::Pending,
            "backspace" => {
                self.input.pop();
                ConfirmStep::Pending
            }
            t => {
                let mut chars = t.chars();
                if let (Some(c @ 'a'..='z'), None) = (chars.next(), chars.next()) {
                    self.input.push(c);
                }
                ConfirmStep::Pending
            }
        }
    }
}

/// Answer to a y/n prompt.
pub fn yes_no(token: &str) -> Option<bool> {
    match token {
        "y" | "Y" => Some(true),
        "n" | "N" | "esc" => Some(false),
        _ => None,
    }
}

/// Single-line free text field.
#[derive(Debug, Clone)]
pub struct TextInput {
    area: TextArea<'static>,
}

impl Default for TextInput {
    fn default() -> Self {
        Self {
            area: TextArea::default(),
        }
    }
}

impl PartialEq for TextInput {
    fn eq(&self, other: &Self) -> bool {
        self.area.lines() == other.area.lines()
    }
}

impl TextInput {
    pub fn input(&mut self, key: KeyEvent) {
        self.area.input(key);
    }

    pub fn value(&self) -> String {
        self.area.lines().first().cloned().unwrap_or_default()
    }

    /// Character column of the cursor.
    pub fn cursor(&self) -> usize {
        self.area.cursor().1
    }
}

/// Rows available for a list given the terminal height and the rows other
/// content takes.
pub fn visible_rows(height: u16, reserved: u16, fallback: usize) -> usize {
    if height > reserved {
        usize::from(height - reserved)
    } else {
        fallback
    }
}

/// Keep `cursor` inside `[offset, offset + visible)`.
pub fn scroll_to(cursor: usize, offset: usize, visible: usize) -> usize {
    let visible = visible.max(1);
    if cursor < offset {
        cursor
    } else if cursor >= offset + visible {
        cursor + 1 - visible
    } else {
        offset
    }
}

pub fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

/// Rows a single hunk gets in detail mode.
pub fn detail_rows(height: u16) -> usize {
    if height > 5 {
        usize::from(height - 5)
    } else {
        40
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use rstest::rstest;

    use super::*;

    #[test]
    fn double_press_fires_on_second_top() {
        let mut top = DoubleKey::default();
        assert_eq!(top.feed(true), Press::Armed);
        assert_eq!(top.feed(true), Press::Fired);
        assert_eq!(top.feed(true), Press::Armed);
        assert_eq!(top.feed(false), Press::Other);
        assert_eq!(top.feed(true), Press::Armed);
    }

    #[test]
    fn typed_confirm_requires_exact_word() {
        let mut confirm = TypedConfirm::yes();
        for t in ["y", "e", "x"] {
            assert_eq!(confirm.feed(t), ConfirmStep::Pending);
        }
        assert_eq!(confirm.feed("enter"), ConfirmStep::Pending);
        assert_eq!(confirm.input, "yex");

        confirm.feed("backspace");
        confirm.feed("s");
        assert_eq!(confirm.feed("enter"), ConfirmStep::Accepted);
    }

    #[rstest]
    #[case("Y")]
    #[case("1")]
    #[case(" ")]
    #[case("ctrl+d")]
    fn typed_confirm_ignores_non_lowercase(#[case] token: &str) {
        let mut confirm = TypedConfirm::yes();
        confirm.feed(token);
        assert_eq!(confirm.input, "");
    }

    #[test]
    fn typed_confirm_cancels_on_esc() {
        let mut confirm = TypedConfirm::yes();
        confirm.feed("y");
        assert_eq!(confirm.feed("esc"), ConfirmStep::Cancelled);
    }

    #[test]
    fn text_input_collects_characters() {
        let mut input = TextInput::default();
        for c in "wip".chars() {
            input.input(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        input.input(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE));
        assert_eq!(input.value(), "wi");
        assert_eq!(input.cursor(), 2);
    }

    #[rstest]
    #[case(0, 0, 10, 0)]
    #[case(12, 0, 10, 3)]
    #[case(2, 5, 10, 2)]
    #[case(7, 5, 10, 5)]
    fn scrolling(
        #[case] cursor: usize,
        #[case] offset: usize,
        #[case] visible: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(scroll_to(cursor, offset, visible), expected);
    }

    #[test]
    fn rows_fall_back_on_tiny_terminals() {
        assert_eq!(visible_rows(30, 12, 10), 18);
        assert_eq!(visible_rows(12, 12, 10), 10);
        assert_eq!(detail_rows(4), 40);
    }
}
