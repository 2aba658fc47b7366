use std::rc::Rc;

use crossterm::event::KeyEvent;

use crate::data::worker::{Job, Load, Outcome};
use crate::keymap::{key_token, Action, Keymap};
use crate::views::{visible_rows, Effect};

/// Scrollable `git log` output.
pub struct LogView {
    keys: Rc<Keymap>,
    pub lines: Vec<String>,
    pub loaded: bool,
    pub scroll: usize,
    pub show_help: bool,
    pub error: Option<String>,
    pub height: u16,
    limit: usize,
}

impl LogView {
    pub fn new(keys: Rc<Keymap>, limit: usize, height: u16) -> Self {
        Self {
            keys,
            lines: Vec::new(),
            loaded: false,
            scroll: 0,
            show_help: false,
            error: None,
            height,
            limit,
        }
    }

    pub fn load_job(&self) -> Job {
        Job::Load(Load::Log(self.limit))
    }

    pub fn is_blocking(&self) -> bool {
        self.show_help
    }

    pub fn visible_rows(&self) -> usize {
        visible_rows(self.height, 2, 10)
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.visible_rows())
    }

    pub fn resize(&mut self, height: u16) {
        self.height = height;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Effect {
        let token = key_token(&key);
        let keys = Rc::clone(&self.keys);
        let is = |action| keys.is(action, &token);

        if self.show_help {
            if is(Action::Help) || is(Action::Quit) || token == "esc" {
                self.show_help = false;
            }
            return Effect::None;
        }

        let half = (self.visible_rows() / 2).max(1);
        let max = self.max_scroll();
        if is(Action::Down) || token == "down" {
            self.scroll = (self.scroll + 1).min(max);
        } else if is(Action::Up) || token == "up" {
            self.scroll = self.scroll.saturating_sub(1);
        } else if token == "ctrl+d" {
            self.scroll = (self.scroll + half).min(max);
        } else if token == "ctrl+u" {
            self.scroll = self.scroll.saturating_sub(half);
        } else if is(Action::Top) {
            self.scroll = 0;
        } else if is(Action::Bottom) {
            self.scroll = max;
        } else if is(Action::Help) {
            self.show_help = true;
        }
        Effect::None
    }

    pub fn apply(&mut self, outcome: Outcome) -> Effect {
        match outcome {
            Outcome::Log(text) => {
                self.lines = text.lines().map(str::to_string).collect();
                self.loaded = true;
                self.scroll = self.scroll.min(self.max_scroll());
            }
            Outcome::Failed(e) => self.error = Some(e.to_string()),
            other => log::debug!("log view ignoring {:?}", other),
        }
        Effect::None
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::views::status::tests::key;

    fn loaded(lines: usize, height: u16) -> LogView {
        let mut view = LogView::new(Rc::new(Keymap::default()), 100, height);
        let text: String = (0..lines).map(|i| format!("line {}\n", i)).collect();
        view.apply(Outcome::Log(text));
        view
    }

    #[test]
    fn scrolling_is_clamped() {
        let mut view = loaded(30, 12);
        assert_eq!(view.visible_rows(), 10);
        view.handle_key(key('G'));
        assert_eq!(view.scroll, 20);
        view.handle_key(key('j'));
        assert_eq!(view.scroll, 20);
        view.handle_key(key('g'));
        assert_eq!(view.scroll, 0);
        view.handle_key(key('k'));
        assert_eq!(view.scroll, 0);
    }

    #[test]
    fn half_page_moves() {
        let mut view = loaded(30, 12);
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        view.handle_key(ctrl('d'));
        assert_eq!(view.scroll, 5);
        view.handle_key(ctrl('d'));
        view.handle_key(ctrl('d'));
        view.handle_key(ctrl('d'));
        assert_eq!(view.scroll, 20);
        view.handle_key(ctrl('u'));
        assert_eq!(view.scroll, 15);
    }

    #[test]
    fn short_log_does_not_scroll() {
        let mut view = loaded(3, 40);
        view.handle_key(key('G'));
        assert_eq!(view.scroll, 0);
    }
}
