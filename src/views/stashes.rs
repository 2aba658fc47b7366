use std::rc::Rc;

use crossterm::event::KeyEvent;

use crate::data::worker::{Job, Load, Mutation, Outcome};
use crate::error::GitError;
use crate::keymap::{key_token, Action, Keymap};
use crate::model::stash::Stash;
use crate::views::{clamp_cursor, scroll_to, visible_rows, yes_no, DoubleKey, Effect, Press};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StashAction {
    Pop,
    Drop,
}

impl StashAction {
    pub fn verb(self) -> &'static str {
        match self {
            StashAction::Pop => "Pop",
            StashAction::Drop => "Drop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StashesMode {
    Navigate,
    Help,
    /// The stash is the entry as listed when the prompt opened.
    Confirm { action: StashAction, stash: Stash },
}

pub struct StashesView {
    keys: Rc<Keymap>,
    pub stashes: Vec<Stash>,
    pub loaded: bool,
    pub cursor: usize,
    pub scroll: usize,
    pub mode: StashesMode,
    pub show_verbose_help: bool,
    pub error: Option<String>,
    pub height: u16,
    /// Keep the current error across the next reload.
    hold_error: bool,
    top: DoubleKey,
}

fn then_reload(mutation: Mutation) -> Effect {
    Effect::Run(Job::Mutate(mutation, Load::Stashes))
}

impl StashesView {
    pub fn new(keys: Rc<Keymap>, show_verbose_help: bool, height: u16) -> Self {
        Self {
            keys,
            stashes: Vec::new(),
            loaded: false,
            cursor: 0,
            scroll: 0,
            mode: StashesMode::Navigate,
            show_verbose_help,
            error: None,
            height,
            hold_error: false,
            top: DoubleKey::default(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        !matches!(self.mode, StashesMode::Navigate)
    }

    pub fn visible_rows(&self) -> usize {
        let reserved = if self.show_verbose_help { 11 } else { 8 };
        visible_rows(self.height, reserved, 10)
    }

    pub fn resize(&mut self, height: u16) {
        self.height = height;
        self.scroll = scroll_to(self.cursor, self.scroll, self.visible_rows());
    }

    pub fn current_stash(&self) -> Option<&Stash> {
        self.stashes.get(self.cursor)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Effect {
        let token = key_token(&key);
        let effect = self.on_key(&token);
        if matches!(effect, Effect::Run(_)) {
            self.error = None;
        }
        effect
    }

    fn on_key(&mut self, token: &str) -> Effect {
        let keys = Rc::clone(&self.keys);
        match &self.mode {
            StashesMode::Help => {
                if keys.is(Action::Help, token) || keys.is(Action::Quit, token) || token == "esc"
                {
                    self.mode = StashesMode::Navigate;
                }
                Effect::None
            }
            StashesMode::Confirm { .. } => match yes_no(token) {
                Some(true) => match std::mem::replace(&mut self.mode, StashesMode::Navigate) {
                    StashesMode::Confirm {
                        action: StashAction::Pop,
                        stash,
                    } => then_reload(Mutation::PopStash(stash)),
                    StashesMode::Confirm {
                        action: StashAction::Drop,
                        stash,
                    } => then_reload(Mutation::DropStash(stash)),
                    _ => Effect::None,
                },
                Some(false) => {
                    self.mode = StashesMode::Navigate;
                    Effect::None
                }
                None => Effect::None,
            },
            StashesMode::Navigate => self.navigate(token),
        }
    }

    fn navigate(&mut self, token: &str) -> Effect {
        let keys = Rc::clone(&self.keys);
        let is = |action| keys.is(action, token);

        match self.top.feed(is(Action::Top)) {
            Press::Fired => {
                self.select(0);
                return Effect::None;
            }
            Press::Armed => return Effect::None,
            Press::Other => {}
        }

        if is(Action::Help) {
            self.mode = StashesMode::Help;
        } else if is(Action::VerboseHelp) {
            self.show_verbose_help = !self.show_verbose_help;
            self.scroll = scroll_to(self.cursor, self.scroll, self.visible_rows());
        } else if is(Action::Down) || token == "down" {
            self.select(self.cursor + 1);
        } else if is(Action::Up) || token == "up" {
            self.select(self.cursor.saturating_sub(1));
        } else if is(Action::Bottom) {
            self.select(self.stashes.len().saturating_sub(1));
        } else if let Some(stash) = self.current_stash().cloned() {
            // Apply, pop and drop share the stage, push and delete keys.
            if is(Action::Stage) {
                return then_reload(Mutation::ApplyStash(stash.index));
            } else if is(Action::Push) {
                self.mode = StashesMode::Confirm {
                    action: StashAction::Pop,
                    stash,
                };
            } else if is(Action::Delete) {
                self.mode = StashesMode::Confirm {
                    action: StashAction::Drop,
                    stash,
                };
            }
        }
        Effect::None
    }

    fn select(&mut self, index: usize) {
        self.cursor = clamp_cursor(index, self.stashes.len());
        self.scroll = scroll_to(self.cursor, self.scroll, self.visible_rows());
    }

    pub fn apply(&mut self, outcome: Outcome) -> Effect {
        match outcome {
            Outcome::Stashes(stashes) => {
                self.stashes = stashes;
                self.loaded = true;
                if !std::mem::take(&mut self.hold_error) {
                    self.error = None;
                }
                self.select(self.cursor);
            }
            Outcome::Failed(e @ GitError::StashMoved { .. }) => {
                self.error = Some(e.to_string());
                self.hold_error = true;
                return Effect::Run(Job::Load(Load::Stashes));
            }
            Outcome::Failed(e) => self.error = Some(e.to_string()),
            other => log::debug!("stashes view ignoring {:?}", other),
        }
        Effect::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::status::tests::key;

    fn stash(index: usize, message: &str) -> Stash {
        Stash {
            index,
            branch: "main".to_string(),
            message: message.to_string(),
        }
    }

    fn loaded() -> StashesView {
        let mut view = StashesView::new(Rc::new(Keymap::default()), false, 30);
        view.apply(Outcome::Stashes(vec![stash(0, "newest"), stash(1, "older")]));
        view
    }

    #[test]
    fn apply_runs_immediately() {
        let mut view = loaded();
        view.handle_key(key('j'));
        assert_eq!(
            view.handle_key(key('a')),
            then_reload(Mutation::ApplyStash(1))
        );
    }

    #[test]
    fn drop_confirms_with_the_listed_entry() {
        let mut view = loaded();
        assert_eq!(view.handle_key(key('d')), Effect::None);
        assert!(view.is_blocking());
        assert_eq!(view.handle_key(key('x')), Effect::None);
        assert_eq!(
            view.handle_key(key('Y')),
            then_reload(Mutation::DropStash(stash(0, "newest")))
        );
        assert!(!view.is_blocking());
    }

    #[test]
    fn pop_can_be_declined() {
        let mut view = loaded();
        view.handle_key(key('p'));
        assert_eq!(view.handle_key(key('n')), Effect::None);
        assert_eq!(view.mode, StashesMode::Navigate);
    }

    #[test]
    fn moved_stash_reloads_and_keeps_the_warning() {
        let mut view = loaded();
        let effect = view.apply(Outcome::Failed(GitError::StashMoved { index: 0 }));
        assert_eq!(effect, Effect::Run(Job::Load(Load::Stashes)));
        view.apply(Outcome::Stashes(vec![stash(0, "other")]));
        assert!(view.error.as_deref().unwrap_or("").contains("stash@{0}"));

        view.apply(Outcome::Stashes(vec![stash(0, "other")]));
        assert!(view.error.is_none());
    }

    #[test]
    fn shrinking_list_clamps_cursor() {
        let mut view = loaded();
        view.handle_key(key('G'));
        assert_eq!(view.cursor, 1);
        view.apply(Outcome::Stashes(vec![stash(0, "only")]));
        assert_eq!(view.cursor, 0);
    }

    #[test]
    fn actions_follow_rebound_keys() {
        let keys = Keymap::with_overrides([("stage", "x"), ("push", "P")]).unwrap();
        let mut view = StashesView::new(Rc::new(keys), false, 30);
        view.apply(Outcome::Stashes(vec![stash(0, "newest")]));
        assert_eq!(view.handle_key(key('a')), Effect::None);
        assert_eq!(
            view.handle_key(key('x')),
            then_reload(Mutation::ApplyStash(0))
        );
        view.handle_key(key('p'));
        assert_eq!(view.mode, StashesMode::Navigate);
        view.handle_key(key('P'));
        assert!(view.is_blocking());
    }

    #[test]
    fn empty_list_ignores_actions() {
        let mut view = StashesView::new(Rc::new(Keymap::default()), false, 30);
        view.apply(Outcome::Stashes(Vec::new()));
        assert_eq!(view.handle_key(key('a')), Effect::None);
        view.handle_key(key('d'));
        assert!(!view.is_blocking());
    }
}
