use std::rc::Rc;

use crossterm::event::KeyEvent;

use crate::data::worker::{Job, Load, Outcome};
use crate::keymap::{key_token, Action, Keymap};
use crate::model::diff::Hunk;
use crate::views::{clamp_cursor, detail_rows, Effect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StashDiffMode {
    List,
    Detail,
    Help { detail: bool },
}

/// Read-only hunk browser over one stash entry.
pub struct StashDiffView {
    keys: Rc<Keymap>,
    pub index: usize,
    pub hunks: Vec<Hunk>,
    pub loaded: bool,
    pub cursor: usize,
    pub scroll: usize,
    pub mode: StashDiffMode,
    pub error: Option<String>,
    pub height: u16,
}

impl StashDiffView {
    pub fn new(keys: Rc<Keymap>, index: usize, height: u16) -> Self {
        Self {
            keys,
            index,
            hunks: Vec::new(),
            loaded: false,
            cursor: 0,
            scroll: 0,
            mode: StashDiffMode::List,
            error: None,
            height,
        }
    }

    pub fn load_job(&self) -> Job {
        Job::Load(Load::StashDiff(self.index))
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self.mode, StashDiffMode::Help { .. })
    }

    pub fn current_hunk(&self) -> Option<&Hunk> {
        self.hunks.get(self.cursor)
    }

    pub fn detail_rows(&self) -> usize {
        detail_rows(self.height)
    }

    fn max_scroll(&self) -> usize {
        self.current_hunk()
            .map(|h| h.lines.len().saturating_sub(self.detail_rows()))
            .unwrap_or(0)
    }

    pub fn resize(&mut self, height: u16) {
        self.height = height;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Leave detail for the list. Returns false when already on the list.
    pub fn back_to_list(&mut self) -> bool {
        if self.mode == StashDiffMode::Detail {
            self.mode = StashDiffMode::List;
            self.scroll = 0;
            true
        } else {
            false
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Effect {
        let token = key_token(&key);
        let keys = Rc::clone(&self.keys);
        let is = |action| keys.is(action, &token);

        match self.mode {
            StashDiffMode::Help { detail } => {
                if is(Action::Help) || is(Action::Quit) || token == "esc" {
                    self.mode = if detail {
                        StashDiffMode::Detail
                    } else {
                        StashDiffMode::List
                    };
                }
            }
            StashDiffMode::Detail => {
                if is(Action::Left) || token == "left" || token == "esc" {
                    self.back_to_list();
                } else if is(Action::Down) || token == "down" {
                    self.scroll = (self.scroll + 1).min(self.max_scroll());
                } else if is(Action::Up) || token == "up" {
                    self.scroll = self.scroll.saturating_sub(1);
                } else if is(Action::Top) {
                    self.scroll = 0;
                } else if is(Action::Bottom) {
                    self.scroll = self.max_scroll();
                } else if is(Action::Help) {
                    self.mode = StashDiffMode::Help { detail: true };
                }
            }
            StashDiffMode::List => {
                if is(Action::Right) || token == "right" || token == "enter" {
                    if !self.hunks.is_empty() {
                        self.mode = StashDiffMode::Detail;
                        self.scroll = 0;
                    }
                } else if is(Action::Down) || token == "down" {
                    self.cursor = clamp_cursor(self.cursor + 1, self.hunks.len());
                } else if is(Action::Up) || token == "up" {
                    self.cursor = self.cursor.saturating_sub(1);
                } else if is(Action::Top) {
                    self.cursor = 0;
                } else if is(Action::Bottom) {
                    self.cursor = self.hunks.len().saturating_sub(1);
                } else if is(Action::Help) {
                    self.mode = StashDiffMode::Help { detail: false };
                }
            }
        }
        Effect::None
    }

    pub fn apply(&mut self, outcome: Outcome) -> Effect {
        match outcome {
            Outcome::Diff(diff) => {
                self.hunks = diff.all_hunks();
                self.loaded = true;
                self.cursor = 0;
                self.scroll = 0;
                if self.hunks.len() == 1 && self.mode == StashDiffMode::List {
                    self.mode = StashDiffMode::Detail;
                }
            }
            Outcome::Failed(e) => self.error = Some(e.to_string()),
            other => log::debug!("stash diff view ignoring {:?}", other),
        }
        Effect::None
    }
}
