use std::rc::Rc;

use crossterm::event::KeyEvent;

use crate::data::worker::{Job, Load, Mutation, Outcome};
use crate::error::GitError;
use crate::keymap::{key_token, Action, Keymap};
use crate::model::branch::Branch;
use crate::views::{
    clamp_cursor, scroll_to, visible_rows, yes_no, DoubleKey, Effect, Press, TextInput,
};

#[derive(Debug, Clone, PartialEq)]
pub enum BranchesMode {
    Navigate,
    Help,
    NewBranch(TextInput),
    /// The user must type the branch name to delete it.
    ConfirmDelete { name: String, input: TextInput },
    ConfirmForceDelete { name: String },
}

pub struct BranchesView {
    keys: Rc<Keymap>,
    pub branches: Vec<Branch>,
    pub loaded: bool,
    pub cursor: usize,
    pub scroll: usize,
    pub mode: BranchesMode,
    pub show_verbose_help: bool,
    pub error: Option<String>,
    pub height: u16,
    top: DoubleKey,
}

fn then_reload(mutation: Mutation) -> Effect {
    Effect::Run(Job::Mutate(mutation, Load::Branches))
}

impl BranchesView {
    pub fn new(keys: Rc<Keymap>, show_verbose_help: bool, height: u16) -> Self {
        Self {
            keys,
            branches: Vec::new(),
            loaded: false,
            cursor: 0,
            scroll: 0,
            mode: BranchesMode::Navigate,
            show_verbose_help,
            error: None,
            height,
            top: DoubleKey::default(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        !matches!(self.mode, BranchesMode::Navigate)
    }

    pub fn visible_rows(&self) -> usize {
        let reserved = if self.show_verbose_help { 9 } else { 6 };
        visible_rows(self.height, reserved, 10)
    }

    pub fn resize(&mut self, height: u16) {
        self.height = height;
        self.scroll = scroll_to(self.cursor, self.scroll, self.visible_rows());
    }

    pub fn current_branch(&self) -> Option<&Branch> {
        self.branches.get(self.cursor)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Effect {
        let token = key_token(&key);
        let effect = self.on_key(key, &token);
        if matches!(effect, Effect::Run(_)) {
            self.error = None;
        }
        effect
    }

    fn on_key(&mut self, key: KeyEvent, token: &str) -> Effect {
        let keys = Rc::clone(&self.keys);
        match &mut self.mode {
            BranchesMode::Navigate => self.navigate(token),
            BranchesMode::Help => {
                if keys.is(Action::Help, token) || keys.is(Action::Quit, token) || token == "esc"
                {
                    self.mode = BranchesMode::Navigate;
                }
                Effect::None
            }
            BranchesMode::NewBranch(input) => match token {
                "enter" => {
                    let name = input.value().trim().to_string();
                    self.mode = BranchesMode::Navigate;
                    if name.is_empty() {
                        Effect::None
                    } else {
                        then_reload(Mutation::CreateBranch(name))
                    }
                }
                "esc" => {
                    self.mode = BranchesMode::Navigate;
                    Effect::None
                }
                _ => {
                    input.input(key);
                    Effect::None
                }
            },
            BranchesMode::ConfirmDelete { name, input } => match token {
                "enter" => {
                    let typed = input.value();
                    let name = std::mem::take(name);
                    self.mode = BranchesMode::Navigate;
                    if typed == name {
                        then_reload(Mutation::DeleteBranch(name))
                    } else {
                        Effect::None
                    }
                }
                "esc" => {
                    self.mode = BranchesMode::Navigate;
                    Effect::None
                }
                _ => {
                    input.input(key);
                    Effect::None
                }
            },
            BranchesMode::ConfirmForceDelete { name } => match yes_no(token) {
                Some(true) => {
                    let name = std::mem::take(name);
                    self.mode = BranchesMode::Navigate;
                    then_reload(Mutation::ForceDeleteBranch(name))
                }
                Some(false) => {
                    self.mode = BranchesMode::Navigate;
                    self.error = None;
                    Effect::None
                }
                None => Effect::None,
            },
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
            self.mode = BranchesMode::Help;
        } else if is(Action::VerboseHelp) {
            self.show_verbose_help = !self.show_verbose_help;
        } else if is(Action::Down) || token == "down" {
            self.select(self.cursor + 1);
        } else if is(Action::Up) || token == "up" {
            self.select(self.cursor.saturating_sub(1));
        } else if is(Action::Bottom) {
            self.select(self.branches.len().saturating_sub(1));
        } else if is(Action::Right) || token == "right" || token == "enter" {
            if let Some(branch) = self.current_branch().filter(|b| !b.is_current) {
                return then_reload(Mutation::Checkout(branch.name.clone()));
            }
        } else if is(Action::NewBranch) {
            self.mode = BranchesMode::NewBranch(TextInput::default());
        } else if is(Action::Delete) {
            if let Some(branch) = self.current_branch().filter(|b| !b.is_current) {
                self.mode = BranchesMode::ConfirmDelete {
                    name: branch.name.clone(),
                    input: TextInput::default(),
                };
            }
        }
        Effect::None
    }

    fn select(&mut self, index: usize) {
        self.cursor = clamp_cursor(index, self.branches.len());
        self.scroll = scroll_to(self.cursor, self.scroll, self.visible_rows());
    }

    pub fn apply(&mut self, outcome: Outcome) -> Effect {
        match outcome {
            Outcome::Branches(branches) => {
                self.branches = branches;
                self.loaded = true;
                let current = self.branches.iter().position(|b| b.is_current);
                self.select(current.unwrap_or(self.cursor));
            }
            Outcome::Failed(GitError::NotFullyMerged { branch, message }) => {
                self.error = Some(message);
                self.mode = BranchesMode::ConfirmForceDelete { name: branch };
            }
            Outcome::Failed(e) => self.error = Some(e.to_string()),
            other => log::debug!("branches view ignoring {:?}", other),
        }
        Effect::None
    }
}
