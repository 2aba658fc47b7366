use std::collections::BTreeSet;
use std::rc::Rc;

use crossterm::event::KeyEvent;

use crate::data::worker::{FileOp, Job, Load, Mutation, Outcome};
use crate::error::GitError;
use crate::keymap::{key_token, Action, Keymap};
use crate::model::status::{BranchStatus, Section, StatusItem, StatusResult};
use crate::views::{
    clamp_cursor, scroll_to, visible_rows, yes_no, ConfirmStep, DoubleKey, Effect, Press,
    TextInput, TypedConfirm,
};

/// What a stash prompt will stash.
#[derive(Debug, Clone, PartialEq)]
pub enum StashScope {
    All,
    Files(Vec<StatusItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusMode {
    Navigate,
    Help,
    CommitInput(TextInput),
    StashInput {
        scope: StashScope,
        input: TextInput,
    },
    ConfirmStash {
        scope: StashScope,
        message: String,
        confirm: TypedConfirm,
    },
    ConfirmDiscard {
        targets: Vec<StatusItem>,
        confirm: TypedConfirm,
    },
    ConfirmPush,
    ConfirmPushNew {
        remote: String,
    },
}

pub struct StatusView {
    keys: Rc<Keymap>,
    pub status: Option<StatusResult>,
    pub branch: BranchStatus,
    pub items: Vec<StatusItem>,
    pub cursor: usize,
    pub scroll: usize,
    pub selected: BTreeSet<usize>,
    pub visual_anchor: Option<usize>,
    pub mode: StatusMode,
    pub show_verbose_help: bool,
    pub error: Option<String>,
    pub height: u16,
    top: DoubleKey,
}

pub fn refresh_job(background: bool) -> Job {
    Job::Load(Load::Status { background })
}

fn then_refresh(mutation: Mutation) -> Effect {
    Effect::Run(Job::Mutate(mutation, Load::Status { background: false }))
}

impl StatusView {
    pub fn new(keys: Rc<Keymap>, show_verbose_help: bool, height: u16) -> Self {
        Self {
            keys,
            status: None,
            branch: BranchStatus::default(),
            items: Vec::new(),
            cursor: 0,
            scroll: 0,
            selected: BTreeSet::new(),
            visual_anchor: None,
            mode: StatusMode::Navigate,
            show_verbose_help,
            error: None,
            height,
            top: DoubleKey::default(),
        }
    }

    /// Busy with a prompt, help, or a selection the user is building.
    pub fn is_blocking(&self) -> bool {
        !self.is_navigating() || self.visual_anchor.is_some() || !self.selected.is_empty()
    }

    pub fn is_navigating(&self) -> bool {
        matches!(self.mode, StatusMode::Navigate)
    }

    pub fn visible_rows(&self) -> usize {
        let reserved = if self.show_verbose_help { 15 } else { 12 };
        visible_rows(self.height, reserved, 10)
    }

    pub fn resize(&mut self, height: u16) {
        self.height = height;
        self.scroll = scroll_to(self.cursor, self.scroll, self.visible_rows());
    }

    /// Forget a pending `gg` prefix, e.g. when the key opened another view.
    pub fn disarm(&mut self) {
        self.top.reset();
    }

    pub fn current_item(&self) -> Option<&StatusItem> {
        self.items.get(self.cursor)
    }

    /// Selected items in list order plus the cursor item, or just the
    /// cursor item when nothing is selected.
    pub fn targets(&self) -> Vec<StatusItem> {
        let mut indices: Vec<usize> = self.selected.iter().copied().collect();
        if !indices.contains(&self.cursor) {
            indices.push(self.cursor);
        }
        indices
            .into_iter()
            .filter_map(|i| self.items.get(i).cloned())
            .collect()
    }

    fn has_staged(&self) -> bool {
        self.status.as_ref().is_some_and(|s| !s.staged.is_empty())
    }

    fn clear_selection(&mut self) {
        self.visual_anchor = None;
        self.selected.clear();
    }

    fn move_to(&mut self, index: usize) {
        self.cursor = clamp_cursor(index, self.items.len());
        if let Some(anchor) = self.visual_anchor {
            let (lo, hi) = (anchor.min(self.cursor), anchor.max(self.cursor));
            self.selected = (lo..=hi).collect();
        }
        self.scroll = scroll_to(self.cursor, self.scroll, self.visible_rows());
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
            StatusMode::Navigate => self.navigate(token),
            StatusMode::Help => {
                if keys.is(Action::Help, token) || keys.is(Action::Quit, token) || token == "esc"
                {
                    self.mode = StatusMode::Navigate;
                }
                Effect::None
            }
            StatusMode::CommitInput(input) => match token {
                "enter" => {
                    let message = input.value();
                    self.mode = StatusMode::Navigate;
                    if message.trim().is_empty() {
                        Effect::None
                    } else {
                        then_refresh(Mutation::Commit(message))
                    }
                }
                "esc" => {
                    self.mode = StatusMode::Navigate;
                    Effect::None
                }
                _ => {
                    input.input(key);
                    Effect::None
                }
            },
            StatusMode::StashInput { input, .. } => match token {
                "enter" => {
                    let message = input.value().trim().to_string();
                    let mode = std::mem::replace(&mut self.mode, StatusMode::Navigate);
                    if let StatusMode::StashInput { scope, .. } = mode {
                        self.mode = StatusMode::ConfirmStash {
                            scope,
                            message,
                            confirm: TypedConfirm::yes(),
                        };
                    }
                    Effect::None
                }
                "esc" => {
                    self.mode = StatusMode::Navigate;
                    Effect::None
                }
                _ => {
                    input.input(key);
                    Effect::None
                }
            },
            StatusMode::ConfirmStash { confirm, .. } => match confirm.feed(token) {
                ConfirmStep::Pending => Effect::None,
                ConfirmStep::Cancelled => {
                    self.mode = StatusMode::Navigate;
                    Effect::None
                }
                ConfirmStep::Accepted => {
                    match std::mem::replace(&mut self.mode, StatusMode::Navigate) {
                        StatusMode::ConfirmStash {
                            scope: StashScope::All,
                            message,
                            ..
                        } => then_refresh(Mutation::StashAll(message)),
                        StatusMode::ConfirmStash {
                            scope: StashScope::Files(items),
                            message,
                            ..
                        } => {
                            let mut paths: Vec<String> = Vec::new();
                            for item in items {
                                if !paths.contains(&item.file.path) {
                                    paths.push(item.file.path);
                                }
                            }
                            then_refresh(Mutation::StashFiles { paths, message })
                        }
                        _ => Effect::None,
                    }
                }
            },
            StatusMode::ConfirmDiscard { confirm, .. } => match confirm.feed(token) {
                ConfirmStep::Pending => Effect::None,
                ConfirmStep::Cancelled => {
                    self.mode = StatusMode::Navigate;
                    Effect::None
                }
                ConfirmStep::Accepted => {
                    match std::mem::replace(&mut self.mode, StatusMode::Navigate) {
                        StatusMode::ConfirmDiscard { targets, .. } => {
                            then_refresh(Mutation::Files(discard_ops(targets)))
                        }
                        _ => Effect::None,
                    }
                }
            },
            StatusMode::ConfirmPush => match yes_no(token) {
                Some(true) => {
                    self.mode = StatusMode::Navigate;
                    then_refresh(Mutation::Push)
                }
                Some(false) => {
                    self.mode = StatusMode::Navigate;
                    Effect::None
                }
                None => Effect::None,
            },
            StatusMode::ConfirmPushNew { remote } => match yes_no(token) {
                Some(true) => {
                    let remote = remote.clone();
                    self.mode = StatusMode::Navigate;
                    then_refresh(Mutation::PushSetUpstream {
                        remote,
                        branch: self.branch.name.clone(),
                    })
                }
                Some(false) => {
                    self.mode = StatusMode::Navigate;
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
                self.move_to(0);
                return Effect::None;
            }
            Press::Armed => return Effect::None,
            Press::Other => {}
        }

        if is(Action::Quit) || token == "esc" {
            if self.visual_anchor.is_some() || !self.selected.is_empty() {
                self.clear_selection();
                return Effect::None;
            }
            return Effect::Quit;
        }
        if is(Action::Help) {
            self.mode = StatusMode::Help;
            return Effect::None;
        }
        if is(Action::VerboseHelp) {
            self.show_verbose_help = !self.show_verbose_help;
            self.scroll = scroll_to(self.cursor, self.scroll, self.visible_rows());
            return Effect::None;
        }
        if is(Action::Visual) || token == "V" {
            if self.visual_anchor.is_some() {
                if is(Action::Visual) {
                    self.clear_selection();
                }
            } else if !self.items.is_empty() {
                self.visual_anchor = Some(self.cursor);
                self.selected = BTreeSet::from([self.cursor]);
            }
            return Effect::None;
        }
        if is(Action::Down) || token == "down" {
            self.move_to(self.cursor + 1);
            return Effect::None;
        }
        if is(Action::Up) || token == "up" {
            self.move_to(self.cursor.saturating_sub(1));
            return Effect::None;
        }
        if is(Action::Bottom) {
            self.move_to(self.items.len().saturating_sub(1));
            return Effect::None;
        }
        if is(Action::Select) || token == "left" {
            if self.visual_anchor.is_none() && self.cursor < self.items.len() {
                if !self.selected.remove(&self.cursor) {
                    self.selected.insert(self.cursor);
                }
            }
            return Effect::None;
        }

        if token == " " {
            return self.file_ops(|item| match item.section {
                Section::Staged => Some(FileOp::Unstage(item.file.path.clone())),
                Section::Unstaged | Section::Untracked => {
                    Some(FileOp::Stage(item.file.path.clone()))
                }
            });
        }
        if is(Action::Stage) {
            return self.file_ops(|item| {
                (item.section != Section::Staged).then(|| FileOp::Stage(item.file.path.clone()))
            });
        }
        if is(Action::Unstage) {
            return self.file_ops(|item| {
                (item.section == Section::Staged).then(|| FileOp::Unstage(item.file.path.clone()))
            });
        }
        if is(Action::StageAll) {
            return then_refresh(Mutation::StageAll);
        }
        if is(Action::UnstageAll) {
            return then_refresh(Mutation::UnstageAll);
        }
        if is(Action::Discard) {
            if !self.items.is_empty() && (!self.selected.is_empty() || self.visual_anchor.is_none())
            {
                self.mode = StatusMode::ConfirmDiscard {
                    targets: self.targets(),
                    confirm: TypedConfirm::yes(),
                };
            }
            return Effect::None;
        }
        if is(Action::Commit) {
            if self.has_staged() {
                self.mode = StatusMode::CommitInput(TextInput::default());
            }
            return Effect::None;
        }
        if is(Action::CommitEdit) {
            return Effect::CommitWithEditor;
        }
        if is(Action::Push) {
            return self.push();
        }
        if is(Action::Stash) || is(Action::StashAll) {
            if !self.items.is_empty() {
                let scope = if is(Action::StashAll) {
                    StashScope::All
                } else {
                    StashScope::Files(self.targets())
                };
                self.mode = StatusMode::StashInput {
                    scope,
                    input: TextInput::default(),
                };
            }
            return Effect::None;
        }
        Effect::None
    }

    fn file_ops(&self, op: impl Fn(&StatusItem) -> Option<FileOp>) -> Effect {
        let ops: Vec<FileOp> = self.targets().iter().filter_map(op).collect();
        if ops.is_empty() {
            Effect::None
        } else {
            then_refresh(Mutation::Files(ops))
        }
    }

    fn push(&mut self) -> Effect {
        if !self.branch.has_upstream() {
            return Effect::Run(Job::Load(Load::Remotes));
        }
        if self.branch.ahead > 0 {
            self.mode = StatusMode::ConfirmPush;
            return Effect::None;
        }
        then_refresh(Mutation::Push)
    }

    pub fn apply(&mut self, outcome: Outcome) -> Effect {
        match outcome {
            Outcome::Status {
                status,
                branch,
                background,
            } => {
                if background && self.is_blocking() {
                    log::debug!("dropping background status refresh while busy");
                    return Effect::None;
                }
                self.set_status(status, branch, background);
            }
            Outcome::Remotes(remotes) => match remotes.into_iter().next() {
                None => self.error = Some(GitError::NoRemotesConfigured.to_string()),
                Some(remote) => {
                    self.error = None;
                    if self.is_navigating() {
                        self.mode = StatusMode::ConfirmPushNew { remote };
                    }
                }
            },
            Outcome::Failed(e) => self.error = Some(e.to_string()),
            other => log::debug!("status view ignoring {:?}", other),
        }
        Effect::None
    }

    /// Tick refreshes leave an inline error on screen; only a user action or
    /// an explicit reload clears it.
    fn set_status(&mut self, status: StatusResult, branch: BranchStatus, background: bool) {
        self.items = status.items();
        self.status = Some(status);
        self.branch = branch;
        if !background {
            self.error = None;
        }
        self.clear_selection();
        self.cursor = clamp_cursor(self.cursor, self.items.len());
        self.scroll = scroll_to(self.cursor, self.scroll, self.visible_rows());
    }
}

/// Staged entries are only unstaged; unstaged ones are restored from the
/// index; untracked ones are deleted.
fn discard_ops(targets: Vec<StatusItem>) -> Vec<FileOp> {
    targets
        .into_iter()
        .map(|item| match item.section {
            Section::Staged => FileOp::Unstage(item.file.path),
            Section::Unstaged => FileOp::Discard(item.file.path),
            Section::Untracked => FileOp::RemoveUntracked(item.file.path),
        })
        .collect()
}
