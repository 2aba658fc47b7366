use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

/// Every rebindable action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Top,
    Bottom,
    Select,
    Back,
    Quit,
    Stage,
    StageAll,
    Unstage,
    UnstageAll,
    Discard,
    Commit,
    CommitEdit,
    Push,
    Stash,
    StashAll,
    FileDiff,
    AllDiffs,
    FullDiff,
    Branches,
    Stashes,
    Log,
    Visual,
    Help,
    VerboseHelp,
    NewBranch,
    Delete,
}

impl Action {
    pub const ALL: [Action; 30] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Top,
        Action::Bottom,
        Action::Select,
        Action::Back,
        Action::Quit,
        Action::Stage,
        Action::StageAll,
        Action::Unstage,
        Action::UnstageAll,
        Action::Discard,
        Action::Commit,
        Action::CommitEdit,
        Action::Push,
        Action::Stash,
        Action::StashAll,
        Action::FileDiff,
        Action::AllDiffs,
        Action::FullDiff,
        Action::Branches,
        Action::Stashes,
        Action::Log,
        Action::Visual,
        Action::Help,
        Action::VerboseHelp,
        Action::NewBranch,
        Action::Delete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Top => "top",
            Action::Bottom => "bottom",
            Action::Select => "select",
            Action::Back => "back",
            Action::Quit => "quit",
            Action::Stage => "stage",
            Action::StageAll => "stage-all",
            Action::Unstage => "unstage",
            Action::UnstageAll => "unstage-all",
            Action::Discard => "discard",
            Action::Commit => "commit",
            Action::CommitEdit => "commit-edit",
            Action::Push => "push",
            Action::Stash => "stash",
            Action::StashAll => "stash-all",
            Action::FileDiff => "file-diff",
            Action::AllDiffs => "all-diffs",
            Action::FullDiff => "full-diff",
            Action::Branches => "branches",
            Action::Stashes => "stashes",
            Action::Log => "log",
            Action::Visual => "visual",
            Action::Help => "help",
            Action::VerboseHelp => "verbose-help",
            Action::NewBranch => "new-branch",
            Action::Delete => "delete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    fn default_key(self) -> &'static str {
        match self {
            Action::Up => "k",
            Action::Down => "j",
            Action::Left => "h",
            Action::Right => "l",
            Action::Top => "g",
            Action::Bottom => "G",
            Action::Select => "h",
            Action::Back => "h",
            Action::Quit => "q",
            Action::Stage => "a",
            Action::StageAll => "A",
            Action::Unstage => "u",
            Action::UnstageAll => "U",
            Action::Discard => "d",
            Action::Commit => "c",
            Action::CommitEdit => "C",
            Action::Push => "p",
            Action::Stash => "s",
            Action::StashAll => "S",
            Action::FileDiff => "l",
            Action::AllDiffs => "i",
            Action::FullDiff => "f",
            Action::Branches => "b",
            Action::Stashes => "e",
            Action::Log => "o",
            Action::Visual => "v",
            Action::Help => "?",
            Action::VerboseHelp => "/",
            Action::NewBranch => "n",
            Action::Delete => "d",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConflict {
    pub key: String,
    pub actions: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum KeymapError {
    #[error("invalid key override '{0}', expected ACTION=KEY")]
    Malformed(String),

    #[error("unknown action '{action}'; available actions: {}", Action::ALL.map(Action::name).join(", "))]
    UnknownAction { action: String },

    #[error("conflicting key bindings: {}", describe_conflicts(.0))]
    Conflicts(Vec<KeyConflict>),
}

fn describe_conflicts(conflicts: &[KeyConflict]) -> String {
    conflicts
        .iter()
        .map(|c| format!("'{}' -> {}", c.key, c.actions.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Immutable action → key table, built once at startup and shared by every
/// view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<Action, String>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            bindings: Action::ALL
                .into_iter()
                .map(|a| (a, a.default_key().to_string()))
                .collect(),
        }
    }
}

impl Keymap {
    pub fn key(&self, action: Action) -> &str {
        self.bindings.get(&action).map(String::as_str).unwrap_or("")
    }

    /// Whether `token` triggers `action`.
    pub fn is(&self, action: Action, token: &str) -> bool {
        !token.is_empty() && self.key(action) == token
    }

    pub fn apply_override(&mut self, action: &str, key: &str) -> Result<(), KeymapError> {
        let action = Action::from_name(action).ok_or_else(|| KeymapError::UnknownAction {
            action: action.to_string(),
        })?;
        self.bindings.insert(action, key.to_string());
        Ok(())
    }

    /// Defaults with `overrides` applied in order, rejecting collisions that
    /// the defaults do not already have.
    pub fn with_overrides<'a, I>(overrides: I) -> Result<Self, KeymapError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut keymap = Self::default();
        for (action, key) in overrides {
            keymap.apply_override(action, key)?;
        }
        let conflicts = keymap.conflicts_with(&Self::default());
        if !conflicts.is_empty() {
            return Err(KeymapError::Conflicts(conflicts));
        }
        Ok(keymap)
    }

    /// Keys bound to several actions where at least one of those actions
    /// did not share the key in `defaults`.
    pub fn conflicts_with(&self, defaults: &Keymap) -> Vec<KeyConflict> {
        let mut by_key: Vec<(String, Vec<Action>)> = Vec::new();
        for action in Action::ALL {
            let key = self.key(action);
            match by_key.iter_mut().find(|(k, _)| k == key) {
                Some((_, actions)) => actions.push(action),
                None => by_key.push((key.to_string(), vec![action])),
            }
        }

        by_key
            .into_iter()
            .filter(|(_, actions)| actions.len() > 1)
            .filter(|(key, actions)| actions.iter().any(|a| defaults.key(*a) != key))
            .map(|(key, actions)| KeyConflict {
                key,
                actions: actions.into_iter().map(Action::name).collect(),
            })
            .collect()
    }
}

/// Split an `ACTION=KEY` argument.
pub fn parse_override(arg: &str) -> Result<(&str, &str), KeymapError> {
    match arg.split_once('=') {
        Some((action, key)) if !action.is_empty() && !key.is_empty() => Ok((action, key)),
        _ => Err(KeymapError::Malformed(arg.to_string())),
    }
}

/// Name a key press the way bindings are written: `j`, `G`, `enter`,
/// `esc`, `ctrl+d`, a literal space for the space bar.
pub fn key_token(key: &KeyEvent) -> String {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let base = match key.code {
        KeyCode::Char(c) if ctrl => return format!("ctrl+{}", c.to_ascii_lowercase()),
        KeyCode::Char(c) if alt => return format!("alt+{}", c),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "shift+tab".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pgup".to_string(),
        KeyCode::PageDown => "pgdown".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::F(n) => format!("f{}", n),
        _ => String::new(),
    };
    if ctrl && !base.is_empty() {
        format!("ctrl+{}", base)
    } else {
        base
    }
}

pub fn key_label(key: &str) -> String {
    match key {
        "esc" => "ESC".to_string(),
        "enter" => "Enter".to_string(),
        " " => "SPACE".to_string(),
        other => other.to_string(),
    }
}

/// Distinct labels joined with `/`.
pub fn key_list(keys: &[&str]) -> String {
    let mut seen: Vec<String> = Vec::new();
    for key in keys {
        let label = key_label(key);
        if !label.is_empty() && !seen.contains(&label) {
            seen.push(label);
        }
    }
    seen.join("/")
}

/// `gg` for single-character keys, `home home` otherwise.
pub fn double_key(key: &str) -> String {
    let label = key_label(key);
    match label.chars().count() {
        0 => String::new(),
        1 => format!("{label}{label}"),
        _ => format!("{label} {label}"),
    }
}
