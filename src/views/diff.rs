use std::rc::Rc;

use crossterm::event::KeyEvent;

use crate::data::worker::{Job, Load, Mutation, Outcome};
use crate::keymap::{key_token, Action, Keymap};
use crate::model::diff::{CombinedDiff, Hunk};
use crate::views::{
    clamp_cursor, detail_rows, scroll_to, ConfirmStep, DoubleKey, Effect, Press, TypedConfirm,
};

/// One file the view is limited to. Tracked files are matched on both path
/// and side; untracked ones get a synthesized diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub path: String,
    pub staged: bool,
    pub untracked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    List,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffMode {
    List,
    Detail,
    ConfirmDiscard { back: Pane, confirm: TypedConfirm },
    Help { back: Pane },
}

impl From<Pane> for DiffMode {
    fn from(pane: Pane) -> Self {
        match pane {
            Pane::List => DiffMode::List,
            Pane::Detail => DiffMode::Detail,
        }
    }
}

pub struct DiffView {
    keys: Rc<Keymap>,
    /// Empty means every tracked hunk.
    pub filters: Vec<FileFilter>,
    pub diff: CombinedDiff,
    pub hunks: Vec<Hunk>,
    pub loaded: bool,
    pub cursor: usize,
    pub list_scroll: usize,
    /// Line offset inside the hunk shown in detail.
    pub scroll: usize,
    pub mode: DiffMode,
    pub error: Option<String>,
    pub height: u16,
    top: DoubleKey,
}

impl DiffView {
    pub fn new(keys: Rc<Keymap>, filters: Vec<FileFilter>, height: u16) -> Self {
        Self {
            keys,
            filters,
            diff: CombinedDiff::default(),
            hunks: Vec::new(),
            loaded: false,
            cursor: 0,
            list_scroll: 0,
            scroll: 0,
            mode: DiffMode::List,
            error: None,
            height,
            top: DoubleKey::default(),
        }
    }

    pub fn load(&self) -> Load {
        Load::Diff {
            untracked: self
                .filters
                .iter()
                .filter(|f| f.untracked)
                .map(|f| f.path.clone())
                .collect(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(
            self.mode,
            DiffMode::Help { .. } | DiffMode::ConfirmDiscard { .. }
        )
    }

    /// Whether a leave key should return to status. From detail that is
    /// only the case when the single hunk was opened automatically.
    pub fn can_leave(&self) -> bool {
        match self.mode {
            DiffMode::List => true,
            DiffMode::Detail => self.hunks.len() == 1,
            _ => false,
        }
    }

    pub fn current_hunk(&self) -> Option<&Hunk> {
        self.hunks.get(self.cursor)
    }

    pub fn list_rows(&self) -> usize {
        if self.height > 15 {
            (usize::from(self.height - 15) / 3).max(5)
        } else {
            10
        }
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
        self.list_scroll = scroll_to(self.cursor, self.list_scroll, self.list_rows());
        self.scroll = self.scroll.min(self.max_scroll());
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
        match &mut self.mode {
            DiffMode::Help { back } => {
                if keys.is(Action::Help, token) || keys.is(Action::Quit, token) || token == "esc"
                {
                    self.mode = (*back).into();
                }
                Effect::None
            }
            DiffMode::ConfirmDiscard { back, confirm } => {
                let back = *back;
                match confirm.feed(token) {
                    ConfirmStep::Pending => Effect::None,
                    ConfirmStep::Cancelled => {
                        self.mode = back.into();
                        Effect::None
                    }
                    ConfirmStep::Accepted => {
                        self.mode = back.into();
                        self.patch_job(false, true)
                    }
                }
            }
            DiffMode::List => self.list_key(token),
            DiffMode::Detail => self.detail_key(token),
        }
    }

    fn list_key(&mut self, token: &str) -> Effect {
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

        if is(Action::Right) || token == "right" || token == "enter" {
            if !self.hunks.is_empty() {
                self.mode = DiffMode::Detail;
                self.scroll = 0;
            }
        } else if is(Action::Down) || token == "down" {
            self.select(self.cursor + 1);
        } else if is(Action::Up) || token == "up" {
            self.select(self.cursor.saturating_sub(1));
        } else if is(Action::Bottom) {
            self.select(self.hunks.len().saturating_sub(1));
        } else {
            return self.hunk_key(token, Pane::List);
        }
        Effect::None
    }

    fn detail_key(&mut self, token: &str) -> Effect {
        let keys = Rc::clone(&self.keys);
        let is = |action| keys.is(action, token);

        match self.top.feed(is(Action::Top)) {
            Press::Fired => {
                self.scroll = 0;
                return Effect::None;
            }
            Press::Armed => return Effect::None,
            Press::Other => {}
        }

        if is(Action::Left) || token == "left" || token == "esc" {
            self.mode = DiffMode::List;
            self.scroll = 0;
        } else if is(Action::Down) || token == "down" {
            self.scroll = (self.scroll + 1).min(self.max_scroll());
        } else if is(Action::Up) || token == "up" {
            self.scroll = self.scroll.saturating_sub(1);
        } else if is(Action::Bottom) {
            self.scroll = self.max_scroll();
        } else {
            return self.hunk_key(token, Pane::Detail);
        }
        Effect::None
    }

    /// Keys shared by list and detail.
    fn hunk_key(&mut self, token: &str, pane: Pane) -> Effect {
        let keys = Rc::clone(&self.keys);
        let is = |action| keys.is(action, token);
        let staged = self.current_hunk().map(|h| h.staged);

        if token == " " {
            match staged {
                Some(true) => self.patch_job(true, true),
                Some(false) => self.patch_job(true, false),
                None => Effect::None,
            }
        } else if is(Action::Stage) {
            match staged {
                Some(false) => self.patch_job(true, false),
                _ => Effect::None,
            }
        } else if is(Action::Unstage) {
            match staged {
                Some(true) => self.patch_job(true, true),
                _ => Effect::None,
            }
        } else if is(Action::Discard) {
            if staged == Some(false) {
                self.mode = DiffMode::ConfirmDiscard {
                    back: pane,
                    confirm: TypedConfirm::yes(),
                };
            }
            Effect::None
        } else if is(Action::Quit) {
            Effect::Quit
        } else if is(Action::Help) {
            self.mode = DiffMode::Help { back: pane };
            Effect::None
        } else {
            Effect::None
        }
    }

    fn select(&mut self, index: usize) {
        self.cursor = clamp_cursor(index, self.hunks.len());
        self.list_scroll = scroll_to(self.cursor, self.list_scroll, self.list_rows());
    }

    /// Apply the cursor hunk as a patch, then reload.
    fn patch_job(&self, cached: bool, reverse: bool) -> Effect {
        let Some(hunk) = self.current_hunk() else {
            return Effect::None;
        };
        let Some(file) = self.diff.file_diff(hunk) else {
            log::warn!("no file diff for hunk in {}", hunk.file_path);
            return Effect::None;
        };
        Effect::Run(Job::Mutate(
            Mutation::ApplyPatch {
                patch: hunk.generate_patch(file),
                cached,
                reverse,
            },
            self.load(),
        ))
    }

    pub fn apply(&mut self, outcome: Outcome) -> Effect {
        match outcome {
            Outcome::Diff(diff) => self.set_diff(diff),
            Outcome::Failed(e) => self.error = Some(e.to_string()),
            other => log::debug!("diff view ignoring {:?}", other),
        }
        Effect::None
    }

    fn set_diff(&mut self, diff: CombinedDiff) {
        let fresh = self.filtered_hunks(&diff);
        self.hunks = if self.hunks.is_empty() {
            fresh
        } else {
            keep_order(&self.hunks, fresh)
        };
        self.diff = diff;
        self.loaded = true;
        self.select(self.cursor);

        match self.hunks.len() {
            0 if self.mode == DiffMode::Detail => self.mode = DiffMode::List,
            1 if self.mode == DiffMode::List => {
                self.mode = DiffMode::Detail;
                self.scroll = 0;
            }
            _ => {}
        }
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn filtered_hunks(&self, diff: &CombinedDiff) -> Vec<Hunk> {
        let all = diff.all_hunks();
        if self.filters.is_empty() {
            return all;
        }
        // An untracked file that has since been added matches on either side.
        let mut hunks: Vec<Hunk> = all
            .into_iter()
            .filter(|h| {
                self.filters
                    .iter()
                    .any(|f| f.path == h.file_path && (f.untracked || f.staged == h.staged))
            })
            .collect();
        for file in &diff.untracked {
            if self.filters.iter().any(|f| f.untracked && f.path == file.path) {
                hunks.extend(file.hunks.iter().cloned());
            }
        }
        hunks
    }
}

/// Reorder `fresh` so hunks that were already on screen keep their
/// positions; new ones go at the end.
pub fn keep_order(previous: &[Hunk], fresh: Vec<Hunk>) -> Vec<Hunk> {
    let mut remaining: Vec<Option<Hunk>> = fresh.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());
    for old in previous {
        let key = old.stable_key();
        let slot = remaining
            .iter_mut()
            .find(|h| h.as_ref().is_some_and(|h| h.stable_key() == key));
        if let Some(slot) = slot {
            ordered.extend(slot.take());
        }
    }
    ordered.extend(remaining.into_iter().flatten());
    ordered
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use super::*;
    use crate::data::git::tests::scratch_repo;
    use crate::data::worker::execute;
    use crate::model::diff::parse_diff;
    use crate::views::status::tests::{code, key};

    const TWO_FILES: &str = "\
diff --git a/a.txt b/a.txt
index 1111111..2222222 100644
--- a/a.txt
+++ b/a.txt
@@ -1,2 +1,2 @@
-old a
+new a
 keep
@@ -10,1 +10,2 @@
 ten
+eleven
diff --git a/b.txt b/b.txt
index 3333333..4444444 100644
--- a/b.txt
+++ b/b.txt
@@ -3 +3 @@
-x
+y
";

    fn unstaged(text: &str) -> CombinedDiff {
        CombinedDiff {
            unstaged: parse_diff(text),
            ..CombinedDiff::default()
        }
    }

    fn view(filters: Vec<FileFilter>) -> DiffView {
        DiffView::new(Rc::new(Keymap::default()), filters, 40)
    }

    #[test]
    fn single_hunk_opens_in_detail() {
        let mut v = view(vec![FileFilter {
            path: "b.txt".to_string(),
            staged: false,
            untracked: false,
        }]);
        v.apply(Outcome::Diff(unstaged(TWO_FILES)));
        assert_eq!(v.hunks.len(), 1);
        assert_eq!(v.mode, DiffMode::Detail);
        assert!(v.can_leave());
    }

    #[test]
    fn filter_matches_side() {
        let mut v = view(vec![FileFilter {
            path: "b.txt".to_string(),
            staged: true,
            untracked: false,
        }]);
        v.apply(Outcome::Diff(unstaged(TWO_FILES)));
        assert!(v.hunks.is_empty());
        assert_eq!(v.mode, DiffMode::List);
    }

    #[test]
    fn list_navigation_and_drill() {
        let mut v = view(Vec::new());
        v.apply(Outcome::Diff(unstaged(TWO_FILES)));
        assert_eq!(v.hunks.len(), 3);
        assert_eq!(v.mode, DiffMode::List);

        v.handle_key(key('G'));
        assert_eq!(v.cursor, 2);
        v.handle_key(key('g'));
        v.handle_key(key('g'));
        assert_eq!(v.cursor, 0);

        v.handle_key(key('l'));
        assert_eq!(v.mode, DiffMode::Detail);
        assert!(!v.can_leave());
        v.handle_key(code(KeyCode::Esc));
        assert_eq!(v.mode, DiffMode::List);
    }

    #[test]
    fn detail_scroll_is_clamped() {
        let body: String = (0..50).map(|i| format!("+line {}\n", i)).collect();
        let text = format!(
            "diff --git a/big b/big\n--- a/big\n+++ b/big\n@@ -0,0 +1,50 @@\n{}",
            body
        );
        let mut v = view(Vec::new());
        v.height = 20;
        v.apply(Outcome::Diff(unstaged(&text)));
        assert_eq!(v.mode, DiffMode::Detail);

        v.handle_key(key('G'));
        assert_eq!(v.scroll, 50 - 15);
        v.handle_key(key('j'));
        assert_eq!(v.scroll, 35);
        v.handle_key(key('g'));
        v.handle_key(key('g'));
        assert_eq!(v.scroll, 0);
        v.handle_key(key('k'));
        assert_eq!(v.scroll, 0);
    }

    #[test]
    fn space_stages_with_generated_patch() {
        let mut v = view(Vec::new());
        v.apply(Outcome::Diff(unstaged(TWO_FILES)));
        v.handle_key(key('j'));
        let effect = v.handle_key(key(' '));
        let Effect::Run(Job::Mutate(
            Mutation::ApplyPatch {
                patch,
                cached,
                reverse,
            },
            Load::Diff { .. },
        )) = effect
        else {
            panic!("expected a patch job");
        };
        assert!(cached);
        assert!(!reverse);
        assert!(patch.starts_with("diff --git a/a.txt b/a.txt\n"));
        assert!(patch.contains("@@ -10,1 +10,2 @@\n ten\n+eleven\n"));
        assert!(!patch.contains("old a"));
    }

    #[test]
    fn unstage_ignores_unstaged_hunks() {
        let mut v = view(Vec::new());
        v.apply(Outcome::Diff(unstaged(TWO_FILES)));
        assert_eq!(v.handle_key(key('u')), Effect::None);
    }

    #[test]
    fn discard_confirm_returns_to_previous_pane() {
        let mut v = view(Vec::new());
        v.apply(Outcome::Diff(unstaged(TWO_FILES)));
        v.handle_key(key('l'));
        v.handle_key(key('d'));
        assert!(v.is_blocking());
        for c in "yes".chars() {
            v.handle_key(key(c));
        }
        let effect = v.handle_key(code(KeyCode::Enter));
        assert!(matches!(
            effect,
            Effect::Run(Job::Mutate(
                Mutation::ApplyPatch {
                    cached: false,
                    reverse: true,
                    ..
                },
                _
            ))
        ));
        assert_eq!(v.mode, DiffMode::Detail);
    }

    #[test]
    fn refresh_keeps_hunk_positions() {
        let mut v = view(Vec::new());
        v.apply(Outcome::Diff(unstaged(TWO_FILES)));
        let keys: Vec<_> = v.hunks.iter().map(Hunk::stable_key).collect();

        // The first hunk moved to the index; it stays in first position.
        let all = unstaged(TWO_FILES);
        let mut staged = all.unstaged.clone();
        staged.files.truncate(1);
        staged.files[0].hunks.truncate(1);
        let mut rest = all.unstaged.clone();
        rest.files[0].hunks.remove(0);
        v.apply(Outcome::Diff(CombinedDiff {
            staged,
            unstaged: rest,
            untracked: Vec::new(),
        }));

        let after: Vec<_> = v.hunks.iter().map(Hunk::stable_key).collect();
        assert_eq!(after, keys);
        assert!(v.hunks[0].staged);
    }

    #[test]
    fn untracked_file_is_staged_only_once() {
        let Some((dir, git)) = scratch_repo() else { return };
        std::fs::write(dir.path().join("fresh.txt"), "one\ntwo\n").unwrap();
        let mut v = view(vec![FileFilter {
            path: "fresh.txt".to_string(),
            staged: false,
            untracked: true,
        }]);
        let load = v.load();
        assert_eq!(
            load,
            Load::Diff {
                untracked: vec!["fresh.txt".to_string()]
            }
        );
        v.apply(execute(&git, Job::Load(load)));
        assert_eq!(v.hunks.len(), 1);
        assert!(!v.hunks[0].staged);

        let Effect::Run(job) = v.handle_key(key(' ')) else {
            panic!("expected a patch job");
        };
        v.apply(execute(&git, job));
        assert_eq!(v.error, None);
        assert!(v.diff.untracked.is_empty());
        assert_eq!(v.hunks.len(), 1);
        assert!(v.hunks[0].staged);
        assert_eq!(git.status().unwrap().staged[0].path, "fresh.txt");

        // Space again unstages rather than re-applying the new-file patch.
        let Effect::Run(job) = v.handle_key(key(' ')) else {
            panic!("expected a patch job");
        };
        v.apply(execute(&git, job));
        assert_eq!(v.error, None);
        assert!(git.status().unwrap().staged.is_empty());
    }

    #[test]
    fn help_closes_back_to_list() {
        let mut v = view(Vec::new());
        v.apply(Outcome::Diff(unstaged(TWO_FILES)));
        v.handle_key(key('?'));
        assert!(v.is_blocking());
        v.handle_key(key('q'));
        assert_eq!(v.mode, DiffMode::List);
        assert_eq!(v.handle_key(key('q')), Effect::Quit);
    }
}
