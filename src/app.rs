use std::collections::HashMap;
use std::rc::Rc;

use crossterm::event::KeyEvent;

use crate::config::Settings;
use crate::data::worker::{Job, Load, Outcome};
use crate::event::{Ticket, ViewKind};
use crate::keymap::{key_token, Action, Keymap};
use crate::model::status::Section;
use crate::views::branches::BranchesView;
use crate::views::diff::{DiffView, FileFilter};
use crate::views::log::LogView;
use crate::views::stash_diff::StashDiffView;
use crate::views::stashes::StashesView;
use crate::views::status::{refresh_job, StatusView};
use crate::views::Effect;

/// The screen currently in front. Status is always alive underneath; the
/// stash list stays alive while one of its entries is open.
pub enum View {
    Status,
    Diff(DiffView),
    Branches(BranchesView),
    Stashes(StashesView),
    StashDiff(StashesView, StashDiffView),
    Log(LogView),
}

impl View {
    pub fn kind(&self) -> ViewKind {
        match self {
            View::Status => ViewKind::Status,
            View::Diff(_) => ViewKind::Diff,
            View::Branches(_) => ViewKind::Branches,
            View::Stashes(_) => ViewKind::Stashes,
            View::StashDiff(..) => ViewKind::StashDiff,
            View::Log(_) => ViewKind::Log,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            View::Status => "STATUS",
            View::Diff(_) => "DIFF",
            View::Branches(_) => "BRANCHES",
            View::Stashes(_) => "STASHES",
            View::StashDiff(..) => "STASH",
            View::Log(_) => "LOG",
        }
    }
}

/// What the active view's key handler asked the router to do.
enum Step {
    Stay(ViewKind, Effect),
    ToStatus,
    ToStashes,
    OpenStash(usize),
}

pub struct App {
    pub keys: Rc<Keymap>,
    pub status: StatusView,
    pub view: View,
    pub should_quit: bool,
    pub dirty: bool,
    pub height: u16,
    show_help: bool,
    log_limit: usize,
    generations: HashMap<ViewKind, u64>,
    next_generation: u64,
    outbox: Vec<(Ticket, Job)>,
    editor_requested: bool,
    /// A tick refresh is queued or running.
    tick_pending: bool,
}

impl App {
    /// `height` is the terminal height; one row goes to the status bar.
    pub fn new(settings: Settings, height: u16) -> Self {
        let keys = Rc::new(settings.keymap);
        let content = content_height(height);
        let mut app = Self {
            status: StatusView::new(Rc::clone(&keys), settings.show_help, content),
            keys,
            view: View::Status,
            should_quit: false,
            dirty: true,
            height: content,
            show_help: settings.show_help,
            log_limit: settings.log_limit,
            generations: HashMap::new(),
            next_generation: 0,
            outbox: Vec::new(),
            editor_requested: false,
            tick_pending: false,
        };
        app.open(ViewKind::Status);
        app.submit(ViewKind::Status, refresh_job(false));
        app
    }

    /// Start a new generation for `kind`; results addressed to earlier
    /// instances are dropped from now on.
    fn open(&mut self, kind: ViewKind) {
        self.next_generation += 1;
        self.generations.insert(kind, self.next_generation);
    }

    fn close(&mut self, kind: ViewKind) {
        self.generations.remove(&kind);
    }

    fn submit(&mut self, kind: ViewKind, job: Job) {
        match self.generations.get(&kind) {
            Some(&generation) => self.outbox.push((
                Ticket {
                    view: kind,
                    generation,
                },
                job,
            )),
            None => log::warn!("no live {:?} view for job {:?}", kind, job),
        }
    }

    fn run(&mut self, kind: ViewKind, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Run(job) => self.submit(kind, job),
            Effect::Quit => self.should_quit = true,
            Effect::CommitWithEditor => self.editor_requested = true,
        }
    }

    /// Jobs queued since the last call, in the order they were requested.
    pub fn take_jobs(&mut self) -> Vec<(Ticket, Job)> {
        std::mem::take(&mut self.outbox)
    }

    pub fn take_editor_request(&mut self) -> bool {
        std::mem::take(&mut self.editor_requested)
    }

    /// Back from the interactive commit: report any failure and refresh.
    pub fn after_editor(&mut self, error: Option<String>) {
        if let Some(e) = error {
            self.status.error = Some(e);
        }
        self.submit(ViewKind::Status, refresh_job(false));
        self.dirty = true;
    }

    pub fn handle_resize(&mut self, height: u16) {
        self.height = content_height(height);
        let h = self.height;
        self.status.resize(h);
        match &mut self.view {
            View::Status => {}
            View::Diff(v) => v.resize(h),
            View::Branches(v) => v.resize(h),
            View::Stashes(v) => v.resize(h),
            View::StashDiff(list, v) => {
                list.resize(h);
                v.resize(h);
            }
            View::Log(v) => v.resize(h),
        }
        self.dirty = true;
    }

    /// Periodic status refresh, only while the status view is idle in front
    /// and the previous one has come back.
    pub fn tick(&mut self) {
        if self.tick_pending {
            return;
        }
        if matches!(self.view, View::Status) && !self.status.is_blocking() {
            self.submit(ViewKind::Status, refresh_job(true));
            self.tick_pending = true;
        }
    }

    pub fn handle_completion(&mut self, ticket: Ticket, outcome: Outcome) {
        if ticket.view == ViewKind::Status
            && matches!(
                outcome,
                Outcome::Status {
                    background: true,
                    ..
                } | Outcome::Failed(_)
            )
        {
            self.tick_pending = false;
        }
        if self.generations.get(&ticket.view) != Some(&ticket.generation) {
            log::debug!("dropping stale result for {:?}", ticket);
            return;
        }
        let effect = match (ticket.view, &mut self.view) {
            (ViewKind::Status, _) => self.status.apply(outcome),
            (ViewKind::Diff, View::Diff(v)) => v.apply(outcome),
            (ViewKind::Branches, View::Branches(v)) => v.apply(outcome),
            (ViewKind::Stashes, View::Stashes(v)) => v.apply(outcome),
            (ViewKind::Stashes, View::StashDiff(list, _)) => list.apply(outcome),
            (ViewKind::StashDiff, View::StashDiff(_, v)) => v.apply(outcome),
            (ViewKind::Log, View::Log(v)) => v.apply(outcome),
            (kind, _) => {
                log::debug!("no view to receive {:?} result", kind);
                Effect::None
            }
        };
        self.run(ticket.view, effect);
        self.dirty = true;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.dirty = true;
        let token = key_token(&key);
        if token == "ctrl+c" {
            self.should_quit = true;
            return;
        }

        let keys = Rc::clone(&self.keys);
        let is = |action| keys.is(action, &token);
        let leave = is(Action::Left) || token == "left" || token == "esc";

        if matches!(self.view, View::Status) {
            if self.status.is_navigating() && self.status_route(&token) {
                self.status.disarm();
            } else {
                let effect = self.status.handle_key(key);
                self.run(ViewKind::Status, effect);
            }
            return;
        }

        let step = match &mut self.view {
            View::Status => Step::Stay(ViewKind::Status, Effect::None),
            View::Diff(v) => {
                if leave && !v.is_blocking() && v.can_leave() {
                    Step::ToStatus
                } else {
                    Step::Stay(ViewKind::Diff, v.handle_key(key))
                }
            }
            View::Branches(v) => {
                if (leave || is(Action::Quit)) && !v.is_blocking() {
                    Step::ToStatus
                } else {
                    Step::Stay(ViewKind::Branches, v.handle_key(key))
                }
            }
            View::Stashes(v) => {
                let drill = is(Action::Right) || token == "right" || token == "enter";
                if (leave || is(Action::Quit)) && !v.is_blocking() {
                    Step::ToStatus
                } else if drill && !v.is_blocking() {
                    match v.current_stash() {
                        Some(stash) => Step::OpenStash(stash.index),
                        None => Step::Stay(ViewKind::Stashes, Effect::None),
                    }
                } else {
                    Step::Stay(ViewKind::Stashes, v.handle_key(key))
                }
            }
            View::StashDiff(_, v) => {
                if leave && !v.is_blocking() {
                    if v.back_to_list() {
                        Step::Stay(ViewKind::StashDiff, Effect::None)
                    } else {
                        Step::ToStashes
                    }
                } else if is(Action::Quit) && !v.is_blocking() {
                    Step::ToStashes
                } else {
                    Step::Stay(ViewKind::StashDiff, v.handle_key(key))
                }
            }
            View::Log(v) => {
                if (leave || is(Action::Quit) || is(Action::Log)) && !v.is_blocking() {
                    Step::ToStatus
                } else {
                    Step::Stay(ViewKind::Log, v.handle_key(key))
                }
            }
        };

        match step {
            Step::Stay(kind, effect) => self.run(kind, effect),
            Step::ToStatus => self.back_to_status(),
            Step::ToStashes => self.back_to_stashes(),
            Step::OpenStash(index) => self.open_stash(index),
        }
    }

    /// Keys on the status screen that open another view. Returns whether
    /// the key was consumed.
    fn status_route(&mut self, token: &str) -> bool {
        let keys = Rc::clone(&self.keys);
        let is = |action| keys.is(action, token);

        if is(Action::FileDiff) || is(Action::Right) || token == "right" || token == "enter" {
            if self.status.items.is_empty() {
                return false;
            }
            let filters = self
                .status
                .targets()
                .into_iter()
                .map(|item| FileFilter {
                    path: item.file.path,
                    staged: item.section == Section::Staged,
                    untracked: item.section == Section::Untracked,
                })
                .collect();
            self.open_diff(filters);
        } else if is(Action::AllDiffs) || is(Action::FullDiff) {
            self.open_diff(Vec::new());
        } else if is(Action::Branches) {
            let view = BranchesView::new(Rc::clone(&self.keys), self.show_help, self.height);
            self.switch(View::Branches(view), Job::Load(Load::Branches));
        } else if is(Action::Stashes) {
            let view = StashesView::new(Rc::clone(&self.keys), self.show_help, self.height);
            self.switch(View::Stashes(view), Job::Load(Load::Stashes));
        } else if is(Action::Log) {
            let view = LogView::new(Rc::clone(&self.keys), self.log_limit, self.height);
            let job = view.load_job();
            self.switch(View::Log(view), job);
        } else {
            return false;
        }
        true
    }

    fn open_diff(&mut self, filters: Vec<FileFilter>) {
        let view = DiffView::new(Rc::clone(&self.keys), filters, self.height);
        let job = Job::Load(view.load());
        self.switch(View::Diff(view), job);
    }

    /// Put a freshly created view in front and load its data.
    fn switch(&mut self, view: View, job: Job) {
        let kind = view.kind();
        log::debug!("opening {:?}", kind);
        self.open(kind);
        self.view = view;
        self.submit(kind, job);
    }

    fn back_to_status(&mut self) {
        match std::mem::replace(&mut self.view, View::Status) {
            View::StashDiff(..) => {
                self.close(ViewKind::StashDiff);
                self.close(ViewKind::Stashes);
            }
            other => self.close(other.kind()),
        }
        self.submit(ViewKind::Status, refresh_job(false));
    }

    fn open_stash(&mut self, index: usize) {
        if let View::Stashes(list) = std::mem::replace(&mut self.view, View::Status) {
            let view = StashDiffView::new(Rc::clone(&self.keys), index, self.height);
            let job = view.load_job();
            self.open(ViewKind::StashDiff);
            self.view = View::StashDiff(list, view);
            self.submit(ViewKind::StashDiff, job);
        }
    }

    fn back_to_stashes(&mut self) {
        match std::mem::replace(&mut self.view, View::Status) {
            View::StashDiff(list, _) => {
                self.close(ViewKind::StashDiff);
                self.view = View::Stashes(list);
            }
            other => self.view = other,
        }
    }
}

fn content_height(terminal_height: u16) -> u16 {
    terminal_height.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;
    use crate::error::GitError;
    use crate::model::diff::CombinedDiff;
    use crate::model::stash::Stash;
    use crate::model::status::{BranchStatus, FileStatus, StatusResult};
    use crate::views::status::tests::{code, key};

    fn settings() -> Settings {
        Settings {
            tick_rate: Duration::from_millis(500),
            log_limit: 100,
            show_help: false,
            keymap: Keymap::default(),
        }
    }

    fn status_outcome(paths: &[&str]) -> Outcome {
        let mut status = StatusResult::default();
        for path in paths {
            status.push(FileStatus {
                path: path.to_string(),
                display_path: path.to_string(),
                index: ' ',
                work: 'M',
                original_path: None,
                original_display_path: None,
            });
        }
        Outcome::Status {
            status,
            branch: BranchStatus::default(),
            background: false,
        }
    }

    /// App with the initial status load already answered.
    fn ready(paths: &[&str]) -> App {
        let mut app = App::new(settings(), 40);
        let jobs = app.take_jobs();
        assert_eq!(jobs.len(), 1);
        app.handle_completion(jobs[0].0, status_outcome(paths));
        app
    }

    #[test]
    fn starts_with_a_status_load() {
        let mut app = App::new(settings(), 40);
        let jobs = app.take_jobs();
        assert_eq!(jobs[0].0.view, ViewKind::Status);
        assert_eq!(jobs[0].1, refresh_job(false));
        assert_eq!(app.height, 39);
    }

    #[test]
    fn file_diff_opens_filtered_view() {
        let mut app = ready(&["a.rs", "b.rs"]);
        app.handle_key(key('j'));
        app.handle_key(key('l'));
        let View::Diff(ref view) = app.view else {
            panic!("expected diff view");
        };
        assert_eq!(
            view.filters,
            vec![FileFilter {
                path: "b.rs".to_string(),
                staged: false,
                untracked: false,
            }]
        );
        let jobs = app.take_jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].0.view, ViewKind::Diff);
        assert_eq!(jobs[0].1, Job::Load(Load::Diff { untracked: Vec::new() }));
    }

    #[test]
    fn leaving_a_view_refreshes_status_and_drops_its_results() {
        let mut app = ready(&["a.rs"]);
        app.handle_key(key('i'));
        let diff_ticket = app.take_jobs()[0].0;

        app.handle_key(code(KeyCode::Esc));
        assert!(matches!(app.view, View::Status));
        let jobs = app.take_jobs();
        assert_eq!(jobs[0].1, refresh_job(false));

        app.handle_completion(diff_ticket, Outcome::Diff(CombinedDiff::default()));
        assert!(matches!(app.view, View::Status));
    }

    #[test]
    fn reopened_view_ignores_previous_instance() {
        let mut app = ready(&["a.rs"]);
        app.handle_key(key('b'));
        let old = app.take_jobs()[0].0;
        app.handle_key(key('q'));
        app.take_jobs();
        app.handle_key(key('b'));
        let new = app.take_jobs()[0].0;
        assert_ne!(old, new);

        app.handle_completion(old, Outcome::Branches(Vec::new()));
        let View::Branches(ref view) = app.view else {
            panic!("expected branches view");
        };
        assert!(!view.loaded);
    }

    #[test]
    fn tick_only_refreshes_idle_status() {
        let mut app = ready(&["a.rs", "b.rs"]);
        app.tick();
        assert_eq!(app.take_jobs()[0].1, refresh_job(true));

        app.handle_key(key('v'));
        app.tick();
        assert!(app.take_jobs().is_empty());

        app.handle_key(key('v'));
        app.handle_key(key('o'));
        app.take_jobs();
        app.tick();
        assert!(app.take_jobs().is_empty());
    }

    fn background_status() -> Outcome {
        let Outcome::Status { status, branch, .. } = status_outcome(&["a.rs"]) else {
            unreachable!()
        };
        Outcome::Status {
            status,
            branch,
            background: true,
        }
    }

    #[test]
    fn tick_waits_for_the_previous_refresh() {
        let mut app = ready(&["a.rs"]);
        for _ in 0..5 {
            app.tick();
        }
        let jobs = app.take_jobs();
        assert_eq!(jobs.len(), 1);

        app.tick();
        assert!(app.take_jobs().is_empty());

        app.handle_completion(jobs[0].0, background_status());
        app.tick();
        assert_eq!(app.take_jobs().len(), 1);
    }

    #[test]
    fn inline_error_survives_tick_refresh() {
        let mut app = ready(&["a.rs"]);
        let ticket = Ticket {
            view: ViewKind::Status,
            generation: app.generations[&ViewKind::Status],
        };
        app.handle_completion(ticket, Outcome::Failed(GitError::NoRemotesConfigured));
        let shown = app.status.error.clone();
        assert!(shown.is_some());

        app.tick();
        let jobs = app.take_jobs();
        assert_eq!(jobs.len(), 1);
        app.handle_completion(jobs[0].0, background_status());
        assert_eq!(app.status.error, shown);

        // An explicit reload clears it.
        app.handle_completion(ticket, status_outcome(&["a.rs"]));
        assert_eq!(app.status.error, None);
    }

    #[test]
    fn routed_key_forgets_pending_top_prefix() {
        let mut app = ready(&["a.rs", "b.rs", "c.rs"]);
        app.handle_key(key('G'));
        assert_eq!(app.status.cursor, 2);
        app.handle_key(key('g'));
        app.handle_key(key('b'));
        assert!(matches!(app.view, View::Branches(_)));
        app.handle_key(key('q'));
        assert!(matches!(app.view, View::Status));

        app.handle_key(key('g'));
        assert_eq!(app.status.cursor, 2);
        app.handle_key(key('g'));
        assert_eq!(app.status.cursor, 0);
    }

    #[test]
    fn stash_diff_returns_to_the_list() {
        let mut app = ready(&["a.rs"]);
        app.handle_key(key('e'));
        let ticket = app.take_jobs()[0].0;
        app.handle_completion(
            ticket,
            Outcome::Stashes(vec![Stash {
                index: 0,
                branch: "main".to_string(),
                message: "wip".to_string(),
            }]),
        );
        app.handle_key(code(KeyCode::Enter));
        assert!(matches!(app.view, View::StashDiff(..)));
        assert_eq!(app.take_jobs()[0].1, Job::Load(Load::StashDiff(0)));

        app.handle_key(key('q'));
        let View::Stashes(ref list) = app.view else {
            panic!("expected stash list");
        };
        assert_eq!(list.stashes.len(), 1);
        assert!(app.take_jobs().is_empty());
    }

    #[test]
    fn ctrl_c_quits_from_any_view() {
        let mut app = ready(&["a.rs"]);
        app.handle_key(key('o'));
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn commit_edit_requests_the_editor() {
        let mut app = ready(&["a.rs"]);
        app.handle_key(key('C'));
        assert!(app.take_editor_request());
        assert!(!app.take_editor_request());
        app.after_editor(Some("commit failed".to_string()));
        assert_eq!(app.status.error.as_deref(), Some("commit failed"));
        assert_eq!(app.take_jobs()[0].1, refresh_job(false));
    }
}
