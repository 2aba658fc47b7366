use std::sync::mpsc;
use std::thread;

use crate::data::git::Git;
use crate::error::{GitError, GitResult};
use crate::event::{AppEvent, Ticket};
use crate::model::branch::Branch;
use crate::model::diff::CombinedDiff;
use crate::model::stash::Stash;
use crate::model::status::{BranchStatus, StatusResult};

/// Deferred git work requested by a view. Jobs run one at a time, in
/// submission order, on the worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Load(Load),
    /// Run the mutation, then the load when it succeeded.
    Mutate(Mutation, Load),
}

/// Read-only queries whose results replace a view's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Load {
    /// `background` marks tick refreshes, which views may ignore while busy.
    Status { background: bool },
    /// Staged and unstaged diffs plus synthesized diffs for `untracked`.
    Diff { untracked: Vec<String> },
    Branches,
    Stashes,
    StashDiff(usize),
    Log(usize),
    Remotes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOp {
    Stage(String),
    Unstage(String),
    Discard(String),
    RemoveUntracked(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Files(Vec<FileOp>),
    StageAll,
    UnstageAll,
    Commit(String),
    Push,
    PushSetUpstream { remote: String, branch: String },
    StashAll(String),
    StashFiles { paths: Vec<String>, message: String },
    ApplyPatch { patch: String, cached: bool, reverse: bool },
    Checkout(String),
    CreateBranch(String),
    DeleteBranch(String),
    ForceDeleteBranch(String),
    ApplyStash(usize),
    /// Pop and drop carry the entry the user confirmed, re-checked before
    /// acting.
    PopStash(Stash),
    DropStash(Stash),
}

#[derive(Debug)]
pub enum Outcome {
    Status {
        status: StatusResult,
        branch: BranchStatus,
        background: bool,
    },
    Diff(CombinedDiff),
    Branches(Vec<Branch>),
    Stashes(Vec<Stash>),
    Log(String),
    Remotes(Vec<String>),
    Failed(GitError),
}

/// Single background thread draining a FIFO job queue.
pub struct Worker {
    tx: mpsc::Sender<(Ticket, Job)>,
}

impl Worker {
    pub fn spawn(git: Git, events: mpsc::Sender<AppEvent>) -> Self {
        let (tx, rx) = mpsc::channel::<(Ticket, Job)>();
        thread::spawn(move || {
            for (ticket, job) in rx {
                log::debug!("job {:?} for {:?}", job, ticket);
                let outcome = execute(&git, job);
                if let Outcome::Failed(ref e) = outcome {
                    log::warn!("job for {:?} failed: {}", ticket.view, e);
                }
                if events.send(AppEvent::Completed { ticket, outcome }).is_err() {
                    break;
                }
            }
        });
        Self { tx }
    }

    pub fn submit(&self, ticket: Ticket, job: Job) {
        if self.tx.send((ticket, job)).is_err() {
            log::error!("worker thread is gone; dropping job for {:?}", ticket.view);
        }
    }
}

/// Run a job to completion on the calling thread.
pub fn execute(git: &Git, job: Job) -> Outcome {
    match job {
        Job::Load(load) => run_load(git, load),
        Job::Mutate(mutation, then) => match run_mutation(git, mutation) {
            Ok(()) => run_load(git, then),
            Err(e) => Outcome::Failed(e),
        },
    }
}

fn run_load(git: &Git, load: Load) -> Outcome {
    let result = match load {
        Load::Status { background } => git.status().map(|status| Outcome::Status {
            status,
            branch: git.branch_status(),
            background,
        }),
        Load::Diff { untracked } => load_diff(git, &untracked).map(Outcome::Diff),
        Load::Branches => git.branches().map(Outcome::Branches),
        Load::Stashes => git.stashes().map(Outcome::Stashes),
        Load::StashDiff(index) => git.stash_diff(index).map(Outcome::Diff),
        Load::Log(limit) => git.log(limit).map(Outcome::Log),
        Load::Remotes => git.remotes().map(Outcome::Remotes),
    };
    result.unwrap_or_else(Outcome::Failed)
}

fn load_diff(git: &Git, untracked: &[String]) -> GitResult<CombinedDiff> {
    let mut combined = git.combined_diff()?;
    for path in untracked {
        // Once staged, `--no-index` would still report the whole file.
        if combined.tracks(path) {
            continue;
        }
        if let Some(file) = git.untracked_file_diff(path)? {
            combined.untracked.push(file);
        }
    }
    Ok(combined)
}

fn run_mutation(git: &Git, mutation: Mutation) -> GitResult<()> {
    match mutation {
        Mutation::Files(ops) => {
            for op in ops {
                match op {
                    FileOp::Stage(path) => git.stage_file(&path)?,
                    FileOp::Unstage(path) => git.unstage_file(&path)?,
                    FileOp::Discard(path) => git.discard_file(&path)?,
                    FileOp::RemoveUntracked(path) => git.remove_untracked(&path)?,
                }
            }
            Ok(())
        }
        Mutation::StageAll => git.stage_all(),
        Mutation::UnstageAll => git.unstage_all(),
        Mutation::Commit(message) => git.commit(&message),
        Mutation::Push => git.push(),
        Mutation::PushSetUpstream { remote, branch } => git.push_set_upstream(&remote, &branch),
        Mutation::StashAll(message) => git.stash_all(&message),
        Mutation::StashFiles { paths, message } => git.stash_files(&paths, &message),
        Mutation::ApplyPatch {
            patch,
            cached,
            reverse,
        } => git.apply_patch(&patch, cached, reverse),
        Mutation::Checkout(name) => git.checkout_branch(&name),
        Mutation::CreateBranch(name) => git.create_branch(&name),
        Mutation::DeleteBranch(name) => git.delete_branch(&name),
        Mutation::ForceDeleteBranch(name) => git.force_delete_branch(&name),
        Mutation::ApplyStash(index) => git.apply_stash(index),
        Mutation::PopStash(stash) => {
            git.verify_stash(&stash)?;
            git.pop_stash(stash.index)
        }
        Mutation::DropStash(stash) => {
            git.verify_stash(&stash)?;
            git.drop_stash(stash.index)
        }
    }
}
