use thiserror::Error;

/// Failures surfaced by git operations.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository (or any parent up to the filesystem root)")]
    NotARepository,

    #[error("{operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error("branch '{branch}' is not fully merged")]
    NotFullyMerged { branch: String, message: String },

    #[error("no remotes configured")]
    NoRemotesConfigured,

    #[error("stash@{{{index}}} changed since it was selected; refresh and try again")]
    StashMoved { index: usize },

    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),
}

pub type GitResult<T> = Result<T, GitError>;
