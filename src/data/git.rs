use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use crate::error::{GitError, GitResult};
use crate::model::branch::{self, Branch};
use crate::model::diff::{self, CombinedDiff, DiffResult, FileDiff};
use crate::model::stash::{self, Stash};
use crate::model::status::{BranchStatus, FileStatus, StatusResult};

/// Synchronous wrapper around the `git` executable.
///
/// Every method is a single git invocation run from the repository root.
/// The root is resolved once in [`Git::discover`] and kept for the life of
/// the process; clones share it.
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
    cwd: PathBuf,
}

impl Git {
    /// Locate the repository containing `cwd`.
    pub fn discover(cwd: &Path) -> GitResult<Self> {
        let cwd = std::fs::canonicalize(cwd)?;
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(&cwd)
            .output()?;
        if !output.status.success() {
            return Err(GitError::NotARepository);
        }
        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            return Err(GitError::NotARepository);
        }
        let root = std::fs::canonicalize(&root).unwrap_or_else(|_| PathBuf::from(root));
        log::info!("repository root: {}", root.display());
        Ok(Self { root, cwd })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert a root-relative path into one relative to the working
    /// directory the program was started from.
    pub fn display_path(&self, repo_relative: &str) -> String {
        let target = self.root.join(repo_relative);
        match relative_path(&self.cwd, &target) {
            Some(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().into_owned(),
            _ => repo_relative.to_string(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        log::debug!("$ git {}", args.join(" "));
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.root);
        cmd
    }

    fn failure(args: &[&str], output: &Output) -> GitError {
        GitError::CommandFailed {
            operation: format!("git {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Run and return stdout, failing on a non-zero exit.
    fn run(&self, args: &[&str]) -> GitResult<String> {
        let output = self.command(args).stdin(Stdio::null()).output()?;
        if !output.status.success() {
            let err = Self::failure(args, &output);
            log::warn!("{}", err);
            return Err(err);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run and return stdout regardless of exit status. Used for commands
    /// such as `diff --no-index` that exit 1 when differences exist.
    fn run_allow_failure(&self, args: &[&str]) -> GitResult<String> {
        let output = self.command(args).stdin(Stdio::null()).output()?;
        if !output.status.success() {
            log::debug!("git {} exited with {}", args.join(" "), output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_with_stdin(&self, args: &[&str], input: &str) -> GitResult<()> {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // git may exit before reading everything; its stderr says why.
            if let Err(e) = stdin.write_all(input.as_bytes()) {
                log::debug!("writing to git {}: {}", args.join(" "), e);
            }
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            let err = Self::failure(args, &output);
            log::warn!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Status
    // ---------------------------------------------------------------------

    pub fn current_branch(&self) -> String {
        self.run(&["branch", "--show-current"])
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Upstream and ahead/behind counts. Missing upstream is not an error.
    pub fn branch_status(&self) -> BranchStatus {
        let mut status = BranchStatus {
            name: self.current_branch(),
            ..BranchStatus::default()
        };
        let Ok(upstream) = self.run(&["rev-parse", "--abbrev-ref", "@{upstream}"]) else {
            return status;
        };
        status.upstream = upstream.trim().to_string();

        if let Ok(counts) = self.run(&["rev-list", "--left-right", "--count", "HEAD...@{upstream}"]) {
            let mut fields = counts
                .split_whitespace()
                .map(|n| n.parse::<u32>().unwrap_or(0));
            status.ahead = fields.next().unwrap_or(0);
            status.behind = fields.next().unwrap_or(0);
        }
        status
    }

    pub fn status(&self) -> GitResult<StatusResult> {
        let output = self.run(&["status", "--porcelain=v1"])?;
        Ok(self.parse_status(&output))
    }

    fn parse_status(&self, output: &str) -> StatusResult {
        let mut result = StatusResult::default();
        for line in output.lines() {
            let mut chars = line.chars();
            let (Some(index), Some(work)) = (chars.next(), chars.next()) else {
                continue;
            };
            let Some(rest) = line.get(3..).filter(|r| !r.is_empty()) else {
                log::warn!("status: skipping short line {:?}", line);
                continue;
            };

            let (original, path) = match (index, rest.split_once(" -> ")) {
                ('R' | 'C', Some((old, new))) => (Some(old), new),
                _ => (None, rest),
            };

            result.push(FileStatus {
                path: path.to_string(),
                display_path: self.display_path(path),
                index,
                work,
                original_path: original.map(str::to_string),
                original_display_path: original.map(|o| self.display_path(o)),
            });
        }
        result
    }

    // ---------------------------------------------------------------------
    // Diffs
    // ---------------------------------------------------------------------

    fn parse_with_display(&self, text: &str) -> DiffResult {
        let mut result = diff::parse_diff(text);
        for file in &mut result.files {
            let display = self.display_path(&file.path);
            for hunk in &mut file.hunks {
                hunk.display_path = display.clone();
            }
        }
        result
    }

    pub fn unstaged_diff(&self) -> GitResult<DiffResult> {
        let output = self.run(&["diff"])?;
        Ok(self.parse_with_display(&output))
    }

    pub fn staged_diff(&self) -> GitResult<DiffResult> {
        let output = self.run(&["diff", "--cached"])?;
        Ok(self.parse_with_display(&output))
    }

    pub fn combined_diff(&self) -> GitResult<CombinedDiff> {
        Ok(CombinedDiff {
            staged: self.staged_diff()?,
            unstaged: self.unstaged_diff()?,
            untracked: Vec::new(),
        })
    }

    /// Diff of an untracked file against `/dev/null`, with paths corrected
    /// back to `path`.
    pub fn untracked_file_diff(&self, path: &str) -> GitResult<Option<FileDiff>> {
        let output = self.run_allow_failure(&["diff", "--no-index", "--", "/dev/null", path])?;
        if output.is_empty() {
            return Ok(None);
        }
        let Some(mut file) = diff::parse_diff(&output).files.into_iter().next() else {
            return Ok(None);
        };
        file.set_path(path);
        let display = self.display_path(path);
        for hunk in &mut file.hunks {
            hunk.display_path = display.clone();
        }
        Ok(Some(file))
    }

    // ---------------------------------------------------------------------
    // Staging
    // ---------------------------------------------------------------------

    pub fn stage_file(&self, path: &str) -> GitResult<()> {
        self.run(&["add", "--", path]).map(drop)
    }

    pub fn stage_all(&self) -> GitResult<()> {
        self.run(&["add", "-A"]).map(drop)
    }

    pub fn unstage_file(&self, path: &str) -> GitResult<()> {
        self.run(&["restore", "--staged", "--", path]).map(drop)
    }

    pub fn unstage_all(&self) -> GitResult<()> {
        self.run(&["reset", "HEAD"]).map(drop)
    }

    /// Revert a tracked file's working-tree content to the index.
    pub fn discard_file(&self, path: &str) -> GitResult<()> {
        self.run(&["restore", "--", path]).map(drop)
    }

    /// Delete an untracked file.
    pub fn remove_untracked(&self, path: &str) -> GitResult<()> {
        self.run(&["clean", "-f", "--", path]).map(drop)
    }

    /// Feed `patch` to `git apply` on stdin.
    pub fn apply_patch(&self, patch: &str, cached: bool, reverse: bool) -> GitResult<()> {
        let mut args = vec!["apply"];
        if cached {
            args.push("--cached");
        }
        if reverse {
            args.push("--reverse");
        }
        self.run_with_stdin(&args, patch)
    }

    pub fn stage_hunk(&self, patch: &str) -> GitResult<()> {
        self.apply_patch(patch, true, false)
    }

    pub fn unstage_hunk(&self, patch: &str) -> GitResult<()> {
        self.apply_patch(patch, true, true)
    }

    pub fn discard_hunk(&self, patch: &str) -> GitResult<()> {
        self.apply_patch(patch, false, true)
    }

    // ---------------------------------------------------------------------
    // Commit / push
    // ---------------------------------------------------------------------

    pub fn commit(&self, message: &str) -> GitResult<()> {
        self.run(&["commit", "-m", message]).map(drop)
    }

    /// Run `git commit` attached to the terminal so the user's editor opens.
    pub fn commit_interactive(&self) -> GitResult<ExitStatus> {
        Ok(self.command(&["commit"]).status()?)
    }

    pub fn push(&self) -> GitResult<()> {
        self.run(&["push"]).map(drop)
    }

    pub fn push_set_upstream(&self, remote: &str, branch: &str) -> GitResult<()> {
        self.run(&["push", "-u", remote, branch]).map(drop)
    }

    pub fn remotes(&self) -> GitResult<Vec<String>> {
        let output = self.run(&["remote"])?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn log(&self, limit: usize) -> GitResult<String> {
        self.run(&["log", &format!("-{}", limit)])
    }

    // ---------------------------------------------------------------------
    // Branches
    // ---------------------------------------------------------------------

    pub fn branches(&self) -> GitResult<Vec<Branch>> {
        let output = self.run(&[
            "for-each-ref",
            "--format=%(refname:short)|%(upstream:short)|%(upstream:track)|%(HEAD)|%(subject)",
            "refs/heads/",
        ])?;
        Ok(output
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| {
                let parsed = branch::parse_branch_line(l);
                if parsed.is_none() {
                    log::warn!("branches: skipping malformed record {:?}", l);
                }
                parsed
            })
            .collect())
    }

    pub fn checkout_branch(&self, name: &str) -> GitResult<()> {
        self.run(&["checkout", name]).map(drop)
    }

    pub fn create_branch(&self, name: &str) -> GitResult<()> {
        self.run(&["checkout", "-b", name]).map(drop)
    }

    /// Delete a merged branch. An unmerged branch yields
    /// [`GitError::NotFullyMerged`] so the caller can offer a force delete.
    pub fn delete_branch(&self, name: &str) -> GitResult<()> {
        match self.run(&["branch", "-d", name]) {
            Ok(_) => Ok(()),
            Err(GitError::CommandFailed { stderr, .. }) if stderr.contains("not fully merged") => {
                Err(GitError::NotFullyMerged {
                    branch: name.to_string(),
                    message: stderr,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn force_delete_branch(&self, name: &str) -> GitResult<()> {
        self.run(&["branch", "-D", name]).map(drop)
    }

    // ---------------------------------------------------------------------
    // Stashes
    // ---------------------------------------------------------------------

    pub fn stash_all(&self, message: &str) -> GitResult<()> {
        self.stash_push(message, &[])
    }

    pub fn stash_files(&self, paths: &[String], message: &str) -> GitResult<()> {
        self.stash_push(message, paths)
    }

    fn stash_push(&self, message: &str, paths: &[String]) -> GitResult<()> {
        let mut args = vec!["stash", "push"];
        if !message.is_empty() {
            args.extend(["-m", message]);
        }
        if !paths.is_empty() {
            args.push("--");
            args.extend(paths.iter().map(String::as_str));
        }
        self.run(&args).map(drop)
    }

    pub fn stashes(&self) -> GitResult<Vec<Stash>> {
        let output = self.run(&["stash", "list", "--format=%gd|%s"])?;
        Ok(output
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(stash::parse_stash_line)
            .collect())
    }

    /// Contents of a stash, presented as an unstaged diff.
    pub fn stash_diff(&self, index: usize) -> GitResult<CombinedDiff> {
        let output = self.run(&["stash", "show", "-p", &stash::stash_ref(index)])?;
        Ok(CombinedDiff::unstaged_only(self.parse_with_display(&output)))
    }

    pub fn apply_stash(&self, index: usize) -> GitResult<()> {
        self.run(&["stash", "apply", &stash::stash_ref(index)]).map(drop)
    }

    pub fn pop_stash(&self, index: usize) -> GitResult<()> {
        self.run(&["stash", "pop", &stash::stash_ref(index)]).map(drop)
    }

    pub fn drop_stash(&self, index: usize) -> GitResult<()> {
        self.run(&["stash", "drop", &stash::stash_ref(index)]).map(drop)
    }

    /// Confirm that `expected` is still at its ordinal before a destructive
    /// stash operation.
    pub fn verify_stash(&self, expected: &Stash) -> GitResult<()> {
        let current = self.stashes()?;
        match current.iter().find(|s| s.index == expected.index) {
            Some(s) if s.same_entry(expected) => Ok(()),
            _ => Err(GitError::StashMoved {
                index: expected.index,
            }),
        }
    }
}

/// Path of `target` relative to `base`, both absolute.
fn relative_path(base: &Path, target: &Path) -> Option<PathBuf> {
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = target.components().collect();
    if base.first() != target.first() {
        return None;
    }
    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();
    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for part in &target[common..] {
        rel.push(part.as_os_str());
    }
    Some(rel)
}
