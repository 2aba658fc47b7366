#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Staged,
    Unstaged,
    Untracked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Path relative to the repository root, used for git commands.
    pub path: String,
    /// Path relative to the working directory, used for display.
    pub display_path: String,
    pub index: char,
    pub work: char,
    pub original_path: Option<String>,
    pub original_display_path: Option<String>,
}

impl FileStatus {
    pub fn is_untracked(&self) -> bool {
        self.index == '?' && self.work == '?'
    }

    pub fn is_staged(&self) -> bool {
        self.index != ' ' && self.index != '?'
    }

    pub fn is_unstaged(&self) -> bool {
        self.work != ' ' && self.work != '?'
    }

    pub fn description(&self) -> String {
        if self.is_untracked() {
            return "untracked".to_string();
        }
        let mut parts = Vec::new();
        match self.index {
            'M' => parts.push("staged: modified"),
            'A' => parts.push("staged: added"),
            'D' => parts.push("staged: deleted"),
            'R' => parts.push("staged: renamed"),
            'C' => parts.push("staged: copied"),
            'U' => parts.push("unmerged"),
            _ => {}
        }
        match self.work {
            'M' => parts.push("modified"),
            'D' => parts.push("deleted"),
            'U' if self.index != 'U' => parts.push("unmerged"),
            _ => {}
        }
        parts.join(", ")
    }

    /// Display label, showing `old → new` for renames and copies.
    pub fn label(&self) -> String {
        match self.original_display_path {
            Some(ref orig) => format!("{} → {}", orig, self.display_path),
            None => self.display_path.clone(),
        }
    }
}

/// Working tree status grouped by section. A file can appear in both
/// `staged` and `unstaged`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusResult {
    pub staged: Vec<FileStatus>,
    pub unstaged: Vec<FileStatus>,
    pub untracked: Vec<FileStatus>,
}

impl StatusResult {
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }

    pub fn push(&mut self, file: FileStatus) {
        if file.is_untracked() {
            self.untracked.push(file);
            return;
        }
        if file.is_staged() {
            self.staged.push(file.clone());
        }
        if file.is_unstaged() {
            self.unstaged.push(file);
        }
    }

    /// Flatten into the selectable item list: staged, unstaged, untracked.
    pub fn items(&self) -> Vec<StatusItem> {
        let tag = |files: &[FileStatus], section: Section| {
            files
                .iter()
                .map(|f| StatusItem {
                    file: f.clone(),
                    section,
                })
                .collect::<Vec<_>>()
        };
        let mut items = tag(&self.staged, Section::Staged);
        items.extend(tag(&self.unstaged, Section::Unstaged));
        items.extend(tag(&self.untracked, Section::Untracked));
        items
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusItem {
    pub file: FileStatus,
    pub section: Section,
}

/// Tracking state of the checked-out branch. `upstream` is empty when the
/// branch does not track anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchStatus {
    pub name: String,
    pub upstream: String,
    pub ahead: u32,
    pub behind: u32,
}

impl BranchStatus {
    pub fn has_upstream(&self) -> bool {
        !self.upstream.is_empty()
    }

    /// git-style narrative of how the branch relates to its upstream.
    pub fn tracking_lines(&self) -> Vec<String> {
        if !self.has_upstream() {
            return Vec::new();
        }
        let plural = |n: u32| if n == 1 { "commit" } else { "commits" };
        match (self.ahead, self.behind) {
            (a, b) if a > 0 && b > 0 => vec![
                format!("Your branch and '{}' have diverged,", self.upstream),
                format!(
                    "and have {} and {} different commits each, respectively.",
                    a, b
                ),
            ],
            (a, _) if a > 0 => vec![format!(
                "Your branch is ahead of '{}' by {} {}.",
                self.upstream,
                a,
                plural(a)
            )],
            (_, b) if b > 0 => vec![format!(
                "Your branch is behind '{}' by {} {}.",
                self.upstream,
                b,
                plural(b)
            )],
            _ => vec![format!("Your branch is up to date with '{}'.", self.upstream)],
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn file(path: &str, index: char, work: char) -> FileStatus {
        FileStatus {
            path: path.to_string(),
            display_path: path.to_string(),
            index,
            work,
            original_path: None,
            original_display_path: None,
        }
    }

    #[rstest]
    #[case('?', '?', true, false, false)]
    #[case('M', ' ', false, true, false)]
    #[case(' ', 'M', false, false, true)]
    #[case('M', 'M', false, true, true)]
    #[case('A', 'D', false, true, true)]
    #[case('R', ' ', false, true, false)]
    fn categorization(
        #[case] index: char,
        #[case] work: char,
        #[case] untracked: bool,
        #[case] staged: bool,
        #[case] unstaged: bool,
    ) {
        let f = file("x", index, work);
        assert_eq!(f.is_untracked(), untracked);
        assert_eq!(f.is_staged(), staged);
        assert_eq!(f.is_unstaged(), unstaged);
    }

    #[test]
    fn push_places_file_in_every_matching_section() {
        let mut status = StatusResult::default();
        status.push(file("both.rs", 'M', 'M'));
        status.push(file("new.rs", '?', '?'));
        assert_eq!(status.staged.len(), 1);
        assert_eq!(status.unstaged.len(), 1);
        assert_eq!(status.untracked.len(), 1);

        let items = status.items();
        let sections: Vec<Section> = items.iter().map(|i| i.section).collect();
        assert_eq!(
            sections,
            vec![Section::Staged, Section::Unstaged, Section::Untracked]
        );
    }

    #[test]
    fn description_combines_index_and_worktree() {
        assert_eq!(file("a", 'M', 'M').description(), "staged: modified, modified");
        assert_eq!(file("a", 'A', ' ').description(), "staged: added");
        assert_eq!(file("a", '?', '?').description(), "untracked");
    }

    #[test]
    fn rename_label_shows_both_paths() {
        let mut f = file("new.rs", 'R', ' ');
        f.original_display_path = Some("old.rs".to_string());
        assert_eq!(f.label(), "old.rs → new.rs");
    }

    #[rstest]
    #[case(0, 0, vec!["Your branch is up to date with 'origin/main'."])]
    #[case(1, 0, vec!["Your branch is ahead of 'origin/main' by 1 commit."])]
    #[case(3, 0, vec!["Your branch is ahead of 'origin/main' by 3 commits."])]
    #[case(0, 2, vec!["Your branch is behind 'origin/main' by 2 commits."])]
    #[case(2, 1, vec![
        "Your branch and 'origin/main' have diverged,",
        "and have 2 and 1 different commits each, respectively.",
    ])]
    fn tracking_narrative(#[case] ahead: u32, #[case] behind: u32, #[case] expected: Vec<&str>) {
        let status = BranchStatus {
            name: "main".to_string(),
            upstream: "origin/main".to_string(),
            ahead,
            behind,
        };
        assert_eq!(status.tracking_lines(), expected);
    }

    #[test]
    fn no_upstream_means_no_narrative() {
        assert!(BranchStatus::default().tracking_lines().is_empty());
    }
}
