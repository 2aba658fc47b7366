use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

/// One line of a hunk, kept verbatim including its leading marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
}

impl DiffLine {
    fn classify(line: &str) -> Self {
        let kind = if line.starts_with('+') {
            LineKind::Added
        } else if line.starts_with('-') {
            LineKind::Removed
        } else {
            LineKind::Context
        };
        Self {
            kind,
            content: line.to_string(),
        }
    }

    pub fn is_change(&self) -> bool {
        self.kind != LineKind::Context
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// The raw `@@ ... @@` line.
    pub header: String,
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<DiffLine>,
    /// Repository-relative path of the owning file.
    pub file_path: String,
    /// Path shown to the user (relative to the working directory).
    pub display_path: String,
    pub file_index: usize,
    pub hunk_index: usize,
    pub staged: bool,
}

impl Hunk {
    fn start(header: &str, file: &FileDiff, file_index: usize) -> Self {
        let mut hunk = Self {
            header: header.to_string(),
            old_start: 0,
            old_count: 0,
            new_start: 0,
            new_count: 0,
            lines: Vec::new(),
            file_path: file.path.clone(),
            display_path: file.path.clone(),
            file_index,
            hunk_index: file.hunks.len(),
            staged: false,
        };
        match parse_hunk_header(header) {
            Some(range) => {
                hunk.old_start = range.old_start;
                hunk.old_count = range.old_count;
                hunk.new_start = range.new_start;
                hunk.new_count = range.new_count;
            }
            None => log::warn!("unparseable hunk header in {}: {:?}", file.path, header),
        }
        hunk
    }

    /// Render this hunk as a standalone patch: file header lines, hunk
    /// header, then hunk lines, each newline-terminated.
    pub fn generate_patch(&self, file: &FileDiff) -> String {
        let mut out = String::new();
        for line in &file.headers {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&self.header);
        out.push('\n');
        for line in &self.lines {
            out.push_str(&line.content);
            out.push('\n');
        }
        out
    }

    pub fn additions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Added)
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Removed)
            .count()
    }

    /// Identity of a hunk that survives re-parsing: the file path plus every
    /// added/removed line, or the header when the hunk has no changed lines.
    pub fn stable_key(&self) -> String {
        let mut key = String::with_capacity(self.file_path.len() + 1);
        key.push_str(&self.file_path);
        key.push('\n');
        let mut has_changes = false;
        for line in self.lines.iter().filter(|l| l.is_change()) {
            key.push_str(&line.content);
            key.push('\n');
            has_changes = true;
        }
        if !has_changes {
            key.push_str(&self.header);
        }
        key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileDiff {
    pub path: String,
    /// `diff --git` line plus the extended header lines before the first hunk.
    pub headers: Vec<String>,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Rewrite the path of this file and all of its hunks.
    pub fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
        for hunk in &mut self.hunks {
            hunk.file_path = path.to_string();
            hunk.display_path = path.to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffResult {
    pub files: Vec<FileDiff>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_hunks(&self) -> usize {
        self.files.iter().map(|f| f.hunks.len()).sum()
    }
}

/// Staged and unstaged diffs side by side, plus file diffs synthesized for
/// untracked files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CombinedDiff {
    pub staged: DiffResult,
    pub unstaged: DiffResult,
    pub untracked: Vec<FileDiff>,
}

impl CombinedDiff {
    /// A diff where everything is treated as unstaged (stash contents).
    pub fn unstaged_only(diff: DiffResult) -> Self {
        Self {
            unstaged: diff,
            ..Self::default()
        }
    }

    /// All hunks flattened, staged first, with `staged` set accordingly.
    pub fn all_hunks(&self) -> Vec<Hunk> {
        let staged = self.staged.files.iter().flat_map(|f| &f.hunks).map(|h| Hunk {
            staged: true,
            ..h.clone()
        });
        let unstaged = self
            .unstaged
            .files
            .iter()
            .flat_map(|f| &f.hunks)
            .map(|h| Hunk {
                staged: false,
                ..h.clone()
            });
        staged.chain(unstaged).collect()
    }

    /// Resolve the file a flattened hunk came from.
    pub fn file_diff(&self, hunk: &Hunk) -> Option<&FileDiff> {
        let side = if hunk.staged {
            &self.staged
        } else {
            &self.unstaged
        };
        side.files
            .get(hunk.file_index)
            .filter(|f| f.path == hunk.file_path)
            .or_else(|| {
                if hunk.staged {
                    None
                } else {
                    self.untracked.iter().find(|f| f.path == hunk.file_path)
                }
            })
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }

    /// Whether `path` shows up in the staged or unstaged diff, i.e. git
    /// tracks it now.
    pub fn tracks(&self, path: &str) -> bool {
        self.staged
            .files
            .iter()
            .chain(&self.unstaged.files)
            .any(|f| f.path == path)
    }
}

struct HunkRange {
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
}

fn hunk_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)$")
            .expect("hunk header pattern is valid")
    })
}

fn parse_hunk_header(line: &str) -> Option<HunkRange> {
    let caps = hunk_header_regex().captures(line)?;
    let num = |i: usize, default: u32| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(default)
    };
    Some(HunkRange {
        old_start: num(1, 0),
        old_count: num(2, 1),
        new_start: num(3, 0),
        new_count: num(4, 1),
    })
}

const HEADER_PREFIXES: &[&str] = &[
    "index ",
    "---",
    "+++",
    "new file",
    "deleted file",
    "old mode",
    "new mode",
    "similarity index",
    "dissimilarity index",
    "rename from",
    "rename to",
    "copy from",
    "copy to",
    "Binary files",
];

/// Extract the post-prefix path from a `diff --git` line.
///
/// Handles paths containing spaces when both sides name the same file, and
/// otherwise falls back to the fourth whitespace-separated field.
fn path_from_diff_header(line: &str) -> String {
    let rest = line.strip_prefix("diff --git ").unwrap_or("");
    let strip = |p: &str| -> String {
        let b = p.as_bytes();
        if b.len() > 2 && b[1] == b'/' {
            p[2..].to_string()
        } else {
            p.to_string()
        }
    };

    if rest.len() % 2 == 1 {
        let mid = rest.len() / 2;
        if rest.is_char_boundary(mid) && rest.as_bytes()[mid] == b' ' {
            let (left, right) = (&rest[..mid], &rest[mid + 1..]);
            if left.len() > 2 && strip(left) == strip(right) {
                return strip(left);
            }
        }
    }

    line.split(' ').nth(3).map(strip).unwrap_or_default()
}

/// Parse unified diff text into files, hunks and lines.
///
/// Never fails: unrecognised lines outside a hunk are skipped.
pub fn parse_diff(text: &str) -> DiffResult {
    let mut result = DiffResult::default();
    if text.is_empty() {
        return result;
    }

    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }

    let mut file: Option<FileDiff> = None;
    let mut hunk: Option<Hunk> = None;

    for line in lines {
        if line.starts_with("diff --git") {
            if let Some(mut done) = file.take() {
                if let Some(h) = hunk.take() {
                    done.hunks.push(h);
                }
                result.files.push(done);
            }
            file = Some(FileDiff {
                path: path_from_diff_header(line),
                headers: vec![line.to_string()],
                hunks: Vec::new(),
            });
            continue;
        }

        let Some(current) = file.as_mut() else {
            log::debug!("diff: skipping line before first file header: {:?}", line);
            continue;
        };

        if line.starts_with("@@") {
            if let Some(h) = hunk.take() {
                current.hunks.push(h);
            }
            hunk = Some(Hunk::start(line, current, result.files.len()));
            continue;
        }

        match hunk.as_mut() {
            Some(h) => h.lines.push(DiffLine::classify(line)),
            None if current.hunks.is_empty()
                && HEADER_PREFIXES.iter().any(|p| line.starts_with(p)) =>
            {
                current.headers.push(line.to_string());
            }
            None => log::warn!("diff: skipping unexpected line in {}: {:?}", current.path, line),
        }
    }

    if let Some(mut done) = file {
        if let Some(h) = hunk {
            done.hunks.push(h);
        }
        result.files.push(done);
    }

    result
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const TWO_FILES: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 3b18e51..a9c3f2d 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,3 +1,4 @@
 fn one() {}
+fn two() {}
 fn three() {}
 fn four() {}
@@ -10,3 +11,3 @@ impl Foo {
     let a = 1;
-    let b = 2;
+    let b = 3;
     let c = a + b;
diff --git a/README.md b/README.md
index 1111111..2222222 100644
--- a/README.md
+++ b/README.md
@@ -1 +1 @@
-hello
+hello world
\\ No newline at end of file
";

    #[test]
    fn empty_input_gives_empty_result() {
        assert!(parse_diff("").is_empty());
    }

    #[test]
    fn parses_files_hunks_and_lines() {
        let diff = parse_diff(TWO_FILES);
        assert_eq!(diff.files.len(), 2);

        let lib = &diff.files[0];
        assert_eq!(lib.path, "src/lib.rs");
        assert_eq!(lib.headers.len(), 4);
        assert_eq!(lib.hunks.len(), 2);
        assert_eq!(lib.hunks[0].lines.len(), 4);
        assert_eq!(lib.hunks[0].lines[1].kind, LineKind::Added);
        assert_eq!(lib.hunks[1].hunk_index, 1);
        assert_eq!(lib.hunks[1].file_index, 0);
        assert_eq!(lib.hunks[1].additions(), 1);
        assert_eq!(lib.hunks[1].deletions(), 1);

        let readme = &diff.files[1];
        assert_eq!(readme.path, "README.md");
        assert_eq!(readme.hunks[0].file_index, 1);
        let last = readme.hunks[0].lines.last().unwrap();
        assert_eq!(last.kind, LineKind::Context);
        assert_eq!(last.content, "\\ No newline at end of file");
    }

    #[test]
    fn trailing_newline_is_not_a_context_line() {
        let diff = parse_diff(TWO_FILES);
        let readme_hunk = &diff.files[1].hunks[0];
        assert_eq!(readme_hunk.lines.len(), 3);
    }

    #[rstest]
    #[case("@@ -10,3 +10,5 @@", 10, 3, 10, 5)]
    #[case("@@ -1 +1 @@", 1, 1, 1, 1)]
    #[case("@@ -0,0 +1,2 @@", 0, 0, 1, 2)]
    #[case("@@ -7,2 +7 @@ fn main() {", 7, 2, 7, 1)]
    fn hunk_header_ranges(
        #[case] header: &str,
        #[case] old_start: u32,
        #[case] old_count: u32,
        #[case] new_start: u32,
        #[case] new_count: u32,
    ) {
        let text = format!("diff --git a/f b/f\n{}\n+x\n", header);
        let hunk = &parse_diff(&text).files[0].hunks[0];
        assert_eq!(
            (hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count),
            (old_start, old_count, new_start, new_count)
        );
    }

    #[rstest]
    #[case("diff --git a/x.txt b/x.txt", "x.txt")]
    #[case("diff --git i/dir/x.txt w/dir/x.txt", "dir/x.txt")]
    #[case("diff --git a/my file.txt b/my file.txt", "my file.txt")]
    #[case("diff --git a/old.txt b/new.txt", "new.txt")]
    fn path_prefix_is_stripped(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(path_from_diff_header(line), expected);
    }

    #[test]
    fn mode_only_change_has_no_hunks() {
        let text = "diff --git a/run.sh b/run.sh\nold mode 100644\nnew mode 100755\n";
        let diff = parse_diff(text);
        assert_eq!(diff.files.len(), 1);
        assert!(diff.files[0].hunks.is_empty());
        assert_eq!(diff.files[0].headers.len(), 3);
    }

    #[test]
    fn removed_line_that_looks_like_header_stays_in_hunk() {
        let text = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,2 +1 @@\n--- old\n keep\n";
        let hunk = &parse_diff(text).files[0].hunks[0];
        assert_eq!(hunk.lines[0].kind, LineKind::Removed);
        assert_eq!(hunk.lines[0].content, "--- old");
    }

    #[test]
    fn garbage_does_not_panic() {
        let diff = parse_diff("random\n@@ nonsense\n+++\ndiff --git\n@@ -x +y @@\n+a\n");
        assert_eq!(diff.files.len(), 1);
        assert_eq!(diff.files[0].hunks[0].old_start, 0);
    }

    #[test]
    fn patch_round_trips_each_hunk() {
        let diff = parse_diff(TWO_FILES);
        for file in &diff.files {
            for hunk in &file.hunks {
                let reparsed = parse_diff(&hunk.generate_patch(file));
                assert_eq!(reparsed.files.len(), 1);
                assert_eq!(reparsed.files[0].hunks.len(), 1);
                let again = &reparsed.files[0].hunks[0];
                assert_eq!(again.header, hunk.header);
                assert_eq!(again.lines, hunk.lines);
            }
        }
    }

    #[test]
    fn hunk_parts_partition_file_body() {
        let diff = parse_diff(TWO_FILES);
        let file = &diff.files[0];
        let header_len: usize = file.headers.iter().map(|h| h.len() + 1).sum();
        let body: String = file
            .hunks
            .iter()
            .map(|h| h.generate_patch(file)[header_len..].to_string())
            .collect();

        let start = TWO_FILES.find("@@ -1,3").unwrap();
        let end = TWO_FILES.find("diff --git a/README.md").unwrap();
        assert_eq!(body, &TWO_FILES[start..end]);
    }

    #[test]
    fn combined_diff_orders_staged_first() {
        let staged = parse_diff("diff --git a/a.txt b/a.txt\n@@ -0,0 +1 @@\n+a\n");
        let unstaged = parse_diff("diff --git a/b.txt b/b.txt\n@@ -1 +1 @@\n-b\n+B\n");
        let combined = CombinedDiff {
            staged,
            unstaged,
            untracked: Vec::new(),
        };
        let hunks = combined.all_hunks();
        assert_eq!(hunks.len(), 2);
        assert!(hunks[0].staged);
        assert_eq!(hunks[0].file_path, "a.txt");
        assert!(!hunks[1].staged);
        assert_eq!(combined.file_diff(&hunks[1]).unwrap().path, "b.txt");
        assert!(combined.tracks("a.txt"));
        assert!(combined.tracks("b.txt"));
        assert!(!combined.tracks("c.txt"));
    }

    #[test]
    fn file_diff_resolves_untracked_hunks() {
        let mut untracked = parse_diff(
            "diff --git a/dev/null b/new.txt\nnew file mode 100644\n@@ -0,0 +1 @@\n+n\n",
        )
        .files
        .remove(0);
        untracked.set_path("new.txt");
        let hunk = untracked.hunks[0].clone();
        let combined = CombinedDiff {
            untracked: vec![untracked],
            ..CombinedDiff::default()
        };
        assert_eq!(combined.file_diff(&hunk).unwrap().path, "new.txt");
    }

    #[test]
    fn stable_key_falls_back_to_header() {
        let diff = parse_diff("diff --git a/f b/f\n@@ -1 +1 @@\n ctx\n");
        let hunk = &diff.files[0].hunks[0];
        assert_eq!(hunk.stable_key(), "f\n@@ -1 +1 @@");
    }
}
