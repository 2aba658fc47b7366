#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub is_current: bool,
    pub upstream: String,
    pub ahead: u32,
    pub behind: u32,
    /// Subject line of the branch tip commit.
    pub last_commit: String,
}

impl Branch {
    /// Compact tracking marker: `[+a/-b]`, `[+a]`, `[-b]` or nothing.
    pub fn track_label(&self) -> Option<String> {
        if self.upstream.is_empty() {
            return None;
        }
        match (self.ahead, self.behind) {
            (0, 0) => None,
            (a, 0) => Some(format!("[+{}]", a)),
            (0, b) => Some(format!("[-{}]", b)),
            (a, b) => Some(format!("[+{}/-{}]", a, b)),
        }
    }
}

/// Parse one `for-each-ref` record in the form
/// `name|upstream|track|HEAD|subject`.
pub fn parse_branch_line(line: &str) -> Option<Branch> {
    let mut parts = line.splitn(5, '|');
    let name = parts.next()?;
    let upstream = parts.next()?;
    let track = parts.next()?;
    let head = parts.next()?;
    let subject = parts.next()?;
    if name.is_empty() {
        return None;
    }
    let (ahead, behind) = parse_track(track);
    Some(Branch {
        name: name.to_string(),
        is_current: head == "*",
        upstream: upstream.to_string(),
        ahead,
        behind,
        last_commit: subject.to_string(),
    })
}

/// Parse `%(upstream:track)` output such as `[ahead 2, behind 1]`.
fn parse_track(track: &str) -> (u32, u32) {
    let inner = track.trim().trim_start_matches('[').trim_end_matches(']');
    let mut ahead = 0;
    let mut behind = 0;
    for part in inner.split(',') {
        let mut words = part.split_whitespace();
        match (words.next(), words.next().and_then(|n| n.parse().ok())) {
            (Some("ahead"), Some(n)) => ahead = n,
            (Some("behind"), Some(n)) => behind = n,
            _ => {}
        }
    }
    (ahead, behind)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("[ahead 2, behind 1]", (2, 1))]
    #[case("[ahead 3]", (3, 0))]
    #[case("[behind 4]", (0, 4))]
    #[case("[gone]", (0, 0))]
    #[case("", (0, 0))]
    fn track_info(#[case] track: &str, #[case] expected: (u32, u32)) {
        assert_eq!(parse_track(track), expected);
    }

    #[test]
    fn parses_current_branch_record() {
        let b = parse_branch_line("main|origin/main|[ahead 1]|*|Fix it | again").unwrap();
        assert_eq!(b.name, "main");
        assert!(b.is_current);
        assert_eq!(b.upstream, "origin/main");
        assert_eq!(b.ahead, 1);
        assert_eq!(b.last_commit, "Fix it | again");
        assert_eq!(b.track_label().as_deref(), Some("[+1]"));
    }

    #[test]
    fn short_records_are_rejected() {
        assert!(parse_branch_line("main|origin/main").is_none());
        assert!(parse_branch_line("").is_none());
    }

    #[test]
    fn untracked_branch_has_no_track_label() {
        let b = parse_branch_line("topic|||  |wip").unwrap();
        assert!(!b.is_current);
        assert_eq!(b.track_label(), None);
    }
}
