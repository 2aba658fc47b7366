#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stash {
    pub index: usize,
    pub branch: String,
    pub message: String,
}

impl Stash {
    pub fn reference(&self) -> String {
        stash_ref(self.index)
    }

    /// `stash@{N} on branch: message`
    pub fn label(&self) -> String {
        let mut label = self.reference();
        if !self.branch.is_empty() {
            label.push_str(" on ");
            label.push_str(&self.branch);
        }
        label.push_str(": ");
        label.push_str(&self.message);
        label
    }

    /// Whether `other` describes the same stash entry at the same position.
    pub fn same_entry(&self, other: &Stash) -> bool {
        self == other
    }
}

pub fn stash_ref(index: usize) -> String {
    format!("stash@{{{}}}", index)
}

/// Parse one `stash list --format=%gd|%s` record.
pub fn parse_stash_line(line: &str) -> Option<Stash> {
    let (reference, subject) = line.split_once('|')?;
    let index = reference
        .strip_prefix("stash@{")
        .and_then(|r| r.strip_suffix('}'))
        .and_then(|n| n.parse().ok())?;

    let (branch, message) = if let Some(rest) = subject.strip_prefix("WIP on ") {
        match rest.split_once(": ") {
            // "WIP on branch: <hash> <subject>"
            Some((branch, tail)) => {
                let msg = tail.split_once(' ').map(|(_, m)| m).unwrap_or(tail);
                (branch, msg)
            }
            None => ("", subject),
        }
    } else if let Some(rest) = subject.strip_prefix("On ") {
        match rest.split_once(": ") {
            Some((branch, msg)) => (branch, msg),
            None => ("", subject),
        }
    } else {
        ("", subject)
    };

    Some(Stash {
        index,
        branch: branch.to_string(),
        message: message.to_string(),
    })
}
