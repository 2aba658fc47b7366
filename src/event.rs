use crate::data::worker::Outcome;

/// All events the app loop receives from the background worker.
#[derive(Debug)]
pub enum AppEvent {
    /// A job finished. The ticket says which view instance asked for it.
    Completed { ticket: Ticket, outcome: Outcome },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Status,
    Diff,
    Branches,
    Stashes,
    StashDiff,
    Log,
}

/// Addresses a job result to the view instance that requested it. Results
/// whose generation no longer matches the live instance are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub view: ViewKind,
    pub generation: u64,
}
