pub mod branch;
pub mod diff;
pub mod stash;
pub mod status;
