//! Replaying source history onto a target branch
//!
//! History is walked along first parents, filtered by a [`ReplayPolicy`],
//! and each selected commit's tree is rebuilt in the target working tree
//! and committed with rewritten metadata.

mod engine;
mod history;
pub mod message;
mod policy;
mod report;
pub mod tree;

pub use engine::{ReplayEvent, ReplayOptions, ReplayPlan, Replayer};
pub use history::{abbreviate, first_parent_chain, merged_commits, select, short_id, HistoryEntry};
pub use policy::ReplayPolicy;
pub use report::{CommitSummary, MirroredCommit, PlanReport, ReplayReport};
