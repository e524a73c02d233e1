//! Serializable summaries of plans and runs

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::history::HistoryEntry;
use super::policy::ReplayPolicy;
use crate::Result;

/// A source commit as shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub id: String,
    pub summary: String,
    pub author: String,
    pub authored_at: Option<DateTime<Utc>>,
    pub merge: bool,
}

impl From<&HistoryEntry> for CommitSummary {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            summary: entry.summary.clone(),
            author: entry.author.clone(),
            authored_at: DateTime::from_timestamp(entry.time, 0),
            merge: entry.is_merge(),
        }
    }
}

/// A source commit and the target commit created for it
#[derive(Debug, Clone, Serialize)]
pub struct MirroredCommit {
    pub source: String,
    pub target: String,
    pub summary: String,
}

/// Commits a run would mirror, without touching the target
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub policy: ReplayPolicy,
    pub source_branch: String,
    pub target_branch: String,
    pub source_tip: String,
    /// Commits on the source first-parent chain
    pub history_len: usize,
    pub selected: usize,
    pub already_mirrored: usize,
    pub last_mirrored: Option<String>,
    pub pending: Vec<CommitSummary>,
}

impl PlanReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome of a replay run
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub policy: ReplayPolicy,
    pub source_branch: String,
    pub target_branch: String,
    pub source_tip: String,
    /// Commits the policy selects over the whole source history
    pub selected: usize,
    /// Selected commits that an earlier run already mirrored
    pub already_mirrored: usize,
    pub created: Vec<MirroredCommit>,
    /// Commits left out because their tree matched the target tree
    pub skipped: Vec<CommitSummary>,
    pub pushed: bool,
    pub dry_run: bool,
}

impl ReplayReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
