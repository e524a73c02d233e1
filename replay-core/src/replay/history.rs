//! Walking and filtering source history

use git2::{Commit, Oid, Repository, Sort};

use super::policy::ReplayPolicy;
use crate::Result;

/// One commit on the source first-parent chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: Oid,
    /// First line of the message
    pub summary: String,
    pub author: String,
    /// Author time, seconds since the epoch
    pub time: i64,
    pub parent_count: usize,
}

impl HistoryEntry {
    pub fn from_commit(commit: &Commit<'_>) -> Self {
        let author = commit.author();
        Self {
            id: commit.id(),
            summary: summary_of(commit),
            author: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            time: author.when().seconds(),
            parent_count: commit.parent_count(),
        }
    }

    pub fn is_merge(&self) -> bool {
        self.parent_count > 1
    }

    /// Abbreviated commit id
    pub fn short_id(&self) -> String {
        short_id(self.id)
    }
}

pub fn short_id(id: Oid) -> String {
    abbreviate(&id.to_string()).to_string()
}

/// First seven characters of a hex object id
pub fn abbreviate(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

fn summary_of(commit: &Commit<'_>) -> String {
    let message = String::from_utf8_lossy(commit.message_bytes());
    message
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Walk from `tip` following only first parents, oldest first
pub fn first_parent_chain(repo: &Repository, tip: Oid) -> Result<Vec<HistoryEntry>> {
    let mut chain = Vec::new();
    let mut current = Some(repo.find_commit(tip)?);

    while let Some(commit) = current {
        chain.push(HistoryEntry::from_commit(&commit));
        current = if commit.parent_count() > 0 {
            Some(commit.parent(0)?)
        } else {
            None
        };
    }

    chain.reverse();
    Ok(chain)
}

/// Pick the entries of `chain` that `policy` replays, keeping chain order
pub fn select<'a>(chain: &'a [HistoryEntry], policy: ReplayPolicy) -> Vec<&'a HistoryEntry> {
    match policy {
        ReplayPolicy::Full => chain.iter().collect(),
        ReplayPolicy::Merges | ReplayPolicy::MergesWithMessage => {
            chain.iter().filter(|e| e.is_merge()).collect()
        }
        ReplayPolicy::Snapshot => chain.last().into_iter().collect(),
    }
}

/// Commits a merge brought in: reachable from its side parents but not its first parent
///
/// Returned oldest first.
pub fn merged_commits(repo: &Repository, merge: Oid) -> Result<Vec<HistoryEntry>> {
    let commit = repo.find_commit(merge)?;
    if commit.parent_count() < 2 {
        return Ok(Vec::new());
    }

    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
    for parent in commit.parent_ids().skip(1) {
        walk.push(parent)?;
    }
    walk.hide(commit.parent_id(0)?)?;

    let mut merged = Vec::new();
    for oid in walk {
        let found = repo.find_commit(oid?)?;
        merged.push(HistoryEntry::from_commit(&found));
    }

    Ok(merged)
}
