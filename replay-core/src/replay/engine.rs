//! The replay engine
//!
//! A [`Replayer`] reads history from a source repository and re-commits the
//! selected trees onto a branch of a target repository. Every commit it
//! writes carries a provenance trailer naming the source commit, which is
//! how a later run finds where the previous one stopped.

use git2::{Commit, Oid, Repository, Signature};
use tracing::{debug, info};

use super::history::{first_parent_chain, merged_commits, select, HistoryEntry};
use super::message;
use super::policy::ReplayPolicy;
use super::report::{CommitSummary, MirroredCommit, PlanReport, ReplayReport};
use super::tree::{copy_tree, replace_worktree};
use crate::config::{Identity, ReplayConfig};
use crate::git::GitRepo;
use crate::{Error, Result};

/// Everything the engine needs to know besides the two repositories
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub policy: ReplayPolicy,
    pub source_branch: String,
    pub target_branch: String,
    pub trailer_key: String,
    pub preserve_dates: bool,
    pub committer: Option<Identity>,
    pub author_override: Option<Identity>,
    pub skip_unchanged: bool,
    pub max_listed: usize,
}

impl ReplayOptions {
    pub fn new(
        config: &ReplayConfig,
        source_branch: impl Into<String>,
        target_branch: impl Into<String>,
    ) -> Self {
        Self {
            policy: config.policy,
            source_branch: source_branch.into(),
            target_branch: target_branch.into(),
            trailer_key: config.trailer_key.clone(),
            preserve_dates: config.preserve_dates,
            committer: config.committer.clone(),
            author_override: config.author_override.clone(),
            skip_unchanged: config.skip_unchanged,
            max_listed: config.max_listed,
        }
    }
}

/// What a run would do
#[derive(Debug, Clone)]
pub struct ReplayPlan {
    pub policy: ReplayPolicy,
    pub source_tip: Oid,
    /// Length of the source first-parent chain
    pub chain_len: usize,
    /// Commits the policy selects over the whole chain
    pub selected: usize,
    /// Source commit named by the newest marker on the target branch
    pub last_mirrored: Option<Oid>,
    /// Target branch tip the plan was computed against
    pub target_tip: Option<Oid>,
    /// Commits still to replay, oldest first
    pub pending: Vec<HistoryEntry>,
}

impl ReplayPlan {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn already_mirrored(&self) -> usize {
        self.selected.saturating_sub(self.pending.len())
    }

    pub fn pending_summaries(&self) -> Vec<CommitSummary> {
        self.pending.iter().map(CommitSummary::from).collect()
    }

    /// Serializable view of the plan
    pub fn report(&self, source_branch: &str, target_branch: &str) -> PlanReport {
        PlanReport {
            policy: self.policy,
            source_branch: source_branch.to_string(),
            target_branch: target_branch.to_string(),
            source_tip: self.source_tip.to_string(),
            history_len: self.chain_len,
            selected: self.selected,
            already_mirrored: self.already_mirrored(),
            last_mirrored: self.last_mirrored.map(|id| id.to_string()),
            pending: self.pending_summaries(),
        }
    }
}

/// Progress notifications emitted while replaying
#[derive(Debug, Clone, Copy)]
pub enum ReplayEvent<'a> {
    /// About to rebuild the tree of `entry`; `index` counts from 1
    Replaying {
        index: usize,
        total: usize,
        entry: &'a HistoryEntry,
    },
    /// `entry` produced the same tree as the target tip and was left out
    Skipped { entry: &'a HistoryEntry },
    /// `entry` was committed to the target as `target`
    Committed { entry: &'a HistoryEntry, target: Oid },
}

/// Replays source history onto a target branch
pub struct Replayer<'a> {
    source: &'a GitRepo,
    target: &'a GitRepo,
    options: ReplayOptions,
}

impl<'a> Replayer<'a> {
    pub fn new(source: &'a GitRepo, target: &'a GitRepo, options: ReplayOptions) -> Self {
        Self {
            source,
            target,
            options,
        }
    }

    pub fn options(&self) -> &ReplayOptions {
        &self.options
    }

    /// Work out which selected commits the target does not have yet
    pub fn plan(&self) -> Result<ReplayPlan> {
        let policy = self.options.policy;
        let source_tip = self.source.resolve_branch(&self.options.source_branch)?.commit;
        let chain = first_parent_chain(self.source.inner(), source_tip)?;
        let selected = select(&chain, policy);
        let selected_count = selected.len();

        let target_tip = self.target.published_tip(&self.options.target_branch)?;
        let last_mirrored = match target_tip {
            Some(tip) => find_last_marker(self.target.inner(), tip, &self.options.trailer_key)?,
            None => None,
        };

        let pending: Vec<HistoryEntry> = match last_mirrored {
            None => selected.into_iter().cloned().collect(),
            Some(marker) if policy == ReplayPolicy::Snapshot => {
                if marker == source_tip {
                    Vec::new()
                } else {
                    selected.into_iter().cloned().collect()
                }
            }
            Some(marker) => {
                let position = chain.iter().position(|e| e.id == marker).ok_or_else(|| {
                    Error::Diverged(format!(
                        "'{}' was last mirrored from {}, which is not on the first-parent history of '{}'",
                        self.options.target_branch, marker, self.options.source_branch
                    ))
                })?;
                select(&chain[position + 1..], policy)
                    .into_iter()
                    .cloned()
                    .collect()
            }
        };

        info!(
            %policy,
            chain = chain.len(),
            selected = selected_count,
            pending = pending.len(),
            last_mirrored = ?last_mirrored,
            "Planned replay"
        );

        Ok(ReplayPlan {
            policy,
            source_tip,
            chain_len: chain.len(),
            selected: selected_count,
            last_mirrored,
            target_tip,
            pending,
        })
    }

    /// Replay every pending commit of `plan` onto the target branch
    ///
    /// The target working tree must be checked out on the target branch.
    /// Nothing is pushed.
    pub fn run<F>(&self, plan: &ReplayPlan, mut progress: F) -> Result<ReplayReport>
    where
        F: FnMut(ReplayEvent<'_>),
    {
        let workdir = self.target.workdir()?.to_path_buf();
        let branch_ref = format!("refs/heads/{}", self.options.target_branch);
        let target = self.target.inner();

        let mut parent = self.target.local_tip(&self.options.target_branch)?;
        if parent != plan.target_tip {
            return Err(Error::Other(format!(
                "Target branch '{}' moved since the replay was planned",
                self.options.target_branch
            )));
        }

        let mut created = Vec::new();
        let mut skipped = Vec::new();
        let total = plan.pending.len();

        for (i, entry) in plan.pending.iter().enumerate() {
            progress(ReplayEvent::Replaying {
                index: i + 1,
                total,
                entry,
            });

            replace_worktree(self.source.inner(), entry.id, &workdir)?;
            let tree_id = stage_tree(self.source.inner(), target, entry.id)?;

            let parent_commit = match parent {
                Some(oid) => Some(target.find_commit(oid)?),
                None => None,
            };

            if self.options.skip_unchanged
                && parent_commit.as_ref().map(|c| c.tree_id()) == Some(tree_id)
            {
                debug!(source = %entry.id, "Tree unchanged, skipping");
                progress(ReplayEvent::Skipped { entry });
                skipped.push(CommitSummary::from(entry));
                continue;
            }

            let source_commit = self.source.inner().find_commit(entry.id)?;
            let author = self.author_signature(&source_commit)?;
            let committer = self.committer_signature(&author)?;
            let message = self.compose_message(entry, &source_commit)?;
            let tree = target.find_tree(tree_id)?;
            let parents: Vec<&Commit<'_>> = parent_commit.iter().collect();

            let new_id = target.commit(
                Some(&branch_ref),
                &author,
                &committer,
                &message,
                &tree,
                &parents,
            )?;

            debug!(source = %entry.id, target = %new_id, "Mirrored commit");
            progress(ReplayEvent::Committed {
                entry,
                target: new_id,
            });

            created.push(MirroredCommit {
                source: entry.id.to_string(),
                target: new_id.to_string(),
                summary: entry.summary.clone(),
            });
            parent = Some(new_id);
        }

        info!(created = created.len(), skipped = skipped.len(), "Replay finished");

        Ok(ReplayReport {
            policy: plan.policy,
            source_branch: self.options.source_branch.clone(),
            target_branch: self.options.target_branch.clone(),
            source_tip: plan.source_tip.to_string(),
            selected: plan.selected,
            already_mirrored: plan.already_mirrored(),
            created,
            skipped,
            pushed: false,
            dry_run: false,
        })
    }

    fn author_signature(&self, commit: &Commit<'_>) -> Result<Signature<'static>> {
        let original = commit.author();
        let (name, email) = match &self.options.author_override {
            Some(identity) => (identity.name.clone(), identity.email.clone()),
            None => (
                String::from_utf8_lossy(original.name_bytes()).into_owned(),
                String::from_utf8_lossy(original.email_bytes()).into_owned(),
            ),
        };

        let signature = if self.options.preserve_dates {
            Signature::new(&name, &email, &original.when())
        } else {
            Signature::now(&name, &email)
        };

        signature.map_err(|e| {
            Error::Other(format!(
                "Invalid author '{} <{}>' on {}: {}",
                name,
                email,
                commit.id(),
                e
            ))
        })
    }

    fn committer_signature(&self, author: &Signature<'_>) -> Result<Signature<'static>> {
        let signature = match &self.options.committer {
            Some(identity) => Signature::now(&identity.name, &identity.email)?,
            None => Signature::now(
                &String::from_utf8_lossy(author.name_bytes()),
                &String::from_utf8_lossy(author.email_bytes()),
            )?,
        };
        Ok(signature)
    }

    fn compose_message(&self, entry: &HistoryEntry, commit: &Commit<'_>) -> Result<String> {
        let body = match self.options.policy {
            ReplayPolicy::Full | ReplayPolicy::Merges => {
                message::original(&String::from_utf8_lossy(commit.message_bytes()))
            }
            ReplayPolicy::MergesWithMessage => {
                let merged = merged_commits(self.source.inner(), entry.id)?;
                message::merge_summary(entry, &merged, self.options.max_listed)
            }
            ReplayPolicy::Snapshot => message::snapshot(&self.options.source_branch, entry),
        };

        Ok(message::with_marker(&body, &self.options.trailer_key, entry.id))
    }
}

/// Copy the tree of source commit `id` into `target` and make it the index
fn stage_tree(source: &Repository, target: &Repository, id: Oid) -> Result<Oid> {
    let source_tree = source.find_commit(id)?.tree()?;
    let tree_id = match copy_tree(source, target, &source_tree)? {
        Some(tree_id) => tree_id,
        None => target.treebuilder(None)?.write()?,
    };

    let mut index = target.index()?;
    index.read_tree(&target.find_tree(tree_id)?)?;
    index.write()?;
    Ok(tree_id)
}

/// Newest provenance marker on the first-parent history of `tip`
fn find_last_marker(repo: &Repository, tip: Oid, key: &str) -> Result<Option<Oid>> {
    let mut current = Some(repo.find_commit(tip)?);

    while let Some(commit) = current {
        let text = String::from_utf8_lossy(commit.message_bytes());
        if let Some(source) = message::parse_marker(&text, key) {
            debug!(target = %commit.id(), %source, "Found provenance marker");
            return Ok(Some(source));
        }

        current = if commit.parent_count() > 0 {
            Some(commit.parent(0)?)
        } else {
            None
        };
    }

    Ok(None)
}
