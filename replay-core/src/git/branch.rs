//! Branch resolution and preparation

use git2::build::CheckoutBuilder;
use git2::Oid;
use tracing::debug;

use super::repo::GitRepo;
use crate::{Error, Result};

/// A resolved branch tip
#[derive(Debug, Clone)]
pub struct BranchTip {
    /// The reference that was resolved (e.g., "refs/remotes/origin/main")
    pub reference: String,
    /// The commit at the tip
    pub commit: Oid,
    /// The branch name (e.g., "main")
    pub branch_name: String,
}

impl GitRepo {
    /// Resolve a branch name to its tip
    ///
    /// Tries the remote tracking branch first (`refs/remotes/origin/<name>`),
    /// then the local branch, then `name` as a full reference.
    pub fn resolve_branch(&self, name: &str) -> Result<BranchTip> {
        let candidates = [
            format!("refs/remotes/origin/{}", name),
            format!("refs/heads/{}", name),
            name.to_string(),
        ];

        for reference in &candidates {
            if let Ok(found) = self.inner().find_reference(reference) {
                let commit = found
                    .peel_to_commit()
                    .map_err(|e| Error::Other(format!("Failed to resolve {}: {}", reference, e)))?;

                let branch_name = name
                    .strip_prefix("refs/heads/")
                    .unwrap_or(name)
                    .to_string();

                return Ok(BranchTip {
                    reference: reference.clone(),
                    commit: commit.id(),
                    branch_name,
                });
            }
        }

        Err(Error::Config(format!(
            "Branch '{}' not found in {}",
            name,
            self.root().display()
        )))
    }

    /// Get the default branch name
    ///
    /// Uses the branch HEAD points at (a fresh clone points HEAD at the
    /// remote's default branch), then falls back to main or master.
    pub fn default_branch(&self) -> Result<String> {
        if let Some(branch) = self.current_branch()? {
            return Ok(branch);
        }

        for candidate in ["main", "master"] {
            if self.resolve_branch(candidate).is_ok() {
                return Ok(candidate.to_string());
            }
        }

        Ok("main".to_string())
    }

    /// Tip of a local branch, or `None` if the branch is unborn
    pub fn local_tip(&self, branch: &str) -> Result<Option<Oid>> {
        match self.inner().find_reference(&format!("refs/heads/{}", branch)) {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?.id())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(Error::Git(e)),
        }
    }

    /// Tip of `branch` as this clone knows it, without touching HEAD
    ///
    /// Prefers the local branch and falls back to `origin/<branch>`, which is
    /// all a fresh clone has for branches other than the remote's HEAD.
    pub fn published_tip(&self, branch: &str) -> Result<Option<Oid>> {
        if let Some(tip) = self.local_tip(branch)? {
            return Ok(Some(tip));
        }

        match self
            .inner()
            .find_reference(&format!("refs/remotes/origin/{}", branch))
        {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?.id())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(Error::Git(e)),
        }
    }

    /// Check out `branch` so new commits land on it
    ///
    /// A local branch is created from `origin/<branch>` when needed. When the
    /// branch exists nowhere, HEAD points at it unborn and the first commit
    /// becomes a root commit.
    pub fn prepare_branch(&self, branch: &str) -> Result<Option<Oid>> {
        let repo = self.inner();
        let local_ref = format!("refs/heads/{}", branch);

        if repo.find_reference(&local_ref).is_err() {
            if let Ok(remote) = repo.find_reference(&format!("refs/remotes/origin/{}", branch)) {
                let commit = remote.peel_to_commit()?;
                repo.branch(branch, &commit, false)?;
                debug!(branch, commit = %commit.id(), "Created local branch from origin");
            }
        }

        repo.set_head(&local_ref)?;

        let tip = self.local_tip(branch)?;
        if tip.is_some() {
            repo.checkout_head(Some(CheckoutBuilder::new().force()))?;
        }

        debug!(branch, tip = ?tip, "Prepared branch");
        Ok(tip)
    }
}
