//! Cloning repositories

use std::path::Path;

use git2::build::RepoBuilder;
use git2::{ErrorClass, ErrorCode, FetchOptions};
use tracing::{debug, info};

use super::auth::{remote_callbacks, Credentials};
use super::repo::GitRepo;
use super::repo_url::{RemoteKind, RepoUrl};
use crate::{Error, Result};

/// How a clone should be laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneMode {
    /// Objects and refs only; enough to read history
    Bare,
    /// Checked-out working tree; needed to build new commits
    WithWorktree,
}

/// Clone a repository into `dest`
///
/// `dest` must not exist or be an empty directory.
pub fn clone_repo(
    repo_url: &RepoUrl,
    dest: &Path,
    mode: CloneMode,
    credentials: Option<&Credentials>,
) -> Result<GitRepo> {
    if repo_url.kind == RemoteKind::Https && credentials.is_none() {
        debug!(url = %repo_url.clone_url, "No credentials configured; cloning anonymously");
    }

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(remote_callbacks(credentials));

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);
    builder.bare(mode == CloneMode::Bare);

    info!(repo = %repo_url.display_name(), dest = %dest.display(), ?mode, "Cloning");

    let repo = builder
        .clone(&repo_url.clone_url, dest)
        .map_err(|e| classify_clone_error(e, repo_url))?;

    Ok(GitRepo::from_repository(repo))
}

/// Turn a libgit2 failure into an actionable error
fn classify_clone_error(err: git2::Error, repo_url: &RepoUrl) -> Error {
    let url = &repo_url.clone_url;

    if err.code() == ErrorCode::Auth {
        return Error::Auth(format!(
            "Authentication failed for {}. Check your token or repository access.",
            url
        ));
    }

    if err.code() == ErrorCode::NotFound
        || err.message().contains("not found")
        || err.message().contains("does not exist")
    {
        return Error::Config(format!(
            "Repository not found: {}. Check the URL is correct.",
            url
        ));
    }

    if matches!(err.class(), ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssl) {
        return Error::Config(format!(
            "Network error cloning {}: {}",
            url,
            err.message()
        ));
    }

    Error::Git(err)
}
