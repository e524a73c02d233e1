//! Git repository handle

use std::path::{Path, PathBuf};

use git2::Repository;

use crate::{Error, Result};

/// A git repository wrapper providing replay-specific operations
pub struct GitRepo {
    /// The underlying git2 repository
    repo: Repository,
    /// Working tree root, or the git directory for bare repositories
    root: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("root", &self.root)
            .field("bare", &self.repo.is_bare())
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    /// Wrap an already opened repository
    pub fn from_repository(repo: Repository) -> Self {
        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| repo.path().to_path_buf());

        Self { repo, root }
    }

    /// Get the repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Working tree of the repository; bare repositories have none
    pub fn workdir(&self) -> Result<&Path> {
        self.repo.workdir().ok_or_else(|| {
            Error::Config(format!(
                "Repository at {} is bare and has no working tree",
                self.root.display()
            ))
        })
    }

    /// Get the current branch name
    ///
    /// Returns `None` for a detached HEAD. An unborn branch (fresh clone of an
    /// empty repository) still reports its name.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                let target = self.repo.find_reference("HEAD")?;
                return Ok(target
                    .symbolic_target()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .map(str::to_string));
            }
            Err(e) => return Err(Error::Git(e)),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(|s| s.to_string()))
        } else {
            Ok(None)
        }
    }

    /// Get access to the underlying git2 repository
    pub fn inner(&self) -> &Repository {
        &self.repo
    }
}
