//! End-to-end mirroring: clone both sides, replay, push
//!
//! This ties the git layer and the replay engine together. The source is
//! cloned bare (history is only read), the target is cloned with a working
//! tree (new commits are built there), and the target branch is pushed back
//! once every pending commit replayed successfully.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::info;

use crate::config::Config;
use crate::git::{clone_repo, CloneMode, Credentials, GitRepo};
use crate::replay::{PlanReport, ReplayEvent, ReplayOptions, ReplayReport, Replayer};
use crate::{Error, Result};

/// Remote name the target clone pushes back to
const TARGET_REMOTE: &str = "origin";

/// How a run treats the target remote
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Replay into the local clone only; never push
    pub dry_run: bool,
    /// Skip the push even though commits were created
    pub no_push: bool,
}

impl RunOptions {
    fn should_push(&self) -> bool {
        !self.dry_run && !self.no_push
    }
}

/// Scratch space holding the two clones
enum Workspace {
    /// Removed when dropped
    Temporary(TempDir),
    /// A user-supplied directory that is left in place
    Kept(PathBuf),
}

impl Workspace {
    fn create(dir: Option<&Path>) -> Result<Self> {
        match dir {
            None => {
                let temp = tempfile::Builder::new().prefix("git-replay-").tempdir()?;
                Ok(Workspace::Temporary(temp))
            }
            Some(dir) => {
                for name in [SOURCE_DIR, TARGET_DIR] {
                    if dir.join(name).exists() {
                        return Err(Error::Config(format!(
                            "{} already exists; remove it or choose another workdir",
                            dir.join(name).display()
                        )));
                    }
                }
                std::fs::create_dir_all(dir)?;
                Ok(Workspace::Kept(dir.to_path_buf()))
            }
        }
    }

    fn path(&self) -> &Path {
        match self {
            Workspace::Temporary(temp) => temp.path(),
            Workspace::Kept(dir) => dir,
        }
    }
}

const SOURCE_DIR: &str = "source.git";
const TARGET_DIR: &str = "target";

/// A configured mirror between two repositories
#[derive(Debug)]
pub struct Mirror {
    config: Config,
    credentials: Option<Credentials>,
}

/// Cloned repositories plus the options derived for them
struct Prepared {
    source: GitRepo,
    target: GitRepo,
    options: ReplayOptions,
}

impl Mirror {
    /// Create a mirror; fails if the configuration is incomplete
    pub fn new(config: Config, credentials: Option<Credentials>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            credentials,
        })
    }

    fn prepare(&self, workspace: &Path) -> Result<Prepared> {
        let source_url = self.config.source_url()?;
        let target_url = self.config.target_url()?;
        let credentials = self.credentials.as_ref();

        let source = clone_repo(
            &source_url,
            &workspace.join(SOURCE_DIR),
            CloneMode::Bare,
            credentials,
        )?;
        let target = clone_repo(
            &target_url,
            &workspace.join(TARGET_DIR),
            CloneMode::WithWorktree,
            credentials,
        )?;

        let source_branch = match &self.config.source.branch {
            Some(branch) => branch.clone(),
            None => source.default_branch()?,
        };
        let target_branch = self
            .config
            .target
            .branch
            .clone()
            .unwrap_or_else(|| source_branch.clone());

        info!(
            source = %source_url.display_name(),
            %source_branch,
            target = %target_url.display_name(),
            %target_branch,
            policy = %self.config.replay.policy,
            "Prepared mirror"
        );

        let options = ReplayOptions::new(&self.config.replay, source_branch, target_branch);
        Ok(Prepared {
            source,
            target,
            options,
        })
    }

    /// Show what a run would mirror without creating any commit
    pub fn plan(&self) -> Result<PlanReport> {
        let workspace = Workspace::create(self.config.workdir.as_deref())?;
        let prepared = self.prepare(workspace.path())?;

        let replayer = Replayer::new(&prepared.source, &prepared.target, prepared.options.clone());
        let plan = replayer.plan()?;

        Ok(plan.report(
            &prepared.options.source_branch,
            &prepared.options.target_branch,
        ))
    }

    /// Replay pending commits and push the target branch
    pub fn run<F>(&self, run_options: RunOptions, progress: F) -> Result<ReplayReport>
    where
        F: FnMut(ReplayEvent<'_>),
    {
        let workspace = Workspace::create(self.config.workdir.as_deref())?;
        let prepared = self.prepare(workspace.path())?;
        let branch = prepared.options.target_branch.clone();

        prepared.target.prepare_branch(&branch)?;

        let replayer = Replayer::new(&prepared.source, &prepared.target, prepared.options.clone());
        let plan = replayer.plan()?;
        let mut report = replayer.run(&plan, progress)?;
        report.dry_run = run_options.dry_run;

        if report.created.is_empty() {
            info!(%branch, "Target already up to date; nothing to push");
        } else if run_options.should_push() {
            prepared
                .target
                .push_branch(TARGET_REMOTE, &branch, self.credentials.as_ref())?;
            report.pushed = true;
            info!(%branch, commits = report.created.len(), "Pushed mirrored commits");
        } else {
            info!(%branch, commits = report.created.len(), "Push skipped");
        }

        if let Workspace::Kept(dir) = &workspace {
            info!(workdir = %dir.display(), "Clones kept");
        }

        Ok(report)
    }
}
