//! CLI command implementations

pub mod plan;
pub mod run;

use std::path::PathBuf;

use clap::Args;
use replay_core::{Overrides, ReplayPolicy};

pub use plan::PlanArgs;
pub use run::RunArgs;

/// Repository, branch and policy flags shared by `run` and `plan`
#[derive(Args, Debug, Clone, Default)]
pub struct MirrorArgs {
    /// Source repository (path, URL, owner/repo or repo name)
    #[arg(long)]
    pub source: Option<String>,

    /// Target repository (path, URL, owner/repo or repo name)
    #[arg(long)]
    pub target: Option<String>,

    /// Branch to read (defaults to the source HEAD branch)
    #[arg(long)]
    pub source_branch: Option<String>,

    /// Branch to write (defaults to the source branch name)
    #[arg(long)]
    pub target_branch: Option<String>,

    /// Replay policy: full, merges, merges-with-message or snapshot
    #[arg(short, long)]
    pub policy: Option<ReplayPolicy>,

    /// Leave out commits whose tree matches the target tip
    #[arg(long)]
    pub skip_unchanged: bool,

    /// Clone into this directory and keep it afterwards
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl MirrorArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            source: self.source.clone(),
            target: self.target.clone(),
            source_branch: self.source_branch.clone(),
            target_branch: self.target_branch.clone(),
            policy: self.policy,
            skip_unchanged: self.skip_unchanged,
            workdir: self.workdir.clone(),
        }
    }
}
