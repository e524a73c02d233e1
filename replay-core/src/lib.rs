//! Replay Core - Core library for git-replay
//!
//! This crate mirrors commits from a source repository onto a branch of a
//! target repository under a configurable replay policy, and resumes from
//! where the previous run stopped.

pub mod config;
pub mod error;
pub mod git;
pub mod mirror;
pub mod replay;
pub mod secrets;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{Config, Identity, Overrides, ReplayConfig, RepoConfig};
pub use error::{Error, Result};
pub use git::{Credentials, GitRepo, RepoUrl};
pub use mirror::{Mirror, RunOptions};
pub use replay::{PlanReport, ReplayEvent, ReplayPolicy, ReplayReport};
pub use secrets::Secrets;
