//! Git operations for git-replay
//!
//! This module provides repository handles, URL parsing, cloning with
//! credentials, branch resolution and pushing, all through libgit2.

mod auth;
mod branch;
mod clone;
mod push;
mod repo;
mod repo_url;

pub use auth::{remote_callbacks, Credentials};
pub use branch::BranchTip;
pub use clone::{clone_repo, CloneMode};
pub use repo::GitRepo;
pub use repo_url::{RemoteKind, RepoUrl};
