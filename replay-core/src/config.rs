//! Configuration management for git-replay
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (REPLAY_*, plus SOURCE_REPO_NAME / TARGET_REPO_NAME / GITHUB_USER)
//! 3. Config file (~/.config/git-replay/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::git::RepoUrl;
use crate::replay::ReplayPolicy;
use crate::{Error, Result};

/// Default trailer key used to record the mirrored source commit
pub const DEFAULT_TRAILER_KEY: &str = "Mirrored-From";

/// One side of the mirror
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Repository URL, `owner/repo` shorthand, bare repo name or local path
    pub repo: Option<String>,

    /// Branch to read from or write to
    pub branch: Option<String>,
}

/// A name/email pair used for commit signatures
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Replay behaviour
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Which commits are replayed
    pub policy: ReplayPolicy,

    /// Keep the source author timestamp instead of stamping "now"
    pub preserve_dates: bool,

    /// Committer identity; defaults to the author of each replayed commit
    pub committer: Option<Identity>,

    /// Replace every source author with this identity
    pub author_override: Option<Identity>,

    /// Trailer key recording the mirrored source commit
    pub trailer_key: String,

    /// Skip commits whose tree equals the current target tree
    pub skip_unchanged: bool,

    /// Maximum merged commits listed in a synthesized merge message
    pub max_listed: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            policy: ReplayPolicy::default(),
            preserve_dates: true,
            committer: None,
            author_override: None,
            trailer_key: DEFAULT_TRAILER_KEY.to_string(),
            skip_unchanged: false,
            max_listed: 50,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Owner used to expand bare repository names (e.g. a GitHub user)
    pub owner: Option<String>,

    /// Repository commits are read from
    pub source: RepoConfig,

    /// Repository commits are written to
    pub target: RepoConfig,

    /// Replay behaviour
    pub replay: ReplayConfig,

    /// Directory to clone into; a temporary directory is used when unset
    pub workdir: Option<PathBuf>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source: Option<String>,
    pub target: Option<String>,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
    pub policy: Option<ReplayPolicy>,
    pub skip_unchanged: bool,
    pub workdir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/git-replay/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("git-replay").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - REPLAY_SOURCE / SOURCE_REPO_NAME: source repository
    /// - REPLAY_TARGET / TARGET_REPO_NAME: target repository
    /// - REPLAY_SOURCE_BRANCH, REPLAY_TARGET_BRANCH: branches
    /// - REPLAY_POLICY: replay policy
    /// - REPLAY_COMMITTER_NAME, REPLAY_COMMITTER_EMAIL: committer identity
    /// - GITHUB_USER: owner for bare repository names
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(owner) = get("GITHUB_USER") {
            self.owner = Some(owner);
        }

        if let Some(source) = get("REPLAY_SOURCE").or_else(|| get("SOURCE_REPO_NAME")) {
            self.source.repo = Some(source);
        }

        if let Some(target) = get("REPLAY_TARGET").or_else(|| get("TARGET_REPO_NAME")) {
            self.target.repo = Some(target);
        }

        if let Some(branch) = get("REPLAY_SOURCE_BRANCH") {
            self.source.branch = Some(branch);
        }

        if let Some(branch) = get("REPLAY_TARGET_BRANCH") {
            self.target.branch = Some(branch);
        }

        if let Some(policy) = get("REPLAY_POLICY") {
            self.replay.policy = policy.parse()?;
        }

        match (get("REPLAY_COMMITTER_NAME"), get("REPLAY_COMMITTER_EMAIL")) {
            (Some(name), Some(email)) => self.replay.committer = Some(Identity::new(name, email)),
            (None, None) => {}
            _ => {
                return Err(Error::Config(
                    "REPLAY_COMMITTER_NAME and REPLAY_COMMITTER_EMAIL must be set together".to_string(),
                ))
            }
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(source) = overrides.source {
            self.source.repo = Some(source);
        }

        if let Some(target) = overrides.target {
            self.target.repo = Some(target);
        }

        if let Some(branch) = overrides.source_branch {
            self.source.branch = Some(branch);
        }

        if let Some(branch) = overrides.target_branch {
            self.target.branch = Some(branch);
        }

        if let Some(policy) = overrides.policy {
            self.replay.policy = policy;
        }

        if overrides.skip_unchanged {
            self.replay.skip_unchanged = true;
        }

        if let Some(workdir) = overrides.workdir {
            self.workdir = Some(workdir);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let base = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        Ok(base.with_env_overrides()?.with_cli_overrides(overrides))
    }

    /// Resolve the source repository location
    pub fn source_url(&self) -> Result<RepoUrl> {
        let repo = self.source.repo.as_deref().ok_or_else(|| {
            Error::Config("No source repository configured. Set REPLAY_SOURCE or pass --source".to_string())
        })?;
        RepoUrl::resolve(repo, self.owner.as_deref())
    }

    /// Resolve the target repository location
    pub fn target_url(&self) -> Result<RepoUrl> {
        let repo = self.target.repo.as_deref().ok_or_else(|| {
            Error::Config("No target repository configured. Set REPLAY_TARGET or pass --target".to_string())
        })?;
        RepoUrl::resolve(repo, self.owner.as_deref())
    }

    /// Check that the configuration describes a usable mirror
    pub fn validate(&self) -> Result<()> {
        let source = self.source_url()?;
        let target = self.target_url()?;

        if source.clone_url == target.clone_url {
            return Err(Error::Config(format!(
                "Source and target are the same repository: {}",
                source.clone_url
            )));
        }

        if self.replay.trailer_key.trim().is_empty() || self.replay.trailer_key.contains(':') {
            return Err(Error::Config(format!(
                "Invalid trailer key '{}'",
                self.replay.trailer_key
            )));
        }

        Ok(())
    }
}
