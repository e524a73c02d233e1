//! Secrets management for git-replay
//!
//! Secrets are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/git-replay/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (GITHUB_PAT, GITHUB_TOKEN, GITHUB_USER)
//! 2. Secrets file (~/.config/git-replay/secrets.toml)

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::git::Credentials;
use crate::{Error, Result};

/// Contents written by `git-replay init`
pub const TEMPLATE: &str = r#"# git-replay secrets
# Keep this file private (chmod 600) and out of version control.

[github]
# Account that owns the token
user = ""
# Personal access token with push access to the target repository
token = ""
"#;

/// Username sent with a token when no user is configured
const TOKEN_USERNAME: &str = "x-access-token";

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// GitHub configuration
    pub github: GitHubSecrets,
}

/// GitHub-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// Account the token belongs to
    pub user: Option<String>,

    /// GitHub Personal Access Token
    pub token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location, or empty secrets if there is no file
    pub fn load() -> Result<Self> {
        match Self::default_secrets_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load secrets from `path`, refusing files other users can read
    pub fn load_from_file(path: &Path) -> Result<Self> {
        check_private(path)?;

        let contents = std::fs::read_to_string(path)?;
        let mut secrets: Secrets = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Invalid secrets file {}: {}", path.display(), e))
        })?;

        for value in [&mut secrets.github.user, &mut secrets.github.token]
            .into_iter()
            .flatten()
        {
            *value = value.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/git-replay/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("git-replay").join("secrets.toml"))
    }

    /// Resolve HTTPS credentials with environment variable override
    ///
    /// Priority: GITHUB_PAT / GITHUB_TOKEN env vars > secrets file
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials_from(|key| std::env::var(key).ok())
    }

    /// Resolve credentials from an arbitrary variable lookup
    pub fn credentials_from<F>(&self, lookup: F) -> Option<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = if let Some(token) = get("GITHUB_PAT").or_else(|| get("GITHUB_TOKEN")) {
            debug!("Using token from environment");
            token
        } else if let Some(token) = self.github.token.as_ref().filter(|t| !t.is_empty()) {
            debug!("Using token from secrets file");
            token.clone()
        } else {
            return None;
        };

        let username = get("GITHUB_USER")
            .or_else(|| self.github.user.clone().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| TOKEN_USERNAME.to_string());

        Some(Credentials::new(username, token))
    }

    /// Write [`TEMPLATE`] to the default secrets path, readable by the owner only
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => {
                Error::Config(format!("Secrets file already exists at {}", path.display()))
            }
            _ => Error::Io(e),
        })?;
        file.write_all(TEMPLATE.as_bytes())?;

        warn!(path = %path.display(), "Created secrets template; add a token before running");
        Ok(path)
    }
}

#[cfg(unix)]
fn check_private(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(Error::Config(format!(
            "Secrets file {} has insecure permissions {:o}; run: chmod 600 {}",
            path.display(),
            mode,
            path.display()
        )));
    }

    debug!(path = %path.display(), mode = format!("{:o}", mode), "Secrets file is private");
    Ok(())
}

#[cfg(not(unix))]
fn check_private(_path: &Path) -> Result<()> {
    Ok(())
}
