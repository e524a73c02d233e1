//! Repository URL parsing

use std::path::Path;

use crate::{Error, Result};

/// How a repository is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    /// `https://` or `http://`, authenticated with a token
    Https,
    /// `git@host:` or `ssh://`, authenticated through the SSH agent
    Ssh,
    /// A path on this machine or a `file://` URL
    Local,
}

/// Parsed repository information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    /// Repository owner/organization
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Full clone URL
    pub clone_url: String,
    /// Host (e.g., "github.com"); empty for local repositories
    pub host: String,
    /// Transport used to reach the repository
    pub kind: RemoteKind,
}

impl RepoUrl {
    /// Parse a repository URL or shorthand
    ///
    /// Supports:
    /// - `https://github.com/owner/repo`
    /// - `https://github.com/owner/repo.git`
    /// - `git@github.com:owner/repo.git`
    /// - `ssh://git@host/owner/repo.git`
    /// - `owner/repo` (assumes GitHub)
    /// - `file:///path/to/repo`, `/path/to/repo`, `./repo`
    pub fn parse(input: &str) -> Result<Self> {
        Self::resolve(input, None)
    }

    /// Parse a repository URL, expanding a bare `repo` name with `owner`
    pub fn resolve(input: &str, owner: Option<&str>) -> Result<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Err(Error::Config("Empty repository URL".to_string()));
        }

        if let Some(local) = Self::parse_local(input) {
            return Ok(local);
        }

        // Bare repository name, expanded with the owner
        if !input.contains('/') && !input.contains(':') && !input.contains('@') {
            return match owner {
                Some(owner) if !owner.trim().is_empty() => {
                    Self::github(owner.trim(), input.trim_end_matches(".git"))
                }
                _ => Err(Error::Config(format!(
                    "Repository '{}' has no owner. Use owner/repo or set GITHUB_USER",
                    input
                ))),
            };
        }

        // Handle owner/repo shorthand (assumes GitHub)
        if !input.contains("://") && !input.contains('@') {
            let parts: Vec<&str> = input.split('/').collect();
            if parts.len() == 2 && !parts[0].is_empty() && !parts[1].is_empty() {
                return Self::github(parts[0], parts[1].trim_end_matches(".git"));
            }
        }

        // Handle git@ URLs (e.g., git@github.com:owner/repo.git)
        if let Some(rest) = input.strip_prefix("git@") {
            if let Some((host, path)) = rest.split_once(':') {
                if let Some((owner, repo)) = owner_and_repo(path) {
                    return Ok(Self {
                        owner,
                        repo,
                        clone_url: input.to_string(),
                        host: host.to_string(),
                        kind: RemoteKind::Ssh,
                    });
                }
            }
        }

        // Handle https://, http:// and ssh:// URLs
        if let Ok(url) = url::Url::parse(input) {
            let kind = match url.scheme() {
                "https" | "http" => Some(RemoteKind::Https),
                "ssh" => Some(RemoteKind::Ssh),
                _ => None,
            };

            if let (Some(kind), Some(host)) = (kind, url.host_str()) {
                if !url.password().unwrap_or("").is_empty() {
                    return Err(Error::Config(
                        "Repository URLs must not embed credentials; use GITHUB_PAT or the secrets file"
                            .to_string(),
                    ));
                }

                if let Some((owner, repo)) = owner_and_repo(url.path()) {
                    let clone_url = if kind == RemoteKind::Https && !input.ends_with(".git") {
                        format!("{}.git", input.trim_end_matches('/'))
                    } else {
                        input.to_string()
                    };

                    return Ok(Self {
                        owner,
                        repo,
                        clone_url,
                        host: host.to_string(),
                        kind,
                    });
                }
            }
        }

        Err(Error::Config(format!(
            "Invalid repository URL: {}. Expected format: owner/repo, https://github.com/owner/repo, git@github.com:owner/repo.git or a local path",
            input
        )))
    }

    fn github(owner: &str, repo: &str) -> Result<Self> {
        if repo.is_empty() {
            return Err(Error::Config(format!("Invalid repository name for owner {}", owner)));
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            clone_url: format!("https://github.com/{}/{}.git", owner, repo),
            host: "github.com".to_string(),
            kind: RemoteKind::Https,
        })
    }

    fn parse_local(input: &str) -> Option<Self> {
        let path = if let Some(stripped) = input.strip_prefix("file://") {
            stripped
        } else if input.starts_with('/')
            || input.starts_with("./")
            || input.starts_with("../")
            || Path::new(input).is_absolute()
        {
            input
        } else {
            return None;
        };

        let path = Path::new(path);
        let repo = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("repo")
            .trim_end_matches(".git")
            .to_string();
        let owner = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("local")
            .to_string();

        Some(Self {
            owner,
            repo,
            clone_url: input.to_string(),
            host: String::new(),
            kind: RemoteKind::Local,
        })
    }

    /// Short human-readable name (owner/repo)
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn owner_and_repo(path: &str) -> Option<(String, String)> {
    let path = path.trim_matches('/').trim_end_matches(".git");
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();

    if parts.len() >= 2 {
        let owner = parts[parts.len() - 2].to_string();
        let repo = parts[parts.len() - 1].to_string();
        Some((owner, repo))
    } else {
        None
    }
}
