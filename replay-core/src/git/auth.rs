//! Credentials for talking to remotes

use std::fmt;

use git2::{Cred, CredentialType, RemoteCallbacks};
use tracing::debug;

/// libgit2 retries the callback after a rejected credential; give up after this many
const MAX_AUTH_ATTEMPTS: u32 = 3;

/// Username and token for HTTPS remotes
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"***")
            .finish()
    }
}

/// Build remote callbacks that answer credential requests
///
/// HTTPS remotes get the token, SSH remotes go through the SSH agent, and
/// anything else falls back to libgit2's default credential.
pub fn remote_callbacks(credentials: Option<&Credentials>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;

    callbacks.credentials(move |url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_AUTH_ATTEMPTS {
            return Err(git2::Error::from_str(&format!(
                "authentication failed for {}",
                url
            )));
        }

        debug!(url, ?allowed, attempt = attempts, "Credentials requested");

        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Some(creds) = credentials {
                return Cred::userpass_plaintext(&creds.username, &creds.token);
            }
        }

        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }

        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(username_from_url.unwrap_or("git"));
        }

        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        Err(git2::Error::from_str(&format!(
            "no credentials available for {}; set GITHUB_PAT or add a token to the secrets file",
            url
        )))
    });

    // Progress is reported per commit, not per object
    callbacks.transfer_progress(|_| true);

    callbacks
}
