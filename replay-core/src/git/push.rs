//! Pushing mirrored history

use std::cell::RefCell;

use git2::PushOptions;
use tracing::info;

use super::auth::{remote_callbacks, Credentials};
use super::repo::GitRepo;
use crate::{Error, Result};

impl GitRepo {
    /// Push a local branch to the same branch name on `remote_name`
    ///
    /// Never forces: if the remote branch moved since the clone the push is
    /// rejected and reported as [`Error::Push`].
    pub fn push_branch(
        &self,
        remote_name: &str,
        branch: &str,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        let mut remote = self.inner().find_remote(remote_name).map_err(|e| {
            Error::Config(format!("Remote '{}' not found: {}", remote_name, e))
        })?;

        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());

        {
            let mut callbacks = remote_callbacks(credentials);
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejected
                        .borrow_mut()
                        .push(format!("{}: {}", refname, message));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            info!(remote = remote_name, %refspec, "Pushing");
            remote
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(|e| Error::Push(format!("{}: {}", branch, e)))?;
        }

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(Error::Push(rejected.join("; ")));
        }

        Ok(())
    }
}
