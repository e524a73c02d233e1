//! Replay policies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Which source commits get replayed and how their messages are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayPolicy {
    /// Every commit on the first-parent chain, original messages
    #[default]
    #[serde(alias = "first-parent")]
    Full,
    /// Merge commits on the first-parent chain, original messages
    #[serde(alias = "merges-only")]
    Merges,
    /// Merge commits on the first-parent chain, messages listing the merged commits
    MergesWithMessage,
    /// A single commit holding the tree of the source tip
    Snapshot,
}

impl ReplayPolicy {
    /// All policies, in the order they are documented
    pub const ALL: [ReplayPolicy; 4] = [
        ReplayPolicy::Full,
        ReplayPolicy::Merges,
        ReplayPolicy::MergesWithMessage,
        ReplayPolicy::Snapshot,
    ];

    /// Canonical name as accepted on the command line and in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplayPolicy::Full => "full",
            ReplayPolicy::Merges => "merges",
            ReplayPolicy::MergesWithMessage => "merges-with-message",
            ReplayPolicy::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for ReplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplayPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" | "first-parent" => Ok(ReplayPolicy::Full),
            "merges" | "merges-only" => Ok(ReplayPolicy::Merges),
            "merges-with-message" => Ok(ReplayPolicy::MergesWithMessage),
            "snapshot" => Ok(ReplayPolicy::Snapshot),
            other => Err(Error::Config(format!(
                "Unknown replay policy '{}'. Expected one of: full, merges, merges-with-message, snapshot",
                other
            ))),
        }
    }
}
