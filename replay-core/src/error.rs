//! Error types for git-replay

use thiserror::Error;

/// Result type alias for replay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for replay operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by libgit2
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The target history carries a marker for a commit the source no longer has
    #[error("Target branch diverged from source: {0}")]
    Diverged(String),

    /// The remote refused a pushed reference
    #[error("Push rejected: {0}")]
    Push(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
