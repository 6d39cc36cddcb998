//! Error types for revprox-git

use std::path::PathBuf;

/// Result type for revprox-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Synchronisation failures are reported, never fatal to a run.
pub type SyncError = Error;

/// Errors that can occur while talking to the config repository
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("No git repository at {path}")]
    RepositoryNotFound { path: PathBuf },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("HEAD is detached; cannot determine the branch to track")]
    DetachedHead,

    #[error("Branch '{branch}' has no counterpart on remote '{remote}'")]
    NoTrackingBranch { remote: String, branch: String },

    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Clone failed: {message}")]
    CloneFailed { message: String },

    #[error("Pull failed: {message}")]
    PullFailed { message: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Artifact {path} is outside the repository working tree")]
    ArtifactOutsideRepo { path: PathBuf },
}
