//! The interface the reconciliation run uses to talk to the config repository.

use std::path::PathBuf;

use crate::Result;

/// Result of bringing the local clone up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    /// HEAD before the pull, `None` for an unborn branch
    pub previous: Option<String>,
    /// HEAD after the pull
    pub current: String,
    /// Branch that was synchronised
    pub branch: String,
}

impl PullOutcome {
    /// Whether the pull moved HEAD.
    pub fn changed(&self) -> bool {
        self.previous.as_deref() != Some(self.current.as_str())
    }
}

/// Pull/push access to the config repository.
///
/// [`crate::Git2Client`] is the libgit2-backed implementation;
/// [`crate::InMemoryGitClient`] records calls for tests.
pub trait GitClient {
    /// Replace the local checkout with the remote tracking branch.
    fn pull(&self) -> Result<PullOutcome>;

    /// Commit the given files (paths inside the working tree) and push.
    ///
    /// Returns `Ok(false)` when nothing changed and no commit was made.
    fn push(&self, artifacts: &[PathBuf]) -> Result<bool>;
}
