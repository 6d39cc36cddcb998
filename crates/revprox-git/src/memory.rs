//! In-memory [`GitClient`] for tests

use std::cell::RefCell;
use std::path::PathBuf;

use crate::client::{GitClient, PullOutcome};
use crate::{Error, Result};

/// Records pulls and pushes without touching a repository.
#[derive(Debug, Default)]
pub struct InMemoryGitClient {
    changed: bool,
    pull_error: Option<String>,
    push_error: Option<String>,
    pulls: RefCell<usize>,
    pushed: RefCell<Vec<Vec<PathBuf>>>,
}

impl InMemoryGitClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report that the pull moved HEAD.
    pub fn with_changes(mut self) -> Self {
        self.changed = true;
        self
    }

    pub fn failing_pull(mut self, message: impl Into<String>) -> Self {
        self.pull_error = Some(message.into());
        self
    }

    pub fn failing_push(mut self, message: impl Into<String>) -> Self {
        self.push_error = Some(message.into());
        self
    }

    pub fn pull_count(&self) -> usize {
        *self.pulls.borrow()
    }

    /// Artifact lists passed to each `push` call.
    pub fn pushed(&self) -> Vec<Vec<PathBuf>> {
        self.pushed.borrow().clone()
    }
}

impl GitClient for InMemoryGitClient {
    fn pull(&self) -> Result<PullOutcome> {
        *self.pulls.borrow_mut() += 1;
        if let Some(message) = &self.pull_error {
            return Err(Error::PullFailed {
                message: message.clone(),
            });
        }
        Ok(PullOutcome {
            previous: Some("0000000".into()),
            current: if self.changed { "1111111" } else { "0000000" }.into(),
            branch: "main".into(),
        })
    }

    fn push(&self, artifacts: &[PathBuf]) -> Result<bool> {
        if let Some(message) = &self.push_error {
            return Err(Error::PushFailed {
                message: message.clone(),
            });
        }
        self.pushed.borrow_mut().push(artifacts.to_vec());
        Ok(!artifacts.is_empty())
    }
}
