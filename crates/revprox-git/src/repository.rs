//! libgit2-backed [`GitClient`]

use std::path::{Path, PathBuf};

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{FetchOptions, IndexAddOption, PushOptions, Repository, ResetType, Signature};

use crate::client::{GitClient, PullOutcome};
use crate::remote::{Credentials, callbacks};
use crate::{Error, Result};

/// Commit message used for artifacts pushed back after a run.
const ARTIFACT_COMMIT_MESSAGE: &str = "revprox: update generated artifacts";

/// [`GitClient`] operating on a local clone through libgit2.
#[derive(Debug, Clone)]
pub struct Git2Client {
    path: PathBuf,
    remote: String,
    branch: Option<String>,
    credentials: Option<Credentials>,
}

impl Git2Client {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            remote: "origin".into(),
            branch: None,
            credentials: None,
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Track `branch` instead of the currently checked-out branch.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.path).map_err(|_| Error::RepositoryNotFound {
            path: self.path.clone(),
        })
    }

    fn branch_name(&self, repo: &Repository) -> Result<String> {
        if let Some(branch) = &self.branch {
            return Ok(branch.clone());
        }
        let head = repo.head()?;
        if !head.is_branch() {
            return Err(Error::DetachedHead);
        }
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }

    fn fetch_options(&self) -> FetchOptions<'static> {
        let mut opts = FetchOptions::new();
        opts.remote_callbacks(callbacks(self.credentials.as_ref()));
        opts
    }

    fn signature(repo: &Repository) -> Result<Signature<'static>> {
        match repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now("revprox", "revprox@localhost")?),
        }
    }

    fn relative_to_workdir(repo: &Repository, artifact: &Path) -> Result<PathBuf> {
        let workdir = repo.workdir().ok_or_else(|| Error::ArtifactOutsideRepo {
            path: artifact.to_path_buf(),
        })?;
        if artifact.is_relative() {
            return Ok(artifact.to_path_buf());
        }
        artifact
            .strip_prefix(workdir)
            .map(Path::to_path_buf)
            .map_err(|_| Error::ArtifactOutsideRepo {
                path: artifact.to_path_buf(),
            })
    }
}

impl GitClient for Git2Client {
    fn pull(&self) -> Result<PullOutcome> {
        let repo = self.open()?;
        let previous = repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .map(|oid| oid.to_string());
        let branch = self.branch_name(&repo)?;

        let mut remote = repo
            .find_remote(&self.remote)
            .map_err(|_| Error::RemoteNotFound {
                name: self.remote.clone(),
            })?;

        let tracking = format!("refs/remotes/{}/{}", self.remote, branch);
        let refspec = format!("+refs/heads/{branch}:{tracking}");

        tracing::debug!(remote = %self.remote, branch = %branch, "Fetching config repository");
        remote
            .fetch(&[refspec.as_str()], Some(&mut self.fetch_options()), None)
            .map_err(|e| Error::PullFailed {
                message: format!("fetch failed: {}", e.message()),
            })?;

        let target = repo
            .find_reference(&tracking)
            .and_then(|r| r.peel_to_commit())
            .map_err(|_| Error::NoTrackingBranch {
                remote: self.remote.clone(),
                branch: branch.clone(),
            })?;

        // Local edits to the clone are discarded; the remote is authoritative.
        repo.reset(
            target.as_object(),
            ResetType::Hard,
            Some(CheckoutBuilder::new().force()),
        )?;

        let current = target.id().to_string();
        let outcome = PullOutcome {
            previous,
            current,
            branch,
        };
        if outcome.changed() {
            tracing::info!(
                branch = %outcome.branch,
                from = outcome.previous.as_deref().unwrap_or("(none)"),
                to = %outcome.current,
                "Config repository updated"
            );
        } else {
            tracing::debug!(branch = %outcome.branch, "Config repository already up to date");
        }
        Ok(outcome)
    }

    fn push(&self, artifacts: &[PathBuf]) -> Result<bool> {
        if artifacts.is_empty() {
            return Ok(false);
        }

        let repo = self.open()?;
        let branch = self.branch_name(&repo)?;

        let relative = artifacts
            .iter()
            .map(|a| Self::relative_to_workdir(&repo, a))
            .collect::<Result<Vec<_>>>()?;

        let mut index = repo.index()?;
        index.add_all(relative.iter().map(PathBuf::as_path), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        if let Some(parent) = &parent
            && parent.tree_id() == tree_id
        {
            tracing::debug!("Artifacts unchanged, nothing to push");
            return Ok(false);
        }

        let tree = repo.find_tree(tree_id)?;
        let signature = Self::signature(&repo)?;
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let commit = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            ARTIFACT_COMMIT_MESSAGE,
            &tree,
            &parents,
        )?;

        let mut remote = repo
            .find_remote(&self.remote)
            .map_err(|_| Error::RemoteNotFound {
                name: self.remote.clone(),
            })?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let mut opts = PushOptions::new();
        opts.remote_callbacks(callbacks(self.credentials.as_ref()));
        remote
            .push(&[refspec.as_str()], Some(&mut opts))
            .map_err(|e| Error::PushFailed {
                message: e.message().to_string(),
            })?;

        tracing::info!(commit = %commit, files = relative.len(), "Pushed generated artifacts");
        Ok(true)
    }
}

/// Clone `url` into `dest` using token credentials.
pub fn clone_with_credentials(
    url: &str,
    dest: &Path,
    credentials: Option<&Credentials>,
) -> Result<Repository> {
    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(callbacks(credentials));

    tracing::info!(url = %url, dest = %dest.display(), "Cloning config repository");
    RepoBuilder::new()
        .fetch_options(fetch)
        .clone(url, dest)
        .map_err(|e| Error::CloneFailed {
            message: e.message().to_string(),
        })
}
