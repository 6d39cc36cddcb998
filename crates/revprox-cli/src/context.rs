//! Storage directory resolution and wiring of the real collaborators

use std::path::{Path, PathBuf};

use revprox_core::{
    AcmeCommandClient, CertificateManager, NginxReloader, ProxyResources, ReconciliationDriver,
    RetryPolicy,
};
use revprox_fs::StorageLayout;
use revprox_git::{Credentials, Git2Client};
use revprox_meta::{ConfigStore, Settings};

use crate::error::{CliError, Result};

/// Default storage directory name under the home directory.
const DEFAULT_STORAGE_DIR: &str = ".revprox";

pub type Driver = ReconciliationDriver<AcmeCommandClient, NginxReloader>;

/// `--storage` if given, else `~/.revprox`.
pub fn storage_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => dirs::home_dir()
            .ok_or_else(|| CliError::user("Cannot determine the home directory; pass --storage"))?
            .join(DEFAULT_STORAGE_DIR),
    };
    Ok(dunce::canonicalize(&path).unwrap_or(path))
}

/// A set-up storage directory with its settings.
#[derive(Debug, Clone)]
pub struct StorageContext {
    pub layout: StorageLayout,
    pub settings: Settings,
}

impl StorageContext {
    /// Open a storage directory that `revprox setup` has prepared.
    pub fn open(root: &Path) -> Result<Self> {
        let layout = StorageLayout::new(root);
        layout.validate().map_err(|e| {
            CliError::user(format!("{e}\nRun 'revprox setup' first or pass --storage."))
        })?;
        if !layout.has_config_repo() {
            return Err(CliError::user(format!(
                "No config repository in {}. Run 'revprox setup' first.",
                layout.config_repo().display()
            )));
        }
        let settings = Settings::load(&layout)?;
        tracing::debug!(root = %root.display(), "Opened storage directory");
        Ok(Self { layout, settings })
    }

    pub fn resources(&self) -> ProxyResources {
        ProxyResources::from_settings(&self.layout, &self.settings)
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(self.layout.site_file())
    }

    pub fn credentials(&self) -> Option<Credentials> {
        let git = &self.settings.git;
        match (&git.username, git.resolved_token()) {
            (Some(username), Some(token)) => Some(Credentials::new(username.clone(), token)),
            _ => None,
        }
    }

    pub fn git_client(&self) -> Git2Client {
        Git2Client::new(self.layout.config_repo())
            .with_remote(self.settings.git.remote.clone())
            .with_branch(self.settings.git.branch.clone())
            .with_credentials(self.credentials())
    }

    pub fn certificate_manager(&self) -> CertificateManager<AcmeCommandClient> {
        CertificateManager::new(AcmeCommandClient::from_settings(&self.settings), self.resources())
            .with_renew_before_days(self.settings.acme.renew_before_days)
    }

    pub fn driver(&self) -> Driver {
        ReconciliationDriver::new(
            self.resources(),
            self.certificate_manager(),
            NginxReloader::from_settings(&self.settings),
        )
        .with_retry(RetryPolicy::from_settings(&self.settings.acme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_storage_is_used() {
        let temp = TempDir::new().unwrap();
        let path = storage_path(Some(temp.path())).unwrap();
        assert_eq!(path, dunce::canonicalize(temp.path()).unwrap());
    }

    #[test]
    fn missing_storage_is_user_error() {
        let temp = TempDir::new().unwrap();
        let err = StorageContext::open(&temp.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("revprox setup"));
    }

    #[test]
    fn storage_without_clone_is_user_error() {
        let temp = TempDir::new().unwrap();
        let err = StorageContext::open(temp.path()).unwrap_err();
        assert!(matches!(err, CliError::User { .. }));
    }
}
