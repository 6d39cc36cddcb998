//! Storage directory layout
//!
//! A RevProx storage directory holds the config repository clone, the ACME
//! client's certificate store and the generated NGINX files:
//!
//! ```text
//! <storage>/
//!   revprox.toml
//!   config/          git clone, contains config.yml (and status.yml)
//!   certs/           ACME client config dir (live/<host>/fullchain.pem)
//!   nginx/           <host>.conf + revprox.conf
//!   acme-webroot/    HTTP-01 challenge files
//! ```

use std::path::{Path, PathBuf};

use crate::{Error, Result, StoragePath, io};

/// Resolved paths inside one storage directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry(&self, entry: StoragePath) -> PathBuf {
        match entry {
            StoragePath::SiteFile | StoragePath::StatusFile => self.config_repo().join(entry),
            StoragePath::MainInclude => self.nginx_dir().join(entry),
            other => self.root.join(other),
        }
    }

    pub fn config_repo(&self) -> PathBuf {
        self.root.join(StoragePath::ConfigRepo)
    }

    pub fn site_file(&self) -> PathBuf {
        self.entry(StoragePath::SiteFile)
    }

    pub fn status_file(&self) -> PathBuf {
        self.entry(StoragePath::StatusFile)
    }

    pub fn certs_dir(&self) -> PathBuf {
        self.entry(StoragePath::Certs)
    }

    pub fn nginx_dir(&self) -> PathBuf {
        self.entry(StoragePath::Nginx)
    }

    pub fn acme_webroot(&self) -> PathBuf {
        self.entry(StoragePath::AcmeWebroot)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.entry(StoragePath::Settings)
    }

    pub fn main_include(&self) -> PathBuf {
        self.entry(StoragePath::MainInclude)
    }

    /// Whether the config repository has been cloned already.
    pub fn has_config_repo(&self) -> bool {
        self.config_repo().join(".git").exists()
    }

    /// Check that the storage root exists and is a writable directory.
    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(Error::StorageUnusable {
                path: self.root.clone(),
                reason: "directory does not exist".into(),
            });
        }
        io::ensure_dir(&self.root)
    }

    /// Create the generated-output directories if they are missing.
    pub fn ensure_output_dirs(&self) -> Result<()> {
        for dir in [self.certs_dir(), self.nginx_dir(), self.acme_webroot()] {
            io::ensure_dir(&dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_resolve_under_root() {
        let layout = StorageLayout::new("/srv/revprox");
        assert_eq!(layout.site_file(), PathBuf::from("/srv/revprox/config/config.yml"));
        assert_eq!(layout.main_include(), PathBuf::from("/srv/revprox/nginx/revprox.conf"));
        assert_eq!(layout.settings_file(), PathBuf::from("/srv/revprox/revprox.toml"));
        assert_eq!(layout.status_file(), PathBuf::from("/srv/revprox/config/status.yml"));
    }
}
