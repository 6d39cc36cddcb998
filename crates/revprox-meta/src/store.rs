//! Loading of the YAML site file.

use std::path::{Path, PathBuf};

use revprox_fs::io;

use crate::error::{Error, Result};
use crate::site::{RawSiteFile, SiteConfig, SiteEntry};
use crate::validation;

/// Reads and validates the site definition file.
///
/// The file is re-read on every call; nothing is cached between runs.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole site file (ACME contact and sites).
    pub fn load(&self) -> Result<SiteConfig> {
        let content = io::read_text_optional(&self.path)?.ok_or_else(|| Error::ConfigNotFound {
            path: self.path.clone(),
        })?;
        self.parse(&content)
    }

    /// Load the site entries in file order.
    ///
    /// Fails with [`Error::Validation`] listing every invalid or duplicate
    /// entry when any entry is bad.
    pub fn load_sites(&self) -> Result<Vec<SiteEntry>> {
        Ok(self.load()?.sites)
    }

    /// Validate site file content without touching the filesystem.
    pub fn parse(&self, content: &str) -> Result<SiteConfig> {
        let raw: RawSiteFile = if content.trim().is_empty() {
            RawSiteFile::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| Error::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            })?
        };

        let config = validation::validate(&self.path, raw)?;
        tracing::debug!(
            path = %self.path.display(),
            sites = config.sites.len(),
            "Loaded site file"
        );
        if config.sites.is_empty() {
            tracing::warn!(path = %self.path.display(), "Site file defines no sites");
        }
        Ok(config)
    }
}
