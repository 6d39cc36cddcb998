//! Shared filesystem resources a run writes to.

use std::path::{Path, PathBuf};

use revprox_fs::StorageLayout;
use revprox_meta::Settings;

/// Certificate files the ACME client maintains for one hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertPaths {
    pub certificate: PathBuf,
    pub private_key: PathBuf,
}

/// Handle to the NGINX output directory and the certificate store.
///
/// Passed explicitly into the driver so tests can point it at a temp dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResources {
    /// One `<hostname>.conf` per site
    pub sites_dir: PathBuf,
    /// ACME client config dir, certificates under `live/<hostname>/`
    pub certs_dir: PathBuf,
    /// Directory served at `/.well-known/acme-challenge/`
    pub webroot: PathBuf,
    /// Top-level include listing every active vhost
    pub main_include: PathBuf,
}

impl ProxyResources {
    /// Resolve resources from a storage directory and its settings.
    pub fn from_settings(layout: &StorageLayout, settings: &Settings) -> Self {
        let sites_dir = settings.sites_dir(layout);
        let main_include = sites_dir.join(revprox_fs::StoragePath::MainInclude);
        Self {
            sites_dir,
            certs_dir: settings.certs_dir(layout),
            webroot: settings.webroot(layout),
            main_include,
        }
    }

    /// Everything inside one root directory, using the standard layout.
    pub fn in_dir(root: &Path) -> Self {
        Self::from_settings(&StorageLayout::new(root), &Settings::default())
    }

    pub fn vhost_path(&self, hostname: &str) -> PathBuf {
        self.sites_dir.join(format!("{hostname}.conf"))
    }

    pub fn cert_paths(&self, hostname: &str) -> CertPaths {
        let live = self.certs_dir.join("live").join(hostname);
        CertPaths {
            certificate: live.join("fullchain.pem"),
            private_key: live.join("privkey.pem"),
        }
    }

    /// Create the output directories if they are missing.
    pub fn ensure_dirs(&self) -> revprox_fs::Result<()> {
        for dir in [&self.sites_dir, &self.certs_dir, &self.webroot] {
            revprox_fs::io::ensure_dir(dir)?;
        }
        Ok(())
    }
}
