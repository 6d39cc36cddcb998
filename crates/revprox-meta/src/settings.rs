//! RevProx settings (`revprox.toml` in the storage directory)
//!
//! Every field has a default, so a missing file or a partial file is valid.
//! Paths left unset resolve to the standard storage layout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use revprox_fs::{DocumentStore, StorageLayout};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable that overrides the stored git token.
pub const GIT_TOKEN_ENV: &str = "REVPROX_GIT_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Timeout for each external command (ACME client, nginx), in seconds
    pub command_timeout_secs: u64,
    pub nginx: NginxSettings,
    pub acme: AcmeSettings,
    pub git: GitSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_timeout_secs: 300,
            nginx: NginxSettings::default(),
            acme: AcmeSettings::default(),
            git: GitSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NginxSettings {
    /// Directory receiving one `<hostname>.conf` per site
    pub sites_dir: Option<PathBuf>,
    /// Command validating the configuration before reload
    pub test_command: Vec<String>,
    /// Command making NGINX pick up the new configuration
    pub reload_command: Vec<String>,
}

impl Default for NginxSettings {
    fn default() -> Self {
        Self {
            sites_dir: None,
            test_command: vec!["nginx".into(), "-t".into()],
            reload_command: vec!["nginx".into(), "-s".into(), "reload".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcmeSettings {
    /// ACME client invocation. Placeholders: `{hostname}`, `{email}`,
    /// `{webroot}`, `{config_dir}`, `{staging}`. Arguments that expand to an
    /// empty string are dropped.
    pub command: Vec<String>,
    /// ACME client config dir; certificates live in `<dir>/live/<hostname>/`
    pub certs_dir: Option<PathBuf>,
    pub webroot: Option<PathBuf>,
    /// Renew when fewer than this many days of validity remain
    pub renew_before_days: u32,
    /// Attempts per site when the ACME client reports a network failure
    pub retry_attempts: u32,
    pub retry_initial_delay_secs: u64,
}

impl Default for AcmeSettings {
    fn default() -> Self {
        let command = [
            "certbot",
            "certonly",
            "--non-interactive",
            "--agree-tos",
            "--webroot",
            "--webroot-path",
            "{webroot}",
            "--config-dir",
            "{config_dir}",
            "--work-dir",
            "{config_dir}/work",
            "--logs-dir",
            "{config_dir}/logs",
            "--email",
            "{email}",
            "--cert-name",
            "{hostname}",
            "-d",
            "{hostname}",
            "{staging}",
        ];
        Self {
            command: command.iter().map(|s| s.to_string()).collect(),
            certs_dir: None,
            webroot: None,
            renew_before_days: 30,
            retry_attempts: 3,
            retry_initial_delay_secs: 5,
        }
    }
}

impl AcmeSettings {
    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_secs(self.retry_initial_delay_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    pub remote: String,
    /// Branch to track; defaults to the checked-out branch
    pub branch: Option<String>,
    pub username: Option<String>,
    /// Access token; [`GIT_TOKEN_ENV`] takes precedence when set
    pub token: Option<String>,
    /// Commit and push generated artifacts after a run
    pub push: bool,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote: "origin".into(),
            branch: None,
            username: None,
            token: None,
            push: false,
        }
    }
}

impl GitSettings {
    /// Token from the environment, falling back to the stored one.
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var(GIT_TOKEN_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.token.clone())
    }
}

impl Settings {
    /// Load settings for a storage directory, defaulting when absent.
    pub fn load(layout: &StorageLayout) -> Result<Self> {
        Ok(DocumentStore::new().load_or_default(&layout.settings_file())?)
    }

    /// Write settings into a storage directory.
    pub fn save(&self, layout: &StorageLayout) -> Result<()> {
        Ok(DocumentStore::new().save(&layout.settings_file(), self)?)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn sites_dir(&self, layout: &StorageLayout) -> PathBuf {
        resolve(self.nginx.sites_dir.as_deref(), layout.nginx_dir())
    }

    pub fn certs_dir(&self, layout: &StorageLayout) -> PathBuf {
        resolve(self.acme.certs_dir.as_deref(), layout.certs_dir())
    }

    pub fn webroot(&self, layout: &StorageLayout) -> PathBuf {
        resolve(self.acme.webroot.as_deref(), layout.acme_webroot())
    }
}

fn resolve(configured: Option<&Path>, fallback: PathBuf) -> PathBuf {
    configured.map(Path::to_path_buf).unwrap_or(fallback)
}
