//! Site definitions and settings for RevProx.
//!
//! The site file (`config.yml` in the config repository) declares which
//! hostnames are proxied to which backends; the settings file
//! (`revprox.toml` in the storage directory) configures the tools RevProx
//! drives.

pub mod error;
pub mod settings;
pub mod site;
pub mod store;
pub mod validation;

pub use error::{EntryIssue, Error, Result, ValidationError};
pub use settings::{AcmeSettings, GIT_TOKEN_ENV, GitSettings, NginxSettings, Settings};
pub use site::{AcmeContact, DEFAULT_BACKEND_HOST, SiteConfig, SiteEntry};
pub use store::ConfigStore;
