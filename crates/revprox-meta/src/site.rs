//! Site file schema and the validated site model.

use serde::{Deserialize, Serialize};

/// Backend host used when an entry does not name one.
pub const DEFAULT_BACKEND_HOST: &str = "127.0.0.1";

/// One proxied hostname, validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SiteEntry {
    /// Lower-cased hostname, unique within a site file
    pub hostname: String,
    pub backend_host: String,
    pub backend_port: u16,
    pub enable_ssl: bool,
    /// Redirect plain HTTP to HTTPS (only meaningful with `enable_ssl`)
    pub force_ssl: bool,
}

impl SiteEntry {
    /// Plain HTTP site proxied to `127.0.0.1:<port>`.
    pub fn new(hostname: impl Into<String>, backend_port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            backend_host: DEFAULT_BACKEND_HOST.to_string(),
            backend_port,
            enable_ssl: false,
            force_ssl: false,
        }
    }

    /// Serve over HTTPS as well as plain HTTP.
    pub fn with_ssl(mut self) -> Self {
        self.enable_ssl = true;
        self
    }

    /// Serve over HTTPS only; plain HTTP redirects.
    pub fn with_forced_ssl(mut self) -> Self {
        self.enable_ssl = true;
        self.force_ssl = true;
        self
    }

    pub fn with_backend_host(mut self, host: impl Into<String>) -> Self {
        self.backend_host = host.into();
        self
    }

    /// Upstream URL used in `proxy_pass`.
    pub fn backend_url(&self) -> String {
        format!("http://{}:{}", self.backend_host, self.backend_port)
    }
}

/// ACME account details from the site file's optional `acme:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcmeContact {
    #[serde(default)]
    pub email: Option<String>,
    /// Use the CA's staging environment
    #[serde(default)]
    pub staging: bool,
}

/// Validated content of a site file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteConfig {
    pub acme: AcmeContact,
    /// Entries in file order
    pub sites: Vec<SiteEntry>,
}

/// Site file as written by the user, before validation.
///
/// Fields are optional or loosely typed so a single bad entry is reported
/// alongside the others instead of failing deserialization of the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSiteFile {
    #[serde(default)]
    pub acme: Option<AcmeContact>,
    #[serde(default)]
    pub sites: Vec<RawSite>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSite {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub backend_host: Option<String>,
    #[serde(default)]
    pub backend_port: Option<serde_yaml::Value>,
    #[serde(default)]
    pub ssl: Option<serde_yaml::Value>,
    #[serde(default)]
    pub force_ssl: Option<serde_yaml::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_url_uses_host_and_port() {
        let site = SiteEntry::new("app.example.com", 8080).with_backend_host("10.0.0.5");
        assert_eq!(site.backend_url(), "http://10.0.0.5:8080");
    }

    #[test]
    fn ssl_builders_set_flags() {
        let site = SiteEntry::new("app.example.com", 8080).with_ssl();
        assert!(site.enable_ssl);
        assert!(!site.force_ssl);

        let forced = SiteEntry::new("app.example.com", 8080).with_forced_ssl();
        assert!(forced.enable_ssl);
        assert!(forced.force_ssl);
    }
}
