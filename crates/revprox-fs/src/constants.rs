//! Names of the fixed entries inside a RevProx storage directory.

use std::path::Path;

/// Standard storage directory entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoragePath {
    /// The `config` directory (clone of the private config repository)
    ConfigRepo,
    /// The `certs` directory (ACME client configuration and live certificates)
    Certs,
    /// The `nginx` directory (generated virtual hosts)
    Nginx,
    /// The `acme-webroot` directory (HTTP-01 challenge files)
    AcmeWebroot,
    /// The `revprox.toml` settings file
    Settings,
    /// The `config.yml` site definition file inside the config repository
    SiteFile,
    /// The `revprox.conf` include file inside the nginx directory
    MainInclude,
    /// The `status.yml` run snapshot inside the config repository
    StatusFile,
}

impl StoragePath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigRepo => "config",
            Self::Certs => "certs",
            Self::Nginx => "nginx",
            Self::AcmeWebroot => "acme-webroot",
            Self::Settings => "revprox.toml",
            Self::SiteFile => "config.yml",
            Self::MainInclude => "revprox.conf",
            Self::StatusFile => "status.yml",
        }
    }
}

impl AsRef<Path> for StoragePath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for StoragePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
