//! Error types for revprox-meta

use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] revprox_fs::Error),

    #[error("Site file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse site file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Problems found in a single `sites:` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryIssue {
    /// Zero-based position of the entry in the file
    pub index: usize,
    /// Hostname as written, if the entry had one
    pub hostname: Option<String>,
    pub problems: Vec<String>,
}

impl fmt::Display for EntryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hostname {
            Some(host) => write!(f, "entry #{} ({}): ", self.index + 1, host)?,
            None => write!(f, "entry #{}: ", self.index + 1)?,
        }
        write!(f, "{}", self.problems.join("; "))
    }
}

/// Every invalid entry in a site file, reported together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ValidationError {
    pub path: PathBuf,
    pub issues: Vec<EntryIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} invalid site entr{} in {}:",
            self.issues.len(),
            if self.issues.len() == 1 { "y" } else { "ies" },
            self.path.display()
        )?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}
