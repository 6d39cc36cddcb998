//! Certificate state and issuance
//!
//! Certificates are owned by an external ACME client; RevProx only reads the
//! files it leaves behind and asks it to issue or renew through
//! [`CertClient`].

mod client;
mod error;
mod inspect;
mod manager;
mod memory;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use client::{AcmeCommandClient, CertClient, IssueRequest};
pub use error::CertError;
pub use manager::CertificateManager;
pub use memory::InMemoryCertClient;

/// Lifecycle state of a certificate on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertStatus {
    /// No certificate file, or one that could not be read
    Absent,
    Valid,
    /// Still valid, but within the renewal threshold
    ExpiringSoon,
    Expired,
}

impl CertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Valid => "valid",
            Self::ExpiringSoon => "expiring soon",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for CertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Certificate state for one hostname, derived from the ACME client's files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRecord {
    pub hostname: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: CertStatus,
}

impl CertificateRecord {
    pub fn absent(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            issued_at: None,
            expires_at: None,
            status: CertStatus::Absent,
        }
    }

    /// Whole days until expiry, negative once expired.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|expires| (expires - now).num_days())
    }
}
