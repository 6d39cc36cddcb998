//! Reading validity dates out of PEM certificates

use std::path::Path;

use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub(crate) enum InspectError {
    #[error("failed to read certificate: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid PEM: {0}")]
    Pem(#[from] pem::PemError),

    #[error("invalid X.509 certificate: {0}")]
    X509(String),

    #[error("certificate validity is out of range")]
    Timestamp,
}

/// `notBefore`/`notAfter` of the first certificate in a PEM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Validity {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

/// Parse the leaf certificate of a PEM bundle such as `fullchain.pem`.
pub(crate) fn read_validity(path: &Path) -> Result<Validity, InspectError> {
    let content = std::fs::read(path)?;
    parse_validity(&content)
}

pub(crate) fn parse_validity(content: &[u8]) -> Result<Validity, InspectError> {
    let pem = pem::parse(content)?;
    let (_, cert) = x509_parser::parse_x509_certificate(pem.contents())
        .map_err(|e| InspectError::X509(e.to_string()))?;

    let validity = cert.validity();
    Ok(Validity {
        not_before: to_utc(validity.not_before.timestamp())?,
        not_after: to_utc(validity.not_after.timestamp())?,
    })
}

fn to_utc(timestamp: i64) -> Result<DateTime<Utc>, InspectError> {
    DateTime::from_timestamp(timestamp, 0).ok_or(InspectError::Timestamp)
}
