//! Certificate status and issuance for proxied hostnames

use chrono::{DateTime, Duration, Utc};
use revprox_meta::AcmeContact;

use super::inspect;
use super::{CertClient, CertError, CertStatus, CertificateRecord, IssueRequest};
use crate::resources::ProxyResources;

/// Default renewal threshold in days.
pub const DEFAULT_RENEW_BEFORE_DAYS: u32 = 30;

/// Reads certificate state from the store and drives the ACME client.
///
/// Issuance is attempted exactly once per call; retrying is the caller's
/// business.
#[derive(Debug)]
pub struct CertificateManager<C> {
    client: C,
    resources: ProxyResources,
    contact: AcmeContact,
    renew_before: Duration,
}

impl<C: CertClient> CertificateManager<C> {
    pub fn new(client: C, resources: ProxyResources) -> Self {
        Self {
            client,
            resources,
            contact: AcmeContact::default(),
            renew_before: Duration::days(i64::from(DEFAULT_RENEW_BEFORE_DAYS)),
        }
    }

    pub fn with_contact(mut self, contact: AcmeContact) -> Self {
        self.contact = contact;
        self
    }

    /// Replace the ACME contact, e.g. after re-reading the site file.
    pub fn set_contact(&mut self, contact: AcmeContact) {
        self.contact = contact;
    }

    pub fn with_renew_before_days(mut self, days: u32) -> Self {
        self.renew_before = Duration::days(i64::from(days));
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn renew_before(&self) -> Duration {
        self.renew_before
    }

    /// Current certificate state for `hostname`.
    pub fn status(&self, hostname: &str) -> CertificateRecord {
        self.status_at(hostname, Utc::now())
    }

    /// Certificate state as of `now`.
    ///
    /// A missing key, or a certificate that cannot be parsed, counts as
    /// absent so the next run issues a fresh one.
    pub fn status_at(&self, hostname: &str, now: DateTime<Utc>) -> CertificateRecord {
        let paths = self.resources.cert_paths(hostname);
        if !paths.certificate.is_file() || !paths.private_key.is_file() {
            return CertificateRecord::absent(hostname);
        }

        match inspect::read_validity(&paths.certificate) {
            Ok(validity) => CertificateRecord {
                hostname: hostname.to_string(),
                issued_at: Some(validity.not_before),
                expires_at: Some(validity.not_after),
                status: Self::classify(validity.not_after, now, self.renew_before),
            },
            Err(e) => {
                tracing::warn!(
                    hostname = %hostname,
                    path = %paths.certificate.display(),
                    error = %e,
                    "Unreadable certificate, treating as absent"
                );
                CertificateRecord::absent(hostname)
            }
        }
    }

    /// Classify an expiry date against `now` and the renewal threshold.
    pub fn classify(expires_at: DateTime<Utc>, now: DateTime<Utc>, renew_before: Duration) -> CertStatus {
        if expires_at <= now {
            CertStatus::Expired
        } else if expires_at - now < renew_before {
            CertStatus::ExpiringSoon
        } else {
            CertStatus::Valid
        }
    }

    pub fn request_for(&self, hostname: &str) -> IssueRequest {
        IssueRequest {
            hostname: hostname.to_string(),
            email: self.contact.email.clone(),
            staging: self.contact.staging,
            webroot: self.resources.webroot.clone(),
            config_dir: self.resources.certs_dir.clone(),
        }
    }

    /// Ask the ACME client for a certificate and confirm it landed.
    ///
    /// Succeeds only when the certificate on disk is afterwards
    /// [`CertStatus::Valid`].
    pub fn issue_or_renew(&self, hostname: &str) -> Result<CertificateRecord, CertError> {
        let before = self.status(hostname);
        tracing::info!(hostname = %hostname, status = %before.status, "Issuing certificate");

        self.client.issue(&self.request_for(hostname))?;

        let after = self.status(hostname);
        if after.status != CertStatus::Valid {
            return Err(CertError::ValidationFailure {
                hostname: hostname.to_string(),
                message: format!(
                    "ACME client reported success but the certificate at {} is {}",
                    self.resources.cert_paths(hostname).certificate.display(),
                    after.status
                ),
            });
        }
        tracing::info!(hostname = %hostname, expires_at = ?after.expires_at, "Certificate ready");
        Ok(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certs::InMemoryCertClient;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(60, CertStatus::Valid)]
    #[case(31, CertStatus::Valid)]
    #[case(10, CertStatus::ExpiringSoon)]
    #[case(0, CertStatus::Expired)]
    #[case(-3, CertStatus::Expired)]
    fn classify_against_threshold(#[case] days_left: i64, #[case] expected: CertStatus) {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let status = CertificateManager::<InMemoryCertClient>::classify(
            now + Duration::days(days_left),
            now,
            Duration::days(30),
        );
        assert_eq!(status, expected);
    }

    #[test]
    fn missing_certificate_is_absent() {
        let temp = tempfile::TempDir::new().unwrap();
        let manager = CertificateManager::new(InMemoryCertClient::new(), ProxyResources::in_dir(temp.path()));
        assert_eq!(manager.status("app.example.com").status, CertStatus::Absent);
    }

    #[test]
    fn request_carries_contact() {
        let temp = tempfile::TempDir::new().unwrap();
        let manager = CertificateManager::new(InMemoryCertClient::new(), ProxyResources::in_dir(temp.path()))
            .with_contact(AcmeContact {
                email: Some("ops@example.com".into()),
                staging: true,
            });
        let request = manager.request_for("app.example.com");
        assert_eq!(request.email.as_deref(), Some("ops@example.com"));
        assert!(request.staging);
        assert_eq!(request.config_dir, temp.path().join("certs"));
    }
}
