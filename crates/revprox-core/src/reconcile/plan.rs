//! What a run would change, computed without touching anything

use std::path::PathBuf;

use serde::Serialize;

use crate::certs::{CertStatus, CertificateRecord};

/// Expected work for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSite {
    pub hostname: String,
    pub vhost: PathBuf,
    /// No vhost on disk yet
    pub new_site: bool,
    /// Rendered vhost differs from the one on disk
    pub config_changed: bool,
    /// Current certificate, SSL sites only
    pub certificate: Option<CertificateRecord>,
}

impl PlannedSite {
    pub fn needs_certificate(&self) -> bool {
        self.certificate
            .as_ref()
            .is_some_and(|c| c.status != CertStatus::Valid)
    }

    pub fn needs_work(&self) -> bool {
        self.config_changed || self.needs_certificate()
    }
}

/// Result of [`super::ReconciliationDriver::plan`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub sites: Vec<PlannedSite>,
    /// Managed vhosts with no matching site, as `(hostname, path)`
    pub stale: Vec<(String, PathBuf)>,
    pub main_include_changed: bool,
}

impl Plan {
    /// Whether a run would change anything.
    pub fn needs_work(&self) -> bool {
        self.main_include_changed || !self.stale.is_empty() || self.sites.iter().any(PlannedSite::needs_work)
    }

    /// Human-readable list of the changes a run would make.
    pub fn actions(&self) -> Vec<String> {
        let mut actions = Vec::new();
        for site in &self.sites {
            if site.config_changed {
                let verb = if site.new_site { "create" } else { "update" };
                actions.push(format!("[dry-run] Would {verb} {}", site.vhost.display()));
            }
            if let Some(cert) = site.certificate.as_ref().filter(|_| site.needs_certificate()) {
                let verb = if cert.status == CertStatus::Absent { "issue" } else { "renew" };
                actions.push(format!(
                    "[dry-run] Would {verb} certificate for {} (currently {})",
                    site.hostname, cert.status
                ));
            }
        }
        for (hostname, path) in &self.stale {
            actions.push(format!("[dry-run] Would remove {} ({hostname} is no longer defined)", path.display()));
        }
        if self.main_include_changed {
            actions.push("[dry-run] Would regenerate the main include".to_string());
        }
        if !actions.is_empty() {
            actions.push("[dry-run] Would reload NGINX".to_string());
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(config_changed: bool, status: Option<CertStatus>) -> PlannedSite {
        PlannedSite {
            hostname: "a.example.com".into(),
            vhost: PathBuf::from("/srv/nginx/a.example.com.conf"),
            new_site: false,
            config_changed,
            certificate: status.map(|status| CertificateRecord {
                status,
                ..CertificateRecord::absent("a.example.com")
            }),
        }
    }

    #[test]
    fn empty_plan_has_nothing_to_do() {
        let plan = Plan::default();
        assert!(!plan.needs_work());
        assert!(plan.actions().is_empty());
    }

    #[test]
    fn expiring_certificate_is_work() {
        let plan = Plan {
            sites: vec![planned(false, Some(CertStatus::ExpiringSoon))],
            ..Plan::default()
        };
        assert!(plan.needs_work());
        let actions = plan.actions();
        assert_eq!(actions[0], "[dry-run] Would renew certificate for a.example.com (currently expiring soon)");
        assert_eq!(actions.last().unwrap(), "[dry-run] Would reload NGINX");
    }

    #[test]
    fn valid_unchanged_site_is_not_work() {
        let plan = Plan {
            sites: vec![planned(false, Some(CertStatus::Valid)), planned(false, None)],
            ..Plan::default()
        };
        assert!(!plan.needs_work());
    }
}
