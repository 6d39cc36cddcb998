//! Per-site states and the run report

use std::path::PathBuf;

use serde::Serialize;

use crate::certs::{CertError, CertificateRecord};

/// Where a site is in the reconciliation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteState {
    Pending,
    /// Vhost rendered and on disk
    ConfigWritten,
    /// Certificate state read from the store
    CertChecked,
    /// Waiting on the ACME client
    CertIssuing,
    Ready,
    Failed,
}

impl SiteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ConfigWritten => "config written",
            Self::CertChecked => "cert checked",
            Self::CertIssuing => "cert issuing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    /// Legal next states.
    pub fn can_become(&self, next: SiteState) -> bool {
        use SiteState::*;
        matches!(
            (self, next),
            (Pending, ConfigWritten)
                | (Pending, Failed)
                | (ConfigWritten, CertChecked)
                | (ConfigWritten, Ready)
                | (ConfigWritten, Failed)
                | (CertChecked, CertIssuing)
                | (CertChecked, Ready)
                | (CertIssuing, Ready)
                | (CertIssuing, Failed)
        )
    }
}

impl std::fmt::Display for SiteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one site during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteOutcome {
    pub hostname: String,
    pub state: SiteState,
    /// Every state the site passed through, starting with `Pending`
    pub transitions: Vec<SiteState>,
    /// Whether the vhost on disk differs from before the run
    pub config_changed: bool,
    /// Certificate after the run, SSL sites only
    pub certificate: Option<CertificateRecord>,
    /// ACME client calls made, retries included
    pub attempts: u32,
    pub error: Option<String>,
    /// Kind of certificate failure, when that is what failed the site
    pub error_kind: Option<&'static str>,
}

impl SiteOutcome {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            state: SiteState::Pending,
            transitions: vec![SiteState::Pending],
            config_changed: false,
            certificate: None,
            attempts: 0,
            error: None,
            error_kind: None,
        }
    }

    pub(crate) fn advance(&mut self, next: SiteState) {
        debug_assert!(
            self.state.can_become(next),
            "illegal transition {} -> {next}",
            self.state
        );
        tracing::debug!(hostname = %self.hostname, from = %self.state, to = %next, "Site state");
        self.state = next;
        self.transitions.push(next);
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.advance(SiteState::Failed);
    }

    pub(crate) fn fail_cert(&mut self, error: &CertError) {
        self.error_kind = Some(error.kind());
        self.fail(error.to_string());
    }

    pub fn is_ready(&self) -> bool {
        self.state == SiteState::Ready
    }

    /// Whether the site got far enough to have its vhost activated.
    pub fn reached_config_written(&self) -> bool {
        self.transitions.contains(&SiteState::ConfigWritten) && self.state != SiteState::Failed
    }
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Per-site outcomes in site file order
    pub sites: Vec<SiteOutcome>,
    /// Hostnames whose stale vhosts were removed
    pub removed: Vec<String>,
    /// Whether the main include changed
    pub main_include_changed: bool,
    /// NGINX was reloaded before issuing so it could answer ACME challenges
    pub challenge_reload: bool,
    pub reloaded: bool,
    /// Changes made, in order
    pub actions: Vec<String>,
    /// Non-fatal problems outside individual sites (sync errors, ...)
    pub warnings: Vec<String>,
    /// Files written into the config repository for pushing
    #[serde(skip)]
    pub artifacts: Vec<PathBuf>,
}

impl RunReport {
    /// True when every site is Ready.
    pub fn success(&self) -> bool {
        self.sites.iter().all(SiteOutcome::is_ready)
    }

    pub fn failed(&self) -> impl Iterator<Item = &SiteOutcome> {
        self.sites.iter().filter(|s| s.state == SiteState::Failed)
    }

    pub fn ready_count(&self) -> usize {
        self.sites.iter().filter(|s| s.is_ready()).count()
    }

    /// Whether anything on disk changed.
    pub fn changed(&self) -> bool {
        self.main_include_changed
            || !self.removed.is_empty()
            || self.sites.iter().any(|s| s.config_changed)
    }

    pub fn site(&self, hostname: &str) -> Option<&SiteOutcome> {
        self.sites.iter().find(|s| s.hostname == hostname)
    }

    pub(crate) fn action(&mut self, action: impl Into<String>) {
        self.actions.push(action.into());
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_site_path_is_legal() {
        let mut outcome = SiteOutcome::new("a.example.com");
        outcome.advance(SiteState::ConfigWritten);
        outcome.advance(SiteState::Ready);
        assert_eq!(
            outcome.transitions,
            vec![SiteState::Pending, SiteState::ConfigWritten, SiteState::Ready]
        );
        assert!(outcome.reached_config_written());
    }

    #[test]
    fn failed_site_has_error() {
        let mut outcome = SiteOutcome::new("a.example.com");
        outcome.advance(SiteState::ConfigWritten);
        outcome.advance(SiteState::CertChecked);
        outcome.advance(SiteState::CertIssuing);
        outcome.fail_cert(&CertError::RateLimited {
            hostname: "a.example.com".into(),
            message: "slow down".into(),
        });
        assert_eq!(outcome.state, SiteState::Failed);
        assert_eq!(outcome.error_kind, Some("rate_limited"));
        assert!(!outcome.reached_config_written());
    }

    #[test]
    fn cert_checked_cannot_fail_directly() {
        assert!(!SiteState::CertChecked.can_become(SiteState::Failed));
        assert!(!SiteState::Ready.can_become(SiteState::Failed));
    }

    #[test]
    fn success_requires_every_site_ready() {
        let mut report = RunReport::default();
        assert!(report.success());
        let mut ready = SiteOutcome::new("a.example.com");
        ready.advance(SiteState::ConfigWritten);
        ready.advance(SiteState::Ready);
        report.sites.push(ready);
        assert!(report.success());
        report.sites.push(SiteOutcome::new("b.example.com"));
        assert!(!report.success());
    }
}
