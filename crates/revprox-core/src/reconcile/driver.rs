//! Per-site reconciliation and the single batched reload

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use revprox_fs::{checksum, io};
use revprox_meta::{AcmeContact, SiteEntry};

use super::plan::{Plan, PlannedSite};
use super::report::{RunReport, SiteOutcome, SiteState};
use super::retry::RetryPolicy;
use crate::certs::{CertClient, CertStatus, CertificateManager};
use crate::reload::{ReloadError, ReloadSignaler};
use crate::resources::ProxyResources;
use crate::template::{self, GENERATED_MARKER};

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Hostname '{hostname}' appears more than once")]
    DuplicateSite { hostname: String },

    #[error("Hostname '{hostname}' would overwrite the generated include {}", path.display())]
    ReservedHostname { hostname: String, path: PathBuf },

    #[error(transparent)]
    Fs(#[from] revprox_fs::Error),

    /// Sites were reconciled but NGINX did not take the new configuration
    #[error("{error}")]
    Reload {
        error: ReloadError,
        report: Box<RunReport>,
    },
}

/// Brings NGINX vhosts and certificates in line with the site list.
///
/// Sites are processed one at a time in order. A site that fails never
/// stops the others; NGINX is reloaded once at the end. When a certificate
/// has to be issued and the include does not yet carry the challenge server,
/// NGINX is also reloaded once before the first ACME request.
#[derive(Debug)]
pub struct ReconciliationDriver<C, R> {
    resources: ProxyResources,
    certs: CertificateManager<C>,
    reloader: R,
    retry: RetryPolicy,
}

impl<C: CertClient, R: ReloadSignaler> ReconciliationDriver<C, R> {
    pub fn new(resources: ProxyResources, certs: CertificateManager<C>, reloader: R) -> Self {
        Self {
            resources,
            certs,
            reloader,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// ACME contact used for the following issuances.
    pub fn set_contact(&mut self, contact: AcmeContact) {
        self.certs.set_contact(contact);
    }

    pub fn resources(&self) -> &ProxyResources {
        &self.resources
    }

    pub fn certificates(&self) -> &CertificateManager<C> {
        &self.certs
    }

    pub fn reloader(&self) -> &R {
        &self.reloader
    }

    /// Work a run would do, without writing, issuing or reloading.
    pub fn plan(&self, sites: &[SiteEntry]) -> Result<Plan, RunError> {
        self.check_sites(sites)?;

        let mut plan = Plan::default();
        for site in sites {
            let vhost = self.resources.vhost_path(&site.hostname);
            let current = io::read_text_optional(&vhost)?;
            let rendered = template::render(site, &self.resources);
            plan.sites.push(PlannedSite {
                hostname: site.hostname.clone(),
                new_site: current.is_none(),
                config_changed: current.as_deref() != Some(rendered.as_str()),
                certificate: site.enable_ssl.then(|| self.certs.status(&site.hostname)),
                vhost,
            });
        }

        plan.stale = self.stale_vhosts(sites)?;
        let expected = template::render_main(sites.iter().map(|s| s.hostname.as_str()), &self.resources);
        plan.main_include_changed =
            io::read_text_optional(&self.resources.main_include)?.as_deref() != Some(expected.as_str());
        Ok(plan)
    }

    /// Reconcile every site, prune stale vhosts and reload NGINX once.
    pub fn run(&self, sites: &[SiteEntry]) -> Result<RunReport, RunError> {
        self.check_sites(sites)?;
        self.resources.ensure_dirs()?;

        let mut report = RunReport::default();
        self.prepare_challenges(sites, &mut report)?;
        for site in sites {
            let outcome = self.reconcile_site(site, &mut report);
            match outcome.state {
                SiteState::Ready => tracing::info!(hostname = %site.hostname, "Site ready"),
                _ => tracing::error!(
                    hostname = %site.hostname,
                    error = outcome.error.as_deref().unwrap_or("unknown"),
                    "Site failed"
                ),
            }
            report.sites.push(outcome);
        }

        for (hostname, path) in self.stale_vhosts(sites)? {
            if io::remove_if_exists(&path)? {
                tracing::info!(hostname = %hostname, path = %path.display(), "Removed stale vhost");
                report.action(format!("removed {}", path.display()));
                report.removed.push(hostname);
            }
        }

        self.write_main_include(sites, &mut report)?;

        let activated = report.sites.iter().any(SiteOutcome::reached_config_written);
        if activated || !report.removed.is_empty() || report.main_include_changed {
            if let Err(error) = self.reloader.reload() {
                tracing::error!(error = %error, "NGINX reload failed");
                return Err(RunError::Reload {
                    error,
                    report: Box::new(report),
                });
            }
            report.reloaded = true;
            report.action("reloaded NGINX");
        }

        tracing::info!(
            ready = report.ready_count(),
            failed = report.failed().count(),
            reloaded = report.reloaded,
            "Reconciliation finished"
        );
        Ok(report)
    }

    fn reconcile_site(&self, site: &SiteEntry, report: &mut RunReport) -> SiteOutcome {
        let hostname = site.hostname.as_str();
        let mut outcome = SiteOutcome::new(hostname);
        let path = self.resources.vhost_path(hostname);

        let previous = match io::read_text_optional(&path) {
            Ok(previous) => previous,
            Err(e) => {
                outcome.fail(e.to_string());
                return outcome;
            }
        };
        let rendered = template::render(site, &self.resources);
        if previous.as_deref() != Some(rendered.as_str()) {
            if let Err(e) = io::write_text(&path, &rendered) {
                outcome.fail(e.to_string());
                return outcome;
            }
            tracing::info!(hostname = %hostname, path = %path.display(), "Wrote vhost");
            report.action(format!("wrote {}", path.display()));
            outcome.config_changed = true;
        }
        outcome.advance(SiteState::ConfigWritten);

        if !site.enable_ssl {
            outcome.advance(SiteState::Ready);
            return outcome;
        }

        let record = self.certs.status(hostname);
        tracing::debug!(hostname = %hostname, status = %record.status, "Certificate checked");
        outcome.advance(SiteState::CertChecked);
        if record.status == CertStatus::Valid {
            outcome.certificate = Some(record);
            outcome.advance(SiteState::Ready);
            return outcome;
        }

        outcome.advance(SiteState::CertIssuing);
        let (result, attempts) = self
            .retry
            .run(hostname, || self.certs.issue_or_renew(hostname));
        outcome.attempts = attempts;

        match result {
            Ok(record) => {
                report.action(format!("obtained certificate for {hostname}"));
                outcome.certificate = Some(record);
                outcome.advance(SiteState::Ready);
            }
            Err(error) => {
                if outcome.config_changed {
                    match self.roll_back(&path, previous.as_deref()) {
                        Ok(()) => outcome.config_changed = false,
                        Err(e) => report.warn(format!("could not roll back {}: {e}", path.display())),
                    }
                }
                // The kept vhost may point at certificate files that are gone.
                if path.is_file() && !self.servable(hostname) {
                    match io::remove_if_exists(&path) {
                        Ok(_) => {
                            tracing::warn!(hostname = %hostname, path = %path.display(), "Removed vhost without certificate");
                            report.action(format!("removed {}", path.display()));
                            outcome.config_changed = previous.is_some();
                        }
                        Err(e) => report.warn(format!("could not remove {}: {e}", path.display())),
                    }
                }
                outcome.certificate = Some(self.certs.status(hostname));
                outcome.fail_cert(&error);
            }
        }
        outcome
    }

    /// Restore a vhost to its content before the run, or remove it if new.
    fn roll_back(&self, path: &Path, previous: Option<&str>) -> revprox_fs::Result<()> {
        match previous {
            Some(content) => io::write_text(path, content)?,
            None => {
                io::remove_if_exists(path)?;
            }
        }
        tracing::info!(path = %path.display(), restored = previous.is_some(), "Rolled back vhost");
        Ok(())
    }

    /// Get the challenge server loaded before any certificate is requested.
    ///
    /// The include is rewritten with the vhosts NGINX can load right now and
    /// reloaded if that changed it. A failed reload is only a warning; the
    /// issuance that needed it reports its own failure.
    fn prepare_challenges(&self, sites: &[SiteEntry], report: &mut RunReport) -> revprox_fs::Result<()> {
        let issuing = sites
            .iter()
            .filter(|s| s.enable_ssl)
            .any(|s| self.certs.status(&s.hostname).status != CertStatus::Valid);
        if !issuing || !self.write_main_include(sites, report)? {
            return Ok(());
        }

        match self.reloader.reload() {
            Ok(()) => {
                tracing::info!("NGINX reloaded to answer ACME challenges");
                report.challenge_reload = true;
                report.action("reloaded NGINX to answer ACME challenges");
            }
            Err(error) => {
                tracing::warn!(error = %error, "NGINX did not load the challenge server");
                report.warn(format!("NGINX did not load the challenge server: {error}"));
            }
        }
        Ok(())
    }

    /// Whether the vhost on disk exists and every certificate file it
    /// references is present.
    fn servable(&self, hostname: &str) -> bool {
        let Ok(Some(content)) = io::read_text_optional(&self.resources.vhost_path(hostname)) else {
            return false;
        };
        let paths = self.resources.cert_paths(hostname);
        [paths.certificate, paths.private_key]
            .iter()
            .all(|file| file.is_file() || !content.contains(&file.display().to_string()))
    }

    /// Regenerate `revprox.conf`; returns whether its content changed.
    fn write_main_include(&self, sites: &[SiteEntry], report: &mut RunReport) -> revprox_fs::Result<bool> {
        let active = sites
            .iter()
            .map(|s| s.hostname.as_str())
            .filter(|h| self.servable(h));
        let content = template::render_main(active, &self.resources);
        let path = &self.resources.main_include;

        if checksum::file_matches(path, &content)? {
            return Ok(false);
        }
        io::write_text(path, &content)?;
        tracing::info!(path = %path.display(), "Wrote main include");
        report.action(format!("wrote {}", path.display()));
        report.main_include_changed = true;
        Ok(true)
    }

    /// Generated vhosts in the sites directory that no site owns anymore.
    ///
    /// Files without the generated marker are never touched.
    fn stale_vhosts(&self, sites: &[SiteEntry]) -> revprox_fs::Result<Vec<(String, PathBuf)>> {
        let dir = &self.resources.sites_dir;
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(revprox_fs::Error::io(dir, e)),
        };

        let wanted: HashSet<&str> = sites.iter().map(|s| s.hostname.as_str()).collect();
        let mut stale = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| revprox_fs::Error::io(dir, e))?.path();
            if path == self.resources.main_include || path.extension().is_none_or(|ext| ext != "conf") {
                continue;
            }
            let Some(hostname) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if wanted.contains(hostname.as_str()) {
                continue;
            }
            let managed = io::read_text_optional(&path)?
                .is_some_and(|content| content.starts_with(GENERATED_MARKER));
            if managed {
                stale.push((hostname, path));
            }
        }
        stale.sort();
        Ok(stale)
    }

    fn check_sites(&self, sites: &[SiteEntry]) -> Result<(), RunError> {
        let mut seen = HashSet::new();
        for site in sites {
            if !seen.insert(site.hostname.as_str()) {
                return Err(RunError::DuplicateSite {
                    hostname: site.hostname.clone(),
                });
            }
            let path = self.resources.vhost_path(&site.hostname);
            if path == self.resources.main_include {
                return Err(RunError::ReservedHostname {
                    hostname: site.hostname.clone(),
                    path,
                });
            }
        }
        Ok(())
    }
}
