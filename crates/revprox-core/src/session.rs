//! One `revprox update`: pull, validate, reconcile, push
//!
//! Sync failures are reported and the run continues against the local
//! clone. An invalid site file stops everything before any file is written.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use revprox_fs::DocumentStore;
use revprox_git::{GitClient, PullOutcome};
use revprox_meta::ConfigStore;
use serde::Serialize;

use crate::certs::{CertClient, CertStatus};
use crate::error::Result;
use crate::reconcile::{Plan, ReconciliationDriver, RunError, RunReport, SiteState};
use crate::reload::ReloadSignaler;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Run even when nothing changed upstream or locally
    pub force: bool,
    /// Only compute the plan
    pub dry_run: bool,
    /// Write the status snapshot and push it
    pub push: bool,
}

/// What an update ended up doing.
#[derive(Debug)]
pub enum UpdateKind {
    /// No new commit and nothing to reconcile; the run was skipped
    UpToDate(Plan),
    DryRun(Plan),
    Applied(RunReport),
}

#[derive(Debug)]
pub struct UpdateResult {
    /// `None` when the pull failed
    pub pull: Option<PullOutcome>,
    pub kind: UpdateKind,
    /// Sync problems; the run used the local clone
    pub warnings: Vec<String>,
    /// Whether a status commit was pushed
    pub pushed: bool,
}

/// Everything `update` needs, borrowed from the caller.
pub struct UpdateSession<'a, G, C, R> {
    pub store: &'a ConfigStore,
    pub git: &'a G,
    pub driver: &'a mut ReconciliationDriver<C, R>,
    /// Snapshot written into the config repository before pushing
    pub status_file: PathBuf,
}

impl<G: GitClient, C: CertClient, R: ReloadSignaler> UpdateSession<'_, G, C, R> {
    pub fn run(self, options: UpdateOptions) -> Result<UpdateResult> {
        let mut warnings = Vec::new();

        let pull = match self.git.pull() {
            Ok(outcome) => {
                tracing::info!(
                    branch = %outcome.branch,
                    previous = outcome.previous.as_deref().unwrap_or("none"),
                    current = %outcome.current,
                    "Pulled config repository"
                );
                Some(outcome)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Pull failed, using the local copy");
                warnings.push(format!("pull failed, using the local copy: {e}"));
                None
            }
        };

        let config = self.store.load()?;
        self.driver.set_contact(config.acme.clone());

        if options.dry_run {
            let plan = self.driver.plan(&config.sites)?;
            return Ok(UpdateResult {
                pull,
                kind: UpdateKind::DryRun(plan),
                warnings,
                pushed: false,
            });
        }

        if !options.force && !pull.as_ref().is_some_and(PullOutcome::changed) {
            let plan = self.driver.plan(&config.sites)?;
            if !plan.needs_work() {
                tracing::info!("No new commits and nothing to reconcile");
                return Ok(UpdateResult {
                    pull,
                    kind: UpdateKind::UpToDate(plan),
                    warnings,
                    pushed: false,
                });
            }
        }

        let mut report = match self.driver.run(&config.sites) {
            Ok(report) => report,
            Err(RunError::Reload { error, mut report }) => {
                report.warnings.extend(warnings);
                return Err(RunError::Reload { error, report }.into());
            }
            Err(e) => return Err(e.into()),
        };

        let mut pushed = false;
        if options.push {
            match publish_status(self.git, &self.status_file, &report) {
                Ok(committed) => pushed = committed,
                Err(e) => {
                    tracing::warn!(error = %e, "Push failed");
                    warnings.push(format!("push failed: {e}"));
                }
            }
        }

        report.warnings.extend(warnings.iter().cloned());
        Ok(UpdateResult {
            pull,
            kind: UpdateKind::Applied(report),
            warnings,
            pushed,
        })
    }
}

#[derive(Debug, Serialize)]
struct StatusSnapshot<'a> {
    sites: Vec<SiteStatus<'a>>,
}

#[derive(Debug, Serialize)]
struct SiteStatus<'a> {
    hostname: &'a str,
    state: SiteState,
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate: Option<CertStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn publish_status<G: GitClient>(git: &G, path: &Path, report: &RunReport) -> Result<bool> {
    let snapshot = StatusSnapshot {
        sites: report
            .sites
            .iter()
            .map(|site| SiteStatus {
                hostname: &site.hostname,
                state: site.state,
                certificate: site.certificate.as_ref().map(|c| c.status),
                expires_at: site.certificate.as_ref().and_then(|c| c.expires_at),
                error: site.error.as_deref(),
            })
            .collect(),
    };
    DocumentStore::new().save(path, &snapshot)?;
    Ok(git.push(&[path.to_path_buf()])?)
}
