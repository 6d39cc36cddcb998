//! `revprox update`: pull, reconcile, push

use chrono::Utc;
use colored::Colorize;

use revprox_core::{
    CertificateRecord, RunError, RunReport, SiteState, UpdateKind, UpdateOptions, UpdateSession,
};

use crate::context::StorageContext;
use crate::error::{CliError, Result};

/// Run an update against an opened storage directory.
///
/// Prints the per-site summary whenever sites were processed, and fails
/// when any site failed.
pub fn run_update(ctx: &StorageContext, force: bool, dry_run: bool, no_push: bool) -> Result<()> {
    let options = UpdateOptions {
        force,
        dry_run,
        push: ctx.settings.git.push && !no_push,
    };

    println!("{} Updating from {}", "=>".blue().bold(), ctx.layout.config_repo().display().to_string().cyan());

    let store = ctx.config_store();
    let git = ctx.git_client();
    let mut driver = ctx.driver();
    let session = UpdateSession {
        store: &store,
        git: &git,
        driver: &mut driver,
        status_file: ctx.layout.status_file(),
    };

    let result = match session.run(options) {
        Ok(result) => result,
        Err(revprox_core::Error::Run(RunError::Reload { error, report })) => {
            print_report(&report);
            return Err(CliError::user(error.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(pull) = &result.pull {
        if pull.changed() {
            println!(
                "   {} {} {} -> {}",
                "pulled".green(),
                pull.branch.cyan(),
                short(pull.previous.as_deref().unwrap_or("none")),
                short(&pull.current)
            );
        } else {
            println!("   {} {} at {}", "unchanged".dimmed(), pull.branch.cyan(), short(&pull.current));
        }
    }

    match result.kind {
        UpdateKind::UpToDate(_) => {
            print_warnings(&result.warnings);
            println!("{} Nothing to do. Use {} to run anyway.", "OK".green().bold(), "--force".cyan());
            Ok(())
        }
        UpdateKind::DryRun(plan) => {
            print_warnings(&result.warnings);
            let actions = plan.actions();
            if actions.is_empty() {
                println!("{} Nothing would change.", "OK".green().bold());
            }
            for action in actions {
                println!("   {action}");
            }
            Ok(())
        }
        UpdateKind::Applied(report) => {
            print_report(&report);
            if result.pushed {
                println!("   {} status snapshot", "pushed".green());
            }
            let failed = report.failed().count();
            if failed > 0 {
                return Err(CliError::user(format!(
                    "{failed} site{} failed; see the summary above",
                    if failed == 1 { "" } else { "s" }
                )));
            }
            Ok(())
        }
    }
}

/// Per-site summary printed after every run.
pub fn print_report(report: &RunReport) {
    println!();
    println!("{} Site summary", "=>".blue().bold());
    if report.sites.is_empty() {
        println!("   {}", "no sites defined".dimmed());
    }
    for site in &report.sites {
        let state = match site.state {
            SiteState::Ready => "ready ".green().bold(),
            SiteState::Failed => "FAILED".red().bold(),
            other => other.as_str().yellow().bold(),
        };
        let detail = match (&site.error, &site.certificate) {
            (Some(error), _) => error.red().to_string(),
            (None, Some(cert)) => describe_certificate(cert),
            (None, None) => "http only".dimmed().to_string(),
        };
        let changed = if site.config_changed { " (vhost updated)".cyan().to_string() } else { String::new() };
        println!("   {state} {}{changed}  {detail}", site.hostname.bold());
    }
    for hostname in &report.removed {
        println!("   {} {}", "removed".yellow(), hostname);
    }
    print_warnings(&report.warnings);

    println!();
    let reload = if report.reloaded { "NGINX reloaded." } else { "NGINX not reloaded." };
    println!(
        "{} ready, {} failed. {reload}",
        report.ready_count().to_string().green(),
        report.failed().count().to_string().red()
    );
}

pub fn describe_certificate(cert: &CertificateRecord) -> String {
    match (cert.expires_at, cert.days_remaining(Utc::now())) {
        (Some(expires), Some(days)) => format!(
            "certificate {}, expires {} ({days} days)",
            cert.status,
            expires.format("%Y-%m-%d")
        ),
        _ => format!("certificate {}", cert.status),
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("   {} {}", "warning:".yellow().bold(), warning);
    }
}

fn short(commit: &str) -> String {
    commit.chars().take(8).collect()
}
