//! `revprox status`: vhost and certificate state per site

use colored::Colorize;
use serde::Serialize;

use revprox_core::{CertStatus, CertificateRecord};

use super::update::describe_certificate;
use crate::context::StorageContext;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct SiteStatus {
    hostname: String,
    backend: String,
    ssl: bool,
    force_ssl: bool,
    vhost_present: bool,
    certificate: Option<CertificateRecord>,
}

/// Print the status of every site in the local site file.
///
/// Reads the local clone only; nothing is pulled or written.
pub fn run_status(ctx: &StorageContext, json: bool) -> Result<()> {
    let config = ctx.config_store().load()?;
    let resources = ctx.resources();
    let certs = ctx.certificate_manager();

    let statuses: Vec<SiteStatus> = config
        .sites
        .iter()
        .map(|site| SiteStatus {
            hostname: site.hostname.clone(),
            backend: site.backend_url(),
            ssl: site.enable_ssl,
            force_ssl: site.force_ssl,
            vhost_present: resources.vhost_path(&site.hostname).is_file(),
            certificate: site.enable_ssl.then(|| certs.status(&site.hostname)),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("{} {}", "Storage:".bold(), ctx.layout.root().display());
    println!("{} {}", "Sites:".bold(), statuses.len());
    println!();

    for status in &statuses {
        let marker = match status.certificate.as_ref().map(|c| c.status) {
            None | Some(CertStatus::Valid) if status.vhost_present => "OK".green().bold(),
            Some(CertStatus::ExpiringSoon) => "RENEW".yellow().bold(),
            _ => "TODO".red().bold(),
        };
        let detail = match &status.certificate {
            Some(cert) => describe_certificate(cert),
            None => "http only".dimmed().to_string(),
        };
        let vhost = if status.vhost_present { "" } else { " (no vhost yet)" };
        println!(
            "   {marker:<5} {} -> {}{}  {detail}",
            status.hostname.bold(),
            status.backend.cyan(),
            vhost.yellow()
        );
    }
    Ok(())
}
