//! Validation of raw site entries
//!
//! Every entry is checked and every problem recorded, so one pass over the
//! error output is enough to fix the file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{EntryIssue, ValidationError};
use crate::site::{AcmeContact, DEFAULT_BACKEND_HOST, RawSite, RawSiteFile, SiteConfig, SiteEntry};

static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*$")
        .expect("hostname pattern is valid")
});

static BACKEND_HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.\-_:\[\]]+$").expect("backend host pattern is valid")
});

/// Check a hostname for use as an NGINX `server_name` and certificate subject.
///
/// Returns the problem description, or `None` if the name is acceptable.
pub fn hostname_problem(hostname: &str) -> Option<String> {
    if hostname.trim().is_empty() {
        return Some("hostname must not be empty".into());
    }
    if hostname.len() > 253 {
        return Some("hostname is longer than 253 characters".into());
    }
    if !HOSTNAME_RE.is_match(&hostname.to_ascii_lowercase()) {
        return Some(format!("hostname '{hostname}' is not a valid DNS name"));
    }
    None
}

fn parse_port(value: Option<&serde_yaml::Value>) -> Result<u16, String> {
    let Some(value) = value else {
        return Err("backend_port is required".into());
    };
    let port = match value {
        serde_yaml::Value::Number(n) => n.as_i64(),
        serde_yaml::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match port {
        Some(p) if (1..=65535).contains(&p) => Ok(p as u16),
        Some(p) => Err(format!("backend_port {p} is outside 1-65535")),
        None => Err(format!(
            "backend_port must be an integer, got {}",
            describe(value)
        )),
    }
}

fn parse_flag(name: &str, value: Option<&serde_yaml::Value>) -> Result<bool, String> {
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(false),
        Some(serde_yaml::Value::Bool(b)) => Ok(*b),
        Some(other) => Err(format!("{name} must be true or false, got {}", describe(other))),
    }
}

fn describe(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "an unreadable value".into())
}

fn validate_entry(raw: &RawSite) -> Result<SiteEntry, Vec<String>> {
    let mut problems = Vec::new();

    let hostname = raw.hostname.as_deref().unwrap_or("").trim().to_ascii_lowercase();
    if let Some(problem) = hostname_problem(&hostname) {
        problems.push(problem);
    }

    let backend_host = raw
        .backend_host
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_BACKEND_HOST)
        .to_string();
    if !BACKEND_HOST_RE.is_match(&backend_host) {
        problems.push(format!("backend_host '{backend_host}' contains invalid characters"));
    }

    let port = parse_port(raw.backend_port.as_ref()).map_err(|p| problems.push(p));
    let ssl = parse_flag("ssl", raw.ssl.as_ref()).map_err(|p| problems.push(p));
    let force_ssl = parse_flag("force_ssl", raw.force_ssl.as_ref()).map_err(|p| problems.push(p));

    match (port, ssl, force_ssl) {
        (Ok(backend_port), Ok(enable_ssl), Ok(force_ssl)) if problems.is_empty() => {
            if force_ssl && !enable_ssl {
                tracing::warn!(hostname = %hostname, "force_ssl has no effect without ssl: true");
            }
            Ok(SiteEntry {
                hostname,
                backend_host,
                backend_port,
                enable_ssl,
                force_ssl: force_ssl && enable_ssl,
            })
        }
        _ => Err(problems),
    }
}

/// Validate a parsed site file, collecting every invalid entry.
pub(crate) fn validate(path: &Path, raw: RawSiteFile) -> Result<SiteConfig, ValidationError> {
    let mut issues = Vec::new();
    let mut sites = Vec::with_capacity(raw.sites.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (index, entry) in raw.sites.iter().enumerate() {
        let hostname = entry.hostname.clone().filter(|h| !h.trim().is_empty());
        match validate_entry(entry) {
            Ok(site) => {
                if let Some(first) = seen.get(&site.hostname) {
                    issues.push(EntryIssue {
                        index,
                        hostname,
                        problems: vec![format!(
                            "duplicate hostname, already defined by entry #{}",
                            first + 1
                        )],
                    });
                    continue;
                }
                seen.insert(site.hostname.clone(), index);
                sites.push(site);
            }
            Err(problems) => issues.push(EntryIssue {
                index,
                hostname,
                problems,
            }),
        }
    }

    if !issues.is_empty() {
        return Err(ValidationError {
            path: path.to_path_buf(),
            issues,
        });
    }

    Ok(SiteConfig {
        acme: raw.acme.unwrap_or_else(AcmeContact::default),
        sites,
    })
}
