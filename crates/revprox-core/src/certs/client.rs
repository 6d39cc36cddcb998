//! ACME client abstraction

use std::path::PathBuf;
use std::time::Duration;

use revprox_meta::Settings;

use super::CertError;
use crate::process::{self, ProcessError};

/// Everything the ACME client needs to issue or renew one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub hostname: String,
    pub email: Option<String>,
    pub staging: bool,
    /// Directory served at `/.well-known/acme-challenge/`
    pub webroot: PathBuf,
    /// ACME client state directory; certificates land in `live/<hostname>/`
    pub config_dir: PathBuf,
}

/// Issues certificates. Success means the client reported success; the
/// caller re-reads the certificate to confirm it.
pub trait CertClient {
    fn issue(&self, request: &IssueRequest) -> Result<(), CertError>;
}

/// Runs an external ACME client built from a command template.
#[derive(Debug, Clone)]
pub struct AcmeCommandClient {
    command: Vec<String>,
    timeout: Duration,
}

const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "ratelimited",
    "too many certificates",
    "too many failed authorizations",
];

const NETWORK_MARKERS: &[&str] = &[
    "connection refused",
    "connection reset",
    "timed out",
    "timeout",
    "could not resolve",
    "name resolution",
    "network is unreachable",
    "temporary failure",
];

impl AcmeCommandClient {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.acme.command.clone(), settings.command_timeout())
    }

    /// Expand placeholders; arguments that expand to nothing are dropped.
    pub fn expand(&self, request: &IssueRequest) -> Result<Vec<String>, CertError> {
        let needs_email = self.command.iter().any(|arg| arg.contains("{email}"));
        let email = match (&request.email, needs_email) {
            (Some(email), _) => email.as_str(),
            (None, false) => "",
            (None, true) => {
                return Err(CertError::Client {
                    hostname: request.hostname.clone(),
                    message: "no ACME contact email configured (set acme.email in the site file)"
                        .into(),
                });
            }
        };
        let webroot = request.webroot.display().to_string();
        let config_dir = request.config_dir.display().to_string();
        let staging = if request.staging { "--staging" } else { "" };

        Ok(self
            .command
            .iter()
            .map(|arg| {
                arg.replace("{hostname}", &request.hostname)
                    .replace("{email}", email)
                    .replace("{webroot}", &webroot)
                    .replace("{config_dir}", &config_dir)
                    .replace("{staging}", staging)
            })
            .filter(|arg| !arg.is_empty())
            .collect())
    }
}

impl CertClient for AcmeCommandClient {
    fn issue(&self, request: &IssueRequest) -> Result<(), CertError> {
        let argv = self.expand(request)?;
        let hostname = &request.hostname;

        tracing::info!(hostname = %hostname, staging = request.staging, "Requesting certificate");
        let output = process::run(&argv, self.timeout).map_err(|e| match e {
            ProcessError::TimedOut { .. } => CertError::NetworkFailure {
                hostname: hostname.clone(),
                message: e.to_string(),
            },
            other => CertError::Client {
                hostname: hostname.clone(),
                message: other.to_string(),
            },
        })?;

        if output.success() {
            tracing::debug!(hostname = %hostname, "ACME client finished");
            return Ok(());
        }
        let error = classify_failure(hostname, &output.combined());
        tracing::warn!(hostname = %hostname, kind = error.kind(), code = ?output.code, "ACME client failed");
        Err(error)
    }
}

/// Map ACME client output to a [`CertError`] variant.
pub(crate) fn classify_failure(hostname: &str, output: &str) -> CertError {
    let lower = output.to_lowercase();
    let message = last_lines(output, 5);
    let hostname = hostname.to_string();

    if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
        CertError::RateLimited { hostname, message }
    } else if NETWORK_MARKERS.iter().any(|m| lower.contains(m)) {
        CertError::NetworkFailure { hostname, message }
    } else {
        CertError::ValidationFailure { hostname, message }
    }
}

fn last_lines(output: &str, count: usize) -> String {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    match lines[start..].join(" | ") {
        empty if empty.is_empty() => "no output".to_string(),
        joined => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request(email: Option<&str>, staging: bool) -> IssueRequest {
        IssueRequest {
            hostname: "app.example.com".into(),
            email: email.map(String::from),
            staging,
            webroot: PathBuf::from("/srv/webroot"),
            config_dir: PathBuf::from("/srv/certs"),
        }
    }

    fn client(args: &[&str]) -> AcmeCommandClient {
        AcmeCommandClient::new(args.iter().map(|s| s.to_string()).collect(), Duration::from_secs(5))
    }

    #[test]
    fn expands_placeholders_and_drops_empty_args() {
        let client = client(&["acme", "-d", "{hostname}", "--email", "{email}", "--root={webroot}", "{staging}"]);
        let argv = client.expand(&request(Some("ops@example.com"), false)).unwrap();
        assert_eq!(
            argv,
            vec!["acme", "-d", "app.example.com", "--email", "ops@example.com", "--root=/srv/webroot"]
        );
    }

    #[test]
    fn staging_flag_is_added() {
        let client = client(&["acme", "{staging}"]);
        let argv = client.expand(&request(None, true)).unwrap();
        assert_eq!(argv, vec!["acme", "--staging"]);
    }

    #[test]
    fn missing_email_is_client_error() {
        let client = client(&["acme", "--email", "{email}"]);
        let err = client.expand(&request(None, false)).unwrap_err();
        assert_eq!(err.kind(), "client");
    }

    #[rstest]
    #[case("Error: too many certificates already issued", "rate_limited")]
    #[case("urn:ietf:params:acme:error:rateLimited", "rate_limited")]
    #[case("Connection refused while contacting acme-v02", "network_failure")]
    #[case("Temporary failure in name resolution", "network_failure")]
    #[case("Challenge failed for domain app.example.com", "validation_failure")]
    #[case("", "validation_failure")]
    fn classifies_output(#[case] output: &str, #[case] kind: &str) {
        assert_eq!(classify_failure("app.example.com", output).kind(), kind);
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_classified() {
        let client = client(&["sh", "-c", "echo 'could not resolve host' >&2; exit 1"]);
        let err = client.issue(&request(None, false)).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn missing_binary_is_client_error() {
        let client = client(&["revprox-no-such-acme-client"]);
        let err = client.issue(&request(None, false)).unwrap_err();
        assert_eq!(err.kind(), "client");
    }
}
