/// Failure to obtain a certificate for one site.
///
/// Never fatal to a run: the site is marked failed and the others continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertError {
    /// The CA could not be reached; worth retrying
    #[error("Network failure while requesting a certificate for {hostname}: {message}")]
    NetworkFailure { hostname: String, message: String },

    /// The CA could not verify control of the domain
    #[error("Domain validation failed for {hostname}: {message}")]
    ValidationFailure { hostname: String, message: String },

    #[error("Rate limited by the certificate authority for {hostname}: {message}")]
    RateLimited { hostname: String, message: String },

    /// The ACME client could not be run as configured
    #[error("ACME client error for {hostname}: {message}")]
    Client { hostname: String, message: String },
}

impl CertError {
    pub fn hostname(&self) -> &str {
        match self {
            Self::NetworkFailure { hostname, .. }
            | Self::ValidationFailure { hostname, .. }
            | Self::RateLimited { hostname, .. }
            | Self::Client { hostname, .. } => hostname,
        }
    }

    /// Short machine-readable kind for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkFailure { .. } => "network_failure",
            Self::ValidationFailure { .. } => "validation_failure",
            Self::RateLimited { .. } => "rate_limited",
            Self::Client { .. } => "client",
        }
    }

    /// Only network failures are retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. })
    }
}
