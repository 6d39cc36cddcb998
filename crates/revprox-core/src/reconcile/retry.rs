//! Retry policy for certificate issuance

use std::cell::Cell;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use revprox_meta::AcmeSettings;

use crate::certs::CertError;

/// Exponential backoff applied to network failures of the ACME client.
///
/// Other certificate errors are returned after the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&AcmeSettings::default())
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, initial_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            initial_delay,
            max_delay: Duration::from_secs(300),
        }
    }

    pub fn from_settings(settings: &AcmeSettings) -> Self {
        Self::new(settings.retry_attempts, settings.retry_initial_delay())
    }

    /// A single attempt.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts
    /// run out. Returns the result and the number of attempts made.
    pub fn run<T>(
        &self,
        hostname: &str,
        mut operation: impl FnMut() -> Result<T, CertError>,
    ) -> (Result<T, CertError>, u32) {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_randomization_factor(0.0)
            .with_multiplier(2.0)
            .with_max_interval(self.max_delay)
            .with_max_elapsed_time(None)
            .build();

        let attempts = Cell::new(0u32);
        let result = backoff::retry_notify(
            backoff,
            || {
                attempts.set(attempts.get() + 1);
                operation().map_err(|e| {
                    if e.is_transient() && attempts.get() < self.attempts {
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            },
            |error: CertError, wait: Duration| {
                tracing::warn!(
                    hostname = %hostname,
                    attempt = attempts.get(),
                    wait_ms = wait.as_millis() as u64,
                    error = %error,
                    "Certificate request failed, retrying"
                );
            },
        );

        let result = result.map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        });
        (result, attempts.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> CertError {
        CertError::NetworkFailure {
            hostname: "a.example.com".into(),
            message: "connection refused".into(),
        }
    }

    #[test]
    fn retries_network_failures_until_success() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut calls = 0;
        let (result, attempts) = policy.run("a.example.com", || {
            calls += 1;
            if calls < 3 { Err(network()) } else { Ok(calls) }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn gives_up_after_attempts() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let (result, attempts) = policy.run("a.example.com", || Err::<(), _>(network()));
        assert!(result.unwrap_err().is_transient());
        assert_eq!(attempts, 2);
    }

    #[test]
    fn validation_failures_are_not_retried() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let (result, attempts) = policy.run("a.example.com", || {
            Err::<(), _>(CertError::ValidationFailure {
                hostname: "a.example.com".into(),
                message: "unauthorized".into(),
            })
        });
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn none_is_single_attempt() {
        assert_eq!(RetryPolicy::none().attempts, 1);
    }
}
