//! Making NGINX pick up new configuration

use std::cell::Cell;
use std::time::Duration;

use revprox_meta::Settings;

use crate::process::{self, ProcessError};

/// Reload failures are fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReloadError {
    /// `nginx -t` rejected the generated configuration
    #[error("NGINX rejected the configuration: {output}; fix it and reload NGINX manually")]
    ConfigInvalid { output: String },

    /// The reload command ran but failed
    #[error("NGINX reload failed: {output}; fix it and reload NGINX manually")]
    SignalFailed { output: String },

    /// A command could not be run at all
    #[error("Could not run '{command}': {message}; fix it and reload NGINX manually")]
    Command { command: String, message: String },
}

/// Tells the proxy to load the configuration on disk.
pub trait ReloadSignaler {
    fn reload(&self) -> Result<(), ReloadError>;
}

/// Validates with the configured test command, then reloads.
#[derive(Debug, Clone)]
pub struct NginxReloader {
    test_command: Vec<String>,
    reload_command: Vec<String>,
    timeout: Duration,
}

impl NginxReloader {
    pub fn new(test_command: Vec<String>, reload_command: Vec<String>, timeout: Duration) -> Self {
        Self {
            test_command,
            reload_command,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.nginx.test_command.clone(),
            settings.nginx.reload_command.clone(),
            settings.command_timeout(),
        )
    }

    fn run(&self, argv: &[String]) -> Result<process::CommandOutput, ReloadError> {
        process::run(argv, self.timeout).map_err(|e: ProcessError| ReloadError::Command {
            command: argv.join(" "),
            message: e.to_string(),
        })
    }
}

impl ReloadSignaler for NginxReloader {
    fn reload(&self) -> Result<(), ReloadError> {
        if !self.test_command.is_empty() {
            let output = self.run(&self.test_command)?;
            if !output.success() {
                return Err(ReloadError::ConfigInvalid {
                    output: output.combined(),
                });
            }
        }

        let output = self.run(&self.reload_command)?;
        if !output.success() {
            return Err(ReloadError::SignalFailed {
                output: output.combined(),
            });
        }
        tracing::info!("NGINX reloaded");
        Ok(())
    }
}

/// Counts reloads instead of signaling a process.
#[derive(Debug, Default)]
pub struct InMemoryReloader {
    reloads: Cell<usize>,
    failure: Option<ReloadError>,
}

impl InMemoryReloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: ReloadError) -> Self {
        Self {
            reloads: Cell::new(0),
            failure: Some(error),
        }
    }

    /// Number of reload attempts, failed ones included.
    pub fn reload_count(&self) -> usize {
        self.reloads.get()
    }
}

impl ReloadSignaler for InMemoryReloader {
    fn reload(&self) -> Result<(), ReloadError> {
        self.reloads.set(self.reloads.get() + 1);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
