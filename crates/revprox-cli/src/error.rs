//! Error types for revprox-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from revprox-core
    #[error(transparent)]
    Core(#[from] revprox_core::Error),

    /// Error from revprox-fs
    #[error(transparent)]
    Fs(#[from] revprox_fs::Error),

    /// Error from revprox-meta
    #[error(transparent)]
    Meta(#[from] revprox_meta::Error),

    /// Error from revprox-git
    #[error(transparent)]
    Git(#[from] revprox_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
