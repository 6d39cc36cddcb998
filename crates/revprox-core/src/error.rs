//! Error types for revprox-core

/// Result type for revprox-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole update.
///
/// Per-site problems are not errors at this level; they end up in the
/// [`crate::RunReport`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem error from revprox-fs
    #[error(transparent)]
    Fs(#[from] revprox_fs::Error),

    /// Site file or settings error from revprox-meta
    #[error(transparent)]
    Meta(#[from] revprox_meta::Error),

    /// Repository error from revprox-git
    #[error(transparent)]
    Git(#[from] revprox_git::Error),

    /// The reconciliation run could not complete
    #[error(transparent)]
    Run(#[from] crate::reconcile::RunError),
}
