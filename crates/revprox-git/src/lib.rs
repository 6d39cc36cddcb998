//! Config repository synchronisation for RevProx
//!
//! The site file lives in a private Git repository. Before a run the local
//! clone is brought up to date with its remote; afterwards generated
//! artifacts can be committed and pushed back.

pub mod client;
pub mod error;
pub mod memory;
pub mod remote;
pub mod repository;

pub use client::{GitClient, PullOutcome};
pub use error::{Error, Result, SyncError};
pub use memory::InMemoryGitClient;
pub use remote::{Credentials, default_username, validate_remote_url};
pub use repository::{Git2Client, clone_with_credentials};
