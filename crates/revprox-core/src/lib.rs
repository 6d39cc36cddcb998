//! Core reconciliation layer for RevProx
//!
//! This crate turns validated site entries into running NGINX configuration:
//!
//! - **TemplateRenderer** ([`template`]): site entry to vhost text, pure and idempotent
//! - **CertificateManager** ([`certs`]): certificate state and issuance via an external ACME client
//! - **ReconciliationDriver** ([`reconcile`]): per-site state machine and one batched reload
//!
//! # Architecture
//!
//! ```text
//!                  revprox-cli
//!                       |
//!                 revprox-core
//!                       |
//!      +----------------+---------------+
//!      |                |               |
//! revprox-fs      revprox-meta     revprox-git
//! ```
//!
//! External programs sit behind [`CertClient`], [`ReloadSignaler`] and
//! [`revprox_git::GitClient`], each with a real and an in-memory implementation.

pub mod certs;
pub mod error;
pub mod process;
pub mod reconcile;
pub mod reload;
pub mod resources;
pub mod session;
pub mod template;

pub use certs::{
    AcmeCommandClient, CertClient, CertError, CertStatus, CertificateManager, CertificateRecord,
    InMemoryCertClient, IssueRequest,
};
pub use error::{Error, Result};
pub use reconcile::{
    Plan, PlannedSite, ReconciliationDriver, RetryPolicy, RunError, RunReport, SiteOutcome,
    SiteState,
};
pub use reload::{InMemoryReloader, NginxReloader, ReloadError, ReloadSignaler};
pub use resources::{CertPaths, ProxyResources};
pub use session::{UpdateKind, UpdateOptions, UpdateResult, UpdateSession};
pub use template::{GENERATED_MARKER, render, render_main};
