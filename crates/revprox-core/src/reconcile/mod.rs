//! Reconciliation of NGINX vhosts and certificates
//!
//! Each site moves through [`SiteState`]:
//!
//! ```text
//! Pending -> ConfigWritten -> Ready                       (plain HTTP)
//!                          -> CertChecked -> Ready        (certificate valid)
//!                                         -> CertIssuing -> Ready | Failed
//! ```

mod driver;
mod plan;
mod report;
mod retry;

pub use driver::{ReconciliationDriver, RunError};
pub use plan::{Plan, PlannedSite};
pub use report::{RunReport, SiteOutcome, SiteState};
pub use retry::RetryPolicy;
