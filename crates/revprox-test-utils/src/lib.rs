//! Shared test utilities for the RevProx workspace.
//!
//! It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`] : bare remotes holding a site file, and clones of them
//! - [`certs`] : self-signed certificates with a chosen expiry
//! - [`storage`] : [`TestStorage`] builder for a complete storage directory

pub mod certs;
pub mod git;
pub mod storage;

pub use storage::TestStorage;
