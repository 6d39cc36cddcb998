//! Filesystem abstraction for RevProx
//!
//! Provides the storage layout and safe I/O operations shared by the
//! reconciliation crates.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;

pub use config::DocumentStore;
pub use constants::StoragePath;
pub use error::{Error, Result};
pub use layout::StorageLayout;
