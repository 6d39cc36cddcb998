//! Command implementations for revprox-cli

pub mod setup;
pub mod status;
pub mod update;

pub use setup::{SetupArgs, run_setup};
pub use status::run_status;
pub use update::run_update;
