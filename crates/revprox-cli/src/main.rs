//! RevProx CLI
//!
//! Keeps an NGINX reverse proxy in line with a site file kept in Git and
//! obtains certificates through an external ACME client.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::SetupArgs;
use context::StorageContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init();
        if installed.is_ok() {
            tracing::debug!("Verbose mode enabled");
        }
    }

    let storage = context::storage_path(cli.storage.as_deref())?;

    match cli.command {
        Commands::Setup { repo_url, username, yes } => commands::run_setup(
            SetupArgs {
                storage: cli.storage.as_ref().map(|_| storage.clone()),
                repo_url,
                username,
                yes,
            },
            &storage,
        ),
        Commands::Update { force, dry_run, no_push } => {
            let ctx = StorageContext::open(&storage)?;
            commands::run_update(&ctx, force, dry_run, no_push)
        }
        Commands::Status { json } => {
            let ctx = StorageContext::open(&storage)?;
            commands::run_status(&ctx, json)
        }
    }
}
