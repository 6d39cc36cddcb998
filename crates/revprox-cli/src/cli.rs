//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// RevProx - NGINX reverse proxy configuration with automatic certificates
#[derive(Parser, Debug)]
#[command(name = "revprox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Storage directory (defaults to ~/.revprox)
    #[arg(short, long, global = true, env = "REVPROX_STORAGE")]
    pub storage: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// First-run setup: clone the config repository and run a forced update
    ///
    /// Prompts for anything not given as a flag. The access token is read
    /// from REVPROX_GIT_TOKEN when set.
    ///
    /// Examples:
    ///   revprox setup
    ///   revprox --storage /srv/revprox setup --repo-url https://git.example.com/ops/proxy.git
    Setup {
        /// HTTP(S) URL of the config repository
        #[arg(long)]
        repo_url: Option<String>,

        /// HTTP username for the config repository
        #[arg(long)]
        username: Option<String>,

        /// Do not ask questions; fail if something is missing
        #[arg(short, long)]
        yes: bool,
    },

    /// Pull the config repository, reconcile sites and renew certificates
    Update {
        /// Run even when nothing changed
        #[arg(short, long)]
        force: bool,

        /// Show what would change without writing, issuing or reloading
        #[arg(long)]
        dry_run: bool,

        /// Do not push the status snapshot even if pushing is enabled
        #[arg(long)]
        no_push: bool,
    },

    /// Show each site's vhost and certificate state
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_update_flags() {
        let cli = Cli::parse_from(["revprox", "--storage", "/srv/revprox", "update", "--force", "--no-push"]);
        assert_eq!(cli.storage, Some(PathBuf::from("/srv/revprox")));
        assert_eq!(
            cli.command,
            Commands::Update {
                force: true,
                dry_run: false,
                no_push: true
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["revprox", "status", "--json", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.command, Commands::Status { json: true });
    }
}
