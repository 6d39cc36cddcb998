//! `revprox setup`: first-run wizard
//!
//! Prepares the storage directory, clones the config repository, stores
//! the settings and runs a forced update.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

use revprox_fs::{StorageLayout, io};
use revprox_git::{Credentials, clone_with_credentials, default_username, validate_remote_url};
use revprox_meta::{GIT_TOKEN_ENV, Settings};

use super::update::run_update;
use crate::context::StorageContext;
use crate::error::{CliError, Result};
use crate::interactive;

/// Answers given as flags; anything missing is asked for unless `yes`.
#[derive(Debug, Clone, Default)]
pub struct SetupArgs {
    pub storage: Option<PathBuf>,
    pub repo_url: Option<String>,
    pub username: Option<String>,
    pub yes: bool,
}

pub fn run_setup(args: SetupArgs, default_storage: &Path) -> Result<()> {
    let storage = match (&args.storage, args.yes) {
        (Some(path), _) => path.clone(),
        (None, true) => default_storage.to_path_buf(),
        (None, false) => interactive::ask_storage(default_storage)?
            .ok_or_else(|| CliError::user("Setup aborted."))?,
    };
    io::ensure_dir(&storage)?;
    let layout = StorageLayout::new(&storage);
    layout.validate()?;
    println!("{} Storage directory {}", "[+]".cyan(), storage.display().to_string().magenta());

    let mut settings = Settings::load(&layout)?;

    if layout.has_config_repo() {
        println!("{} Config repository already cloned, keeping it", "[+]".cyan());
    } else {
        let credentials = clone_config_repo(&layout, &args)?;
        settings.git.username = Some(credentials.username);
        if std::env::var(GIT_TOKEN_ENV).is_err() {
            settings.git.token = Some(credentials.token);
        }
    }

    if !layout.site_file().is_file() {
        return Err(CliError::user(format!(
            "{} not found in the config repository. Add it and run 'revprox update --force'.",
            revprox_fs::StoragePath::SiteFile
        )));
    }

    settings.save(&layout)?;
    layout.ensure_output_dirs()?;
    let ctx = StorageContext::open(&storage)?;
    let resources = ctx.resources();
    resources.ensure_dirs()?;

    println!("{} Running update (forced)...", "[+]".cyan());
    run_update(&ctx, true, false, false)?;

    println!();
    println!(
        "Add {} to the http block of nginx.conf if it is not there yet,",
        format!("include {};", resources.main_include.display()).cyan()
    );
    println!(
        "disable any other {} server on port 80 (it answers ACME challenges),",
        "default_server".cyan()
    );
    println!("and schedule {} (e.g. daily from cron) to renew certificates.", "revprox update".cyan());
    Ok(())
}

fn clone_config_repo(layout: &StorageLayout, args: &SetupArgs) -> Result<Credentials> {
    let missing = |what: &str| CliError::user(format!("{what} is required with --yes"));

    let url = match &args.repo_url {
        Some(url) => url.trim().to_string(),
        None if args.yes => return Err(missing("--repo-url")),
        None => interactive::ask_repo_url()?,
    };
    validate_remote_url(&url)?;

    let username = match args.username.clone().or_else(|| args.yes.then(|| default_username(&url)).flatten()) {
        Some(username) => username,
        None if args.yes => return Err(missing("--username")),
        None => interactive::ask_username(&url)?,
    };

    let token = match std::env::var(GIT_TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
        Some(token) => token,
        None if args.yes => return Err(missing(GIT_TOKEN_ENV)),
        None => interactive::ask_token()?,
    };

    let dest = layout.config_repo();
    if dest.exists() {
        let replace = args.yes
            || interactive::confirm(
                &format!("{} exists but is not a git clone. Delete it?", dest.display()),
                false,
            )?;
        if !replace {
            return Err(CliError::user("Setup aborted."));
        }
        println!("{} Deleting {}", "[+]".cyan(), dest.display().to_string().magenta());
        fs::remove_dir_all(&dest)?;
    }

    println!(
        "{} Cloning {} into {}",
        "[+]".cyan(),
        url.cyan(),
        dest.display().to_string().magenta()
    );
    let credentials = Credentials::new(username, token);
    clone_with_credentials(&url, &dest, Some(&credentials))?;
    Ok(credentials)
}
