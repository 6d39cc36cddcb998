//! Interactive prompts for `revprox setup`
//!
//! Uses dialoguer for terminal-based questions.

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Password};
use revprox_git::{default_username, validate_remote_url};

use crate::error::Result;

/// Ask for the storage directory, offering to create it.
///
/// Returns `None` if the user declined to create a missing directory.
pub fn ask_storage(default: &Path) -> Result<Option<PathBuf>> {
    let path: String = Input::new()
        .with_prompt("Storage directory for RevProx")
        .default(default.display().to_string())
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            let path = Path::new(input.trim());
            if input.trim().is_empty() {
                Err("A directory is required".into())
            } else if path.exists() && !path.is_dir() {
                Err("Path exists but is not a directory".into())
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let path = PathBuf::from(path.trim());

    if !path.exists()
        && !Confirm::new()
            .with_prompt("Path does not exist yet. Create it?")
            .default(true)
            .interact()?
    {
        return Ok(None);
    }
    Ok(Some(path))
}

pub fn ask_repo_url() -> Result<String> {
    let url: String = Input::new()
        .with_prompt("Git config repository URL")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            validate_remote_url(input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?;
    Ok(url.trim().to_string())
}

pub fn ask_username(repo_url: &str) -> Result<String> {
    let mut input = Input::<String>::new()
        .with_prompt("HTTP username for the Git repository")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            if input.trim().is_empty() { Err("A username is required".into()) } else { Ok(()) }
        });
    if let Some(default) = default_username(repo_url) {
        input = input.default(default);
    }
    Ok(input.interact_text()?.trim().to_string())
}

pub fn ask_token() -> Result<String> {
    Ok(Password::new()
        .with_prompt("HTTP password or access token for the Git repository")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            if input.trim().is_empty() { Err("A token is required".into()) } else { Ok(()) }
        })
        .interact()?)
}

pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(default).interact()?)
}
