//! SHA-256 checksums for detecting drift between rendered and on-disk files.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::{Result, io};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content as `sha256:<hex>`.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the checksum of a file, or `None` if the file does not exist.
pub fn compute_file_checksum(path: &Path) -> Result<Option<String>> {
    Ok(io::read_text_optional(path)?.map(|content| compute_content_checksum(&content)))
}

/// Whether the file at `path` already holds exactly `content`.
pub fn file_matches(path: &Path, content: &str) -> Result<bool> {
    Ok(compute_file_checksum(path)?.as_deref() == Some(compute_content_checksum(content).as_str()))
}
