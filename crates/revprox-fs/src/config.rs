//! Format-agnostic document loading and saving

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result, io};

/// Format-agnostic document store.
///
/// Detects the format from the file extension (`.toml`, `.json`,
/// `.yaml`/`.yml`) and handles (de)serialization transparently.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentStore;

impl DocumentStore {
    pub fn new() -> Self {
        Self
    }

    /// Load a document from a file.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = io::read_text(path)?;
        self.parse(path, &content)
    }

    /// Load a document, falling back to `T::default()` when the file is absent.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        match io::read_text_optional(path)? {
            Some(content) => self.parse(path, &content),
            None => {
                tracing::debug!(path = %path.display(), "Document not found, using defaults");
                Ok(T::default())
            }
        }
    }

    /// Parse already-read content using the format implied by `path`.
    pub fn parse<T: DeserializeOwned>(&self, path: &Path, content: &str) -> Result<T> {
        let parse_err = |format: &str, message: String| Error::ConfigParse {
            path: path.to_path_buf(),
            format: format.into(),
            message,
        };

        match extension_of(path).as_str() {
            "toml" => toml::from_str(content).map_err(|e| parse_err("TOML", e.to_string())),
            "json" => serde_json::from_str(content).map_err(|e| parse_err("JSON", e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(content).map_err(|e| parse_err("YAML", e.to_string()))
            }
            other => Err(Error::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    /// Save a document atomically; the format is chosen from the extension.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let ser_err = |format: &str, message: String| Error::ConfigSerialize {
            path: path.to_path_buf(),
            format: format.into(),
            message,
        };

        let content = match extension_of(path).as_str() {
            "toml" => toml::to_string_pretty(value).map_err(|e| ser_err("TOML", e.to_string()))?,
            "json" => {
                serde_json::to_string_pretty(value).map_err(|e| ser_err("JSON", e.to_string()))?
            }
            "yaml" | "yml" => {
                serde_yaml::to_string(value).map_err(|e| ser_err("YAML", e.to_string()))?
            }
            other => {
                return Err(Error::UnsupportedFormat {
                    extension: other.to_string(),
                });
            }
        };

        io::write_atomic(path, content.as_bytes())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
