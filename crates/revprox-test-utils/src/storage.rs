//! [`TestStorage`] builder for RevProx storage directories.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::certs;

/// A temporary storage directory with the standard RevProx layout.
///
/// # Example
///
/// ```rust,no_run
/// use revprox_test_utils::TestStorage;
///
/// let storage = TestStorage::new();
/// storage.write_site_file("sites:\n  - hostname: app.example.com\n    backend_port: 8080\n");
/// storage.write_cert("app.example.com", 60);
/// storage.assert_file_exists("config/config.yml");
/// ```
pub struct TestStorage {
    temp_dir: TempDir,
}

impl Default for TestStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStorage {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `config/config.yml` (without making it a git repository).
    pub fn write_site_file(&self, content: &str) -> PathBuf {
        let dir = self.path("config");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yml");
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `revprox.toml`.
    pub fn write_settings(&self, content: &str) {
        fs::write(self.path("revprox.toml"), content).unwrap();
    }

    /// Place a certificate for `hostname` expiring in `days_left` days.
    pub fn write_cert(&self, hostname: &str, days_left: i64) -> PathBuf {
        certs::write_live_cert(&self.path("certs"), hostname, days_left)
    }

    /// Path of the generated vhost for `hostname`.
    pub fn vhost(&self, hostname: &str) -> PathBuf {
        self.path("nginx").join(format!("{hostname}.conf"))
    }

    /// Names of all files in the nginx output directory, sorted.
    pub fn nginx_files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.path("nginx")) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(full_path.exists(), "Expected file to exist: {}", full_path.display());
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(!full_path.exists(), "Expected file NOT to exist: {}", full_path.display());
    }

    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let full_path = self.path(path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
