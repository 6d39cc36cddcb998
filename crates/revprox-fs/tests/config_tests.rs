use pretty_assertions::assert_eq;
use revprox_fs::{DocumentStore, Error, StorageLayout};
use rstest::rstest;
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct TestSettings {
    #[serde(default)]
    name: String,
    #[serde(default)]
    count: i32,
}

#[rstest]
#[case("settings.toml", "name = \"proxy\"\ncount = 3")]
#[case("settings.json", r#"{"name": "proxy", "count": 3}"#)]
#[case("settings.yaml", "name: proxy\ncount: 3")]
#[case("settings.yml", "name: proxy\ncount: 3")]
fn test_load_by_extension(#[case] file: &str, #[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(file);
    fs::write(&path, content).unwrap();

    let loaded: TestSettings = DocumentStore::new().load(&path).unwrap();
    assert_eq!(
        loaded,
        TestSettings {
            name: "proxy".into(),
            count: 3
        }
    );
}

#[test]
fn test_load_or_default_missing_file() {
    let temp = TempDir::new().unwrap();
    let loaded: TestSettings = DocumentStore::new()
        .load_or_default(&temp.path().join("revprox.toml"))
        .unwrap();
    assert_eq!(loaded, TestSettings::default());
}

#[test]
fn test_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.ini");
    fs::write(&path, "name=proxy").unwrap();

    let result: Result<TestSettings, _> = DocumentStore::new().load(&path);
    assert!(matches!(result, Err(Error::UnsupportedFormat { .. })));
}

#[test]
fn test_parse_error_names_format() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.toml");
    fs::write(&path, "name = ").unwrap();

    let err = DocumentStore::new().load::<TestSettings>(&path).unwrap_err();
    assert!(err.to_string().contains("TOML"), "got: {err}");
}

#[test]
fn test_save_then_load_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("revprox.toml");
    let settings = TestSettings {
        name: "edge".into(),
        count: 7,
    };

    DocumentStore::new().save(&path, &settings).unwrap();
    let loaded: TestSettings = DocumentStore::new().load(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_layout_validate_and_create_dirs() {
    let temp = TempDir::new().unwrap();
    let layout = StorageLayout::new(temp.path());

    layout.validate().unwrap();
    layout.ensure_output_dirs().unwrap();

    assert!(layout.certs_dir().is_dir());
    assert!(layout.nginx_dir().is_dir());
    assert!(layout.acme_webroot().is_dir());
    assert!(!layout.has_config_repo());
}

#[test]
fn test_layout_validate_missing_root() {
    let layout = StorageLayout::new("/definitely/not/here/revprox");
    assert!(matches!(layout.validate(), Err(Error::StorageUnusable { .. })));
}
