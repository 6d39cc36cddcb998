use pretty_assertions::assert_eq;
use revprox_fs::StorageLayout;
use revprox_meta::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_missing_settings_use_defaults() {
    let temp = TempDir::new().unwrap();
    let layout = StorageLayout::new(temp.path());

    let settings = Settings::load(&layout).unwrap();

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.acme.renew_before_days, 30);
    assert_eq!(settings.sites_dir(&layout), layout.nginx_dir());
    assert_eq!(settings.certs_dir(&layout), layout.certs_dir());
    assert_eq!(settings.webroot(&layout), layout.acme_webroot());
}

#[test]
fn test_partial_settings_keep_other_defaults() {
    let temp = TempDir::new().unwrap();
    let layout = StorageLayout::new(temp.path());
    fs::write(
        layout.settings_file(),
        "[acme]\nrenew_before_days = 14\n\n[nginx]\nsites_dir = \"/etc/nginx/sites-enabled\"\n",
    )
    .unwrap();

    let settings = Settings::load(&layout).unwrap();

    assert_eq!(settings.acme.renew_before_days, 14);
    assert_eq!(settings.acme.retry_attempts, 3);
    assert_eq!(settings.git.remote, "origin");
    assert_eq!(
        settings.sites_dir(&layout),
        PathBuf::from("/etc/nginx/sites-enabled")
    );
}

#[test]
fn test_save_and_reload() {
    let temp = TempDir::new().unwrap();
    let layout = StorageLayout::new(temp.path());
    let mut settings = Settings::default();
    settings.git.username = Some("deploy".into());
    settings.git.push = true;

    settings.save(&layout).unwrap();
    let reloaded = Settings::load(&layout).unwrap();

    assert_eq!(reloaded, settings);
    let raw: toml::Value = toml::from_str(&fs::read_to_string(layout.settings_file()).unwrap()).unwrap();
    assert_eq!(raw["git"]["username"].as_str(), Some("deploy"));
}
