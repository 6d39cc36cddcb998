//! Update scenarios across the whole stack
//!
//! A real git remote and clone, the real settings and layout, and in-memory
//! doubles only for the ACME client and NGINX.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use revprox_core::{
    CertError, CertStatus, CertificateManager, InMemoryCertClient, InMemoryReloader, ProxyResources,
    ReconciliationDriver, RetryPolicy, SiteState, UpdateKind, UpdateOptions, UpdateResult,
    UpdateSession,
};
use revprox_fs::StorageLayout;
use revprox_git::Git2Client;
use revprox_meta::{ConfigStore, Settings};
use revprox_test_utils::TestStorage;
use revprox_test_utils::certs::write_live_cert;
use revprox_test_utils::git::{bare_remote_with_site_file, clone_remote, push_site_file, read_from_remote};
use tempfile::TempDir;

type Driver = ReconciliationDriver<InMemoryCertClient, InMemoryReloader>;

struct Proxy {
    storage: TestStorage,
    remote: TempDir,
    layout: StorageLayout,
}

impl Proxy {
    fn new(site_file: &str) -> Self {
        let remote = TempDir::new().unwrap();
        bare_remote_with_site_file(remote.path(), site_file);
        let storage = TestStorage::new();
        clone_remote(remote.path(), &storage.path("config"));
        let layout = StorageLayout::new(storage.root());
        Self { storage, remote, layout }
    }

    fn settings(&self) -> Settings {
        Settings::load(&self.layout).unwrap()
    }

    fn driver(&self, client: InMemoryCertClient) -> Driver {
        let settings = self.settings();
        let resources = ProxyResources::from_settings(&self.layout, &settings);
        let certs = CertificateManager::new(client, resources.clone())
            .with_renew_before_days(settings.acme.renew_before_days);
        ReconciliationDriver::new(resources, certs, InMemoryReloader::new())
            .with_retry(RetryPolicy::new(2, std::time::Duration::ZERO))
    }

    fn update(&self, driver: &mut Driver, options: UpdateOptions) -> revprox_core::Result<UpdateResult> {
        let git = Git2Client::new(self.layout.config_repo());
        let store = ConfigStore::new(self.layout.site_file());
        UpdateSession {
            store: &store,
            git: &git,
            driver,
            status_file: self.layout.status_file(),
        }
        .run(options)
    }
}

fn issuing_client() -> InMemoryCertClient {
    InMemoryCertClient::new().on_success(|request| {
        write_live_cert(&request.config_dir, &request.hostname, 90);
    })
}

fn applied(result: UpdateResult) -> revprox_core::RunReport {
    match result.kind {
        UpdateKind::Applied(report) => report,
        other => panic!("expected an applied run, got {other:?}"),
    }
}

const SSL_SITES: &str = "\
acme:
  email: ops@example.com
sites:
  - hostname: a.example.com
    backend_port: 8080
    ssl: true
  - hostname: b.example.com
    backend_port: 8081
    ssl: true
    force_ssl: true
";

#[test]
fn network_failure_for_one_site_does_not_block_the_other() {
    let proxy = Proxy::new(SSL_SITES);
    let client = issuing_client().failing(
        "a.example.com",
        CertError::NetworkFailure {
            hostname: "a.example.com".into(),
            message: "connection reset by peer".into(),
        },
    );
    let mut driver = proxy.driver(client);

    let report = applied(proxy.update(&mut driver, UpdateOptions::default()).unwrap());

    let a = report.site("a.example.com").unwrap();
    assert_eq!(a.state, SiteState::Failed);
    assert_eq!(a.attempts, 2);
    let b = report.site("b.example.com").unwrap();
    assert_eq!(b.state, SiteState::Ready);
    assert_eq!(b.certificate.as_ref().unwrap().status, CertStatus::Valid);
    // Challenge server before issuing, then a single activating reload.
    assert!(report.challenge_reload);
    assert!(report.reloaded);
    assert_eq!(driver.reloader().reload_count(), 2);
    assert_eq!(proxy.storage.nginx_files(), vec!["b.example.com.conf", "revprox.conf"]);
    proxy
        .storage
        .assert_file_contains("nginx/b.example.com.conf", "return 301 https://$host$request_uri;");
}

#[test]
fn pushed_status_reaches_the_remote() {
    let proxy = Proxy::new(SSL_SITES);
    let mut driver = proxy.driver(issuing_client());
    let options = UpdateOptions {
        push: true,
        ..UpdateOptions::default()
    };

    let result = proxy.update(&mut driver, options).unwrap();
    assert!(result.pushed);

    let status = read_from_remote(proxy.remote.path(), "status.yml").unwrap();
    assert!(status.contains("hostname: a.example.com"));
    assert!(status.contains("state: ready"));

    // Same outcome again: nothing new to commit.
    let forced = UpdateOptions {
        force: true,
        push: true,
        ..UpdateOptions::default()
    };
    let result = proxy.update(&mut driver, forced).unwrap();
    assert!(!result.pushed);
}

#[test]
fn upstream_change_is_applied_and_removed_site_pruned() {
    let proxy = Proxy::new(SSL_SITES);
    let mut driver = proxy.driver(issuing_client());
    proxy.update(&mut driver, UpdateOptions::default()).unwrap();

    push_site_file(
        proxy.remote.path(),
        "sites:\n  - hostname: a.example.com\n    backend_host: 10.1.0.4\n    backend_port: 8080\n    ssl: true\n",
        "Drop b, move a",
    );
    let result = proxy.update(&mut driver, UpdateOptions::default()).unwrap();

    assert!(result.pull.as_ref().unwrap().changed());
    let report = applied(result);
    assert_eq!(report.removed, vec!["b.example.com"]);
    assert!(report.site("a.example.com").unwrap().config_changed);
    proxy
        .storage
        .assert_file_contains("nginx/a.example.com.conf", "proxy_pass http://10.1.0.4:8080;");
    proxy.storage.assert_file_not_exists("nginx/b.example.com.conf");
    // Certificates are left to the ACME client.
    proxy.storage.assert_file_exists("certs/live/b.example.com/fullchain.pem");
}

#[test]
fn unreachable_remote_falls_back_to_local_copy() {
    let proxy = Proxy::new(SSL_SITES);
    fs::remove_dir_all(proxy.remote.path()).unwrap();
    let mut driver = proxy.driver(issuing_client());

    let result = proxy.update(&mut driver, UpdateOptions::default()).unwrap();

    assert!(result.pull.is_none());
    assert_eq!(result.warnings.len(), 1);
    assert!(applied(result).success());
}

#[test]
fn invalid_upstream_file_stops_before_writing() {
    let proxy = Proxy::new(SSL_SITES);
    push_site_file(
        proxy.remote.path(),
        "sites:\n  - hostname: ok.example.com\n    backend_port: 80\n  - hostname: OK.example.com\n    backend_port: 81\n  - hostname: bad.example.com\n    backend_port: 0\n",
        "Broken",
    );
    let mut driver = proxy.driver(issuing_client());

    let err = proxy.update(&mut driver, UpdateOptions::default()).unwrap_err();

    let message = err.to_string();
    assert!(message.contains("duplicate hostname"), "{message}");
    assert!(message.contains("bad.example.com"), "{message}");
    assert!(message.contains("2 invalid site entries"), "{message}");
    assert!(proxy.storage.nginx_files().is_empty());
    assert!(driver.certificates().client().requested().is_empty());
    assert_eq!(driver.reloader().reload_count(), 0);
}

#[test]
fn settings_redirect_output_directories() {
    let proxy = Proxy::new("sites:\n  - hostname: a.example.com\n    backend_port: 8080\n");
    let sites_dir = proxy.storage.path("etc-nginx/conf.d");
    proxy.storage.write_settings(&format!(
        "[nginx]\nsites_dir = {:?}\n",
        sites_dir.display().to_string()
    ));
    let mut driver = proxy.driver(issuing_client());

    proxy.update(&mut driver, UpdateOptions::default()).unwrap();

    let expected: PathBuf = sites_dir.join("a.example.com.conf");
    assert!(expected.is_file());
    assert!(sites_dir.join("revprox.conf").is_file());
    assert!(proxy.storage.nginx_files().is_empty());
}
