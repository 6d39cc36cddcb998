//! Certificate status read from a real certificate store layout

use std::fs;

use chrono::{Duration, Utc};
use revprox_core::{CertStatus, CertificateManager, InMemoryCertClient, ProxyResources};
use revprox_test_utils::TestStorage;
use rstest::rstest;

fn manager(storage: &TestStorage, client: InMemoryCertClient) -> CertificateManager<InMemoryCertClient> {
    CertificateManager::new(client, ProxyResources::in_dir(storage.root()))
}

#[rstest]
#[case(90, CertStatus::Valid)]
#[case(10, CertStatus::ExpiringSoon)]
#[case(-1, CertStatus::Expired)]
fn status_follows_expiry(#[case] days_left: i64, #[case] expected: CertStatus) {
    let storage = TestStorage::new();
    storage.write_cert("app.example.com", days_left);

    let record = manager(&storage, InMemoryCertClient::new()).status("app.example.com");

    assert_eq!(record.status, expected);
    assert!(record.issued_at.unwrap() < record.expires_at.unwrap());
}

#[test]
fn threshold_is_configurable() {
    let storage = TestStorage::new();
    storage.write_cert("app.example.com", 20);
    let manager = manager(&storage, InMemoryCertClient::new()).with_renew_before_days(14);
    assert_eq!(manager.status("app.example.com").status, CertStatus::Valid);
}

#[test]
fn expiry_is_reported() {
    let storage = TestStorage::new();
    storage.write_cert("app.example.com", 45);
    let record = manager(&storage, InMemoryCertClient::new()).status("app.example.com");
    let days = record.days_remaining(Utc::now()).unwrap();
    assert!((44..=45).contains(&days), "days = {days}");
}

#[test]
fn corrupt_certificate_counts_as_absent() {
    let storage = TestStorage::new();
    let cert = storage.write_cert("app.example.com", 90);
    fs::write(&cert, "-----BEGIN CERTIFICATE-----\ngarbage\n-----END CERTIFICATE-----\n").unwrap();
    let record = manager(&storage, InMemoryCertClient::new()).status("app.example.com");
    assert_eq!(record.status, CertStatus::Absent);
}

#[test]
fn missing_key_counts_as_absent() {
    let storage = TestStorage::new();
    let cert = storage.write_cert("app.example.com", 90);
    fs::remove_file(cert.with_file_name("privkey.pem")).unwrap();
    let record = manager(&storage, InMemoryCertClient::new()).status("app.example.com");
    assert_eq!(record.status, CertStatus::Absent);
}

#[test]
fn issuance_without_certificate_is_validation_failure() {
    let storage = TestStorage::new();
    let manager = manager(&storage, InMemoryCertClient::new());

    let err = manager.issue_or_renew("app.example.com").unwrap_err();

    assert_eq!(err.kind(), "validation_failure");
    assert_eq!(manager.client().requested(), vec!["app.example.com"]);
}

#[test]
fn issuance_reports_new_certificate() {
    let storage = TestStorage::new();
    storage.write_cert("app.example.com", 3);
    let client = InMemoryCertClient::new().on_success(|request| {
        revprox_test_utils::certs::write_live_cert(&request.config_dir, &request.hostname, 90);
    });
    let manager = manager(&storage, client);

    let record = manager.issue_or_renew("app.example.com").unwrap();

    assert_eq!(record.status, CertStatus::Valid);
    assert!(record.expires_at.unwrap() > Utc::now() + Duration::days(80));
}
