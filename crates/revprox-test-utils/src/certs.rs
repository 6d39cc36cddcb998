//! Self-signed certificates laid out the way the ACME client stores them.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rcgen::{CertificateParams, KeyPair, date_time_ymd};

fn ymd(date: NaiveDate) -> (i32, u8, u8) {
    (date.year(), date.month() as u8, date.day() as u8)
}

/// PEM certificate and key for `hostname`, valid until `days_left` days from
/// today (negative for an already expired certificate).
///
/// # Panics
/// Panics if certificate generation fails.
pub fn self_signed_pem(hostname: &str, days_left: i64) -> (String, String) {
    let today = Utc::now().date_naive();
    let not_after = today + Duration::days(days_left);
    let not_before = not_after - Duration::days(90);

    let mut params = CertificateParams::new(vec![hostname.to_string()])
        .unwrap_or_else(|e| panic!("self_signed_pem: invalid params for {hostname}: {e}"));
    let (y, m, d) = ymd(not_before);
    params.not_before = date_time_ymd(y, m, d);
    let (y, m, d) = ymd(not_after);
    params.not_after = date_time_ymd(y, m, d);

    let key_pair = KeyPair::generate().unwrap_or_else(|e| panic!("self_signed_pem: keygen: {e}"));
    let cert = params
        .self_signed(&key_pair)
        .unwrap_or_else(|e| panic!("self_signed_pem: signing failed: {e}"));
    (cert.pem(), key_pair.serialize_pem())
}

/// Write `live/<hostname>/fullchain.pem` and `privkey.pem` under `certs_dir`.
///
/// Returns the certificate path.
pub fn write_live_cert(certs_dir: &Path, hostname: &str, days_left: i64) -> PathBuf {
    let dir = certs_dir.join("live").join(hostname);
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("write_live_cert: {e}"));
    let (cert, key) = self_signed_pem(hostname, days_left);
    let cert_path = dir.join("fullchain.pem");
    fs::write(&cert_path, cert).unwrap_or_else(|e| panic!("write_live_cert: {e}"));
    fs::write(dir.join("privkey.pem"), key).unwrap_or_else(|e| panic!("write_live_cert: {e}"));
    cert_path
}
