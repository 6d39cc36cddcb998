//! Rendering tests

use std::path::Path;

use proptest::prelude::*;
use revprox_core::{ProxyResources, render, render_main};
use revprox_meta::SiteEntry;

fn resources() -> ProxyResources {
    ProxyResources::in_dir(Path::new("/srv/revprox"))
}

#[test]
fn plain_site_snapshot() {
    let text = render(&SiteEntry::new("app.example.com", 8080), &resources());
    insta::assert_snapshot!(text, @r#"
    # Generated by revprox for app.example.com. Manual edits will be overwritten.
    # backend: http://127.0.0.1:8080, ssl: false, force_ssl: false

    server {
        listen 80;
        listen [::]:80;
        server_name app.example.com;

        location /.well-known/acme-challenge/ {
            root /srv/revprox/acme-webroot;
        }

        location / {
            proxy_pass http://127.0.0.1:8080;
            proxy_set_header Host $host;
            proxy_set_header X-Real-IP $remote_addr;
            proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
            proxy_set_header X-Forwarded-Proto $scheme;
            proxy_set_header Upgrade $http_upgrade;
            proxy_set_header Connection $connection_upgrade;
            proxy_read_timeout 90;
            proxy_redirect http://127.0.0.1:8080 http://app.example.com;
        }
    }
    "#);
}

#[test]
fn main_include_snapshot() {
    let text = render_main(["a.example.com", "b.example.com"], &resources());
    insta::assert_snapshot!(text, @r#"
    # Generated by revprox. Include this file from the http block of nginx.conf.

    map $http_upgrade $connection_upgrade {
        default upgrade;
        '' close;
    }

    server {
        # ACME challenges for hosts NGINX does not serve yet
        listen 80 default_server;
        listen [::]:80 default_server;
        server_name _;

        location /.well-known/acme-challenge/ {
            root /srv/revprox/acme-webroot;
        }

        location / {
            return 404;
        }
    }

    include /srv/revprox/nginx/a.example.com.conf;
    include /srv/revprox/nginx/b.example.com.conf;
    "#);
}

#[test]
fn custom_backend_host_is_used() {
    let site = SiteEntry::new("app.example.com", 3000).with_backend_host("10.0.0.7");
    let text = render(&site, &resources());
    assert!(text.contains("proxy_pass http://10.0.0.7:3000;"));
}

fn site_strategy() -> impl Strategy<Value = SiteEntry> {
    (
        "[a-z]{1,10}(\\.[a-z]{2,6}){1,2}",
        1u16..=65535,
        any::<bool>(),
        any::<bool>(),
        "(127\\.0\\.0\\.1|10\\.0\\.[0-9]{1,3}\\.[0-9]{1,3}|backend)",
    )
        .prop_map(|(hostname, port, ssl, force, backend)| {
            let site = SiteEntry::new(hostname, port).with_backend_host(backend);
            match (ssl, force) {
                (true, true) => site.with_forced_ssl(),
                (true, false) => site.with_ssl(),
                _ => site,
            }
        })
}

proptest! {
    #[test]
    fn rendering_is_deterministic(site in site_strategy()) {
        let first = render(&site, &resources());
        let second = render(&site.clone(), &resources());
        prop_assert_eq!(&first, &second);
        let expected_server_name = format!("server_name {};", site.hostname);
        prop_assert!(first.contains(&expected_server_name));
        prop_assert_eq!(first.matches('{').count(), first.matches('}').count());
    }
}
