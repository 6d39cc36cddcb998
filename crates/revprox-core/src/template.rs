//! NGINX configuration rendering
//!
//! Rendering is pure: the same site and resources always produce the same
//! bytes, which is what lets the driver skip rewriting unchanged files.

use std::fmt::{self, Write as _};

use revprox_meta::SiteEntry;

use crate::resources::ProxyResources;

/// First line of every file RevProx generates; marks files it may prune.
pub const GENERATED_MARKER: &str = "# Generated by revprox";

const ACME_CHALLENGE_PATH: &str = "/.well-known/acme-challenge/";

/// One entry inside an NGINX block.
#[derive(Debug, Clone)]
enum Item {
    Directive(&'static str, String),
    Comment(String),
    Block(Block),
}

/// `name args { ... }`
#[derive(Debug, Clone)]
struct Block {
    header: String,
    items: Vec<Item>,
}

impl Block {
    fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            items: Vec::new(),
        }
    }

    fn directive(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.items.push(Item::Directive(key, value.into()));
        self
    }

    fn comment(mut self, text: impl Into<String>) -> Self {
        self.items.push(Item::Comment(text.into()));
        self
    }

    fn block(mut self, block: Block) -> Self {
        self.items.push(Item::Block(block));
        self
    }

    fn write(&self, out: &mut String, depth: usize) -> fmt::Result {
        let indent = "    ".repeat(depth);
        writeln!(out, "{indent}{} {{", self.header)?;
        for (i, item) in self.items.iter().enumerate() {
            match item {
                Item::Directive(key, value) => writeln!(out, "{indent}    {key} {value};")?,
                Item::Comment(text) => writeln!(out, "{indent}    # {text}")?,
                Item::Block(block) => {
                    if i > 0 {
                        out.push('\n');
                    }
                    block.write(out, depth + 1)?;
                }
            }
        }
        writeln!(out, "{indent}}}")
    }
}

fn acme_challenge(resources: &ProxyResources) -> Block {
    Block::new(format!("location {ACME_CHALLENGE_PATH}"))
        .directive("root", resources.webroot.display().to_string())
}

fn proxy_location(site: &SiteEntry) -> Block {
    let proto = if site.enable_ssl { "https" } else { "http" };
    let backend = site.backend_url();
    Block::new("location /")
        .directive("proxy_pass", backend.clone())
        .directive("proxy_set_header", "Host $host")
        .directive("proxy_set_header", "X-Real-IP $remote_addr")
        .directive("proxy_set_header", "X-Forwarded-For $proxy_add_x_forwarded_for")
        .directive("proxy_set_header", "X-Forwarded-Proto $scheme")
        .directive("proxy_set_header", "Upgrade $http_upgrade")
        .directive("proxy_set_header", "Connection $connection_upgrade")
        .directive("proxy_read_timeout", "90")
        .directive(
            "proxy_redirect",
            format!("{backend} {proto}://{}", site.hostname),
        )
}

fn listen_plain(block: Block) -> Block {
    block.directive("listen", "80").directive("listen", "[::]:80")
}

fn listen_ssl(block: Block, site: &SiteEntry, resources: &ProxyResources) -> Block {
    let paths = resources.cert_paths(&site.hostname);
    block
        .directive("listen", "443 ssl")
        .directive("listen", "[::]:443 ssl")
        .directive("ssl_certificate", paths.certificate.display().to_string())
        .directive("ssl_certificate_key", paths.private_key.display().to_string())
}

fn server_blocks(site: &SiteEntry, resources: &ProxyResources) -> Vec<Block> {
    let mut blocks = Vec::new();

    if site.enable_ssl && site.force_ssl {
        let redirect = listen_plain(Block::new("server").comment("force_ssl: plain HTTP only redirects"))
            .directive("server_name", site.hostname.clone())
            .block(acme_challenge(resources))
            .block(Block::new("location /").directive("return", "301 https://$host$request_uri"));
        blocks.push(redirect);
    }

    let mut main = Block::new("server");
    if !site.force_ssl {
        main = listen_plain(main);
    }
    if site.enable_ssl {
        main = listen_ssl(main, site, resources);
    }
    main = main.directive("server_name", site.hostname.clone());
    if !site.force_ssl {
        main = main.block(acme_challenge(resources));
    }
    blocks.push(main.block(proxy_location(site)));
    blocks
}

/// Render the NGINX virtual host for one site.
pub fn render(site: &SiteEntry, resources: &ProxyResources) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{GENERATED_MARKER} for {}. Manual edits will be overwritten.",
        site.hostname
    );
    let _ = writeln!(
        out,
        "# backend: {}, ssl: {}, force_ssl: {}",
        site.backend_url(),
        site.enable_ssl,
        site.force_ssl
    );
    for block in server_blocks(site, resources) {
        out.push('\n');
        let _ = block.write(&mut out, 0);
    }
    out
}

/// Catch-all port 80 server so hosts without a loaded vhost can still pass
/// HTTP-01 validation.
fn challenge_server(resources: &ProxyResources) -> Block {
    Block::new("server")
        .comment("ACME challenges for hosts NGINX does not serve yet")
        .directive("listen", "80 default_server")
        .directive("listen", "[::]:80 default_server")
        .directive("server_name", "_")
        .block(acme_challenge(resources))
        .block(Block::new("location /").directive("return", "404"))
}

/// Render the top-level include that NGINX's `http` block pulls in.
pub fn render_main<'a>(
    hostnames: impl IntoIterator<Item = &'a str>,
    resources: &ProxyResources,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{GENERATED_MARKER}. Include this file from the http block of nginx.conf.");
    out.push('\n');
    let map = Block::new("map $http_upgrade $connection_upgrade")
        .directive("default", "upgrade")
        .directive("''", "close");
    let _ = map.write(&mut out, 0);
    out.push('\n');
    let _ = challenge_server(resources).write(&mut out, 0);
    out.push('\n');
    for hostname in hostnames {
        let _ = writeln!(out, "include {};", resources.vhost_path(hostname).display());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn resources() -> ProxyResources {
        ProxyResources::in_dir(Path::new("/srv/revprox"))
    }

    #[test]
    fn plain_site_has_no_ssl_directives() {
        let text = render(&SiteEntry::new("app.example.com", 8080), &resources());
        assert!(text.starts_with(GENERATED_MARKER));
        assert!(text.contains("listen 80;"));
        assert!(!text.contains("443"));
        assert!(!text.contains("ssl_certificate"));
        assert!(text.contains("proxy_pass http://127.0.0.1:8080;"));
        assert!(text.contains("proxy_redirect http://127.0.0.1:8080 http://app.example.com;"));
    }

    #[test]
    fn ssl_site_serves_both_ports() {
        let site = SiteEntry::new("app.example.com", 8080).with_ssl();
        let text = render(&site, &resources());
        assert_eq!(text.matches("server {").count(), 1);
        assert!(text.contains("listen 80;"));
        assert!(text.contains("listen 443 ssl;"));
        assert!(text.contains(
            "ssl_certificate /srv/revprox/certs/live/app.example.com/fullchain.pem;"
        ));
        assert!(text.contains("proxy_redirect http://127.0.0.1:8080 https://app.example.com;"));
    }

    #[test]
    fn forced_ssl_adds_redirect_server() {
        let site = SiteEntry::new("app.example.com", 8080).with_forced_ssl();
        let text = render(&site, &resources());
        assert_eq!(text.matches("server {").count(), 2);
        assert!(text.contains("return 301 https://$host$request_uri;"));
        let ssl_server = text.split("server {").nth(2).unwrap();
        assert!(!ssl_server.contains("listen 80;"));
        assert!(ssl_server.contains("listen 443 ssl;"));
    }

    #[test]
    fn main_include_lists_sites_in_order() {
        let text = render_main(["b.example.com", "a.example.com"], &resources());
        let b = text.find("b.example.com.conf").unwrap();
        let a = text.find("a.example.com.conf").unwrap();
        assert!(b < a);
        assert!(text.contains("map $http_upgrade $connection_upgrade {"));
        assert!(text.contains("    '' close;"));
    }

    #[test]
    fn main_include_answers_challenges_for_unknown_hosts() {
        let text = render_main(std::iter::empty(), &resources());
        assert!(text.contains("listen 80 default_server;"));
        assert!(text.contains("server_name _;"));
        assert!(text.contains("root /srv/revprox/acme-webroot;"));
    }
}
