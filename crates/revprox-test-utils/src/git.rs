//! Git fixtures for the config repository.
//!
//! Everything goes through `git2` with a fixed identity, so the fixtures do
//! not depend on a `git` binary or the user's git configuration.

use std::fs;
use std::path::Path;

use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature};

const BRANCH: &str = "main";

fn signature() -> Signature<'static> {
    Signature::now("Test User", "test@test.com")
        .unwrap_or_else(|e| panic!("git fixture: failed to build signature: {e}"))
}

fn init_with_main(path: &Path, bare: bool) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.bare(bare).initial_head(BRANCH);
    Repository::init_opts(path, &opts)
        .unwrap_or_else(|e| panic!("git fixture: init at {} failed: {e}", path.display()))
}

/// Stage everything in the working tree and commit it on `main`.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
    let mut index = repo.index().expect("git fixture: index");
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .expect("git fixture: add_all");
    index.write().expect("git fixture: write index");
    let tree = repo
        .find_tree(index.write_tree().expect("git fixture: write_tree"))
        .expect("git fixture: find_tree");
    let sig = signature();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("git fixture: commit")
}

/// Create a bare repository at `remote` whose `main` branch holds
/// `config.yml` with `site_file` as content.
///
/// # Panics
/// Panics if any git or filesystem operation fails.
pub fn bare_remote_with_site_file(remote: &Path, site_file: &str) {
    init_with_main(remote, true);
    push_site_file(remote, site_file, "Initial site file");
}

/// Commit a new `config.yml` to the bare `remote` through a scratch clone.
///
/// # Panics
/// Panics if any git or filesystem operation fails.
pub fn push_site_file(remote: &Path, site_file: &str, message: &str) {
    let scratch = tempfile::TempDir::new().expect("git fixture: scratch dir");
    let work = init_with_main(scratch.path(), false);
    work.remote("origin", &remote.to_string_lossy())
        .expect("git fixture: add remote");

    let remote_has_main = Repository::open_bare(remote)
        .ok()
        .and_then(|r| r.find_reference("refs/heads/main").ok().map(|_| ()))
        .is_some();
    if remote_has_main {
        let mut origin = work.find_remote("origin").expect("git fixture: origin");
        origin
            .fetch(&["+refs/heads/main:refs/remotes/origin/main"], None, None)
            .expect("git fixture: fetch");
        let tip = work
            .find_reference("refs/remotes/origin/main")
            .and_then(|r| r.peel_to_commit())
            .expect("git fixture: origin/main");
        work.reference("refs/heads/main", tip.id(), true, "fixture: track origin/main")
            .expect("git fixture: update main");
        work.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))
            .expect("git fixture: checkout");
    }

    fs::write(scratch.path().join("config.yml"), site_file).expect("git fixture: write config.yml");
    commit_all(&work, message);

    let mut origin = work.find_remote("origin").expect("git fixture: origin");
    origin
        .push(&["refs/heads/main:refs/heads/main"], None)
        .expect("git fixture: push");
}

/// Clone `remote` into `dest` and configure a commit identity.
///
/// # Panics
/// Panics if the clone fails.
pub fn clone_remote(remote: &Path, dest: &Path) -> Repository {
    let repo = Repository::clone(&remote.to_string_lossy(), dest)
        .unwrap_or_else(|e| panic!("git fixture: clone into {} failed: {e}", dest.display()));
    {
        let mut config = repo.config().expect("git fixture: config");
        config.set_str("user.name", "Test User").expect("git fixture: user.name");
        config.set_str("user.email", "test@test.com").expect("git fixture: user.email");
    }
    repo
}

/// Read `path` from the tip of `main` in a bare repository.
pub fn read_from_remote(remote: &Path, path: &str) -> Option<String> {
    let repo = Repository::open_bare(remote).ok()?;
    let tree = repo
        .find_reference("refs/heads/main")
        .ok()?
        .peel_to_commit()
        .ok()?
        .tree()
        .ok()?;
    let entry = tree.get_path(Path::new(path)).ok()?;
    let blob = repo.find_blob(entry.id()).ok()?;
    Some(String::from_utf8_lossy(blob.content()).into_owned())
}
