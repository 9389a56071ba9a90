// Exercises GitFetcher against throwaway local repositories; requires `git` on PATH.

use book_sync_core::contract::{AcquireOutcome, SourceFetcher, SyncError};
use book_sync_core::download::GitFetcher;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Book Sync", "-c", "user.email=book-sync@example.com"])
        .args(args)
        .status()
        .expect("git must be installed for these tests");
    assert!(status.success(), "git {:?} failed", args);
}

/// A repository with one committed chapter on the `main` branch.
fn upstream(dir: &Path) {
    fs::create_dir_all(dir.join("chapters/chapter_01")).unwrap();
    fs::write(dir.join("chapters/chapter_01/intro.md"), "v1\n").unwrap();
    git(dir, &["init", "-q"]);
    git(dir, &["checkout", "-q", "-b", "main"]);
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "first"]);
}

#[test]
fn test_first_acquire_clones() {
    let tmp = tempdir().unwrap();
    let remote = tmp.path().join("remote");
    upstream(&remote);
    let cache = tmp.path().join("cache/book");

    let fetcher = GitFetcher::new(remote.to_string_lossy(), None);
    let outcome = fetcher.acquire(&cache).expect("clone should succeed");

    assert_eq!(outcome, AcquireOutcome::Cloned);
    assert_eq!(
        fs::read_to_string(cache.join("chapters/chapter_01/intro.md")).unwrap(),
        "v1\n"
    );
}

#[test]
fn test_second_acquire_resets_and_pulls() {
    let tmp = tempdir().unwrap();
    let remote = tmp.path().join("remote");
    upstream(&remote);
    let cache = tmp.path().join("cache");
    let fetcher = GitFetcher::new(remote.to_string_lossy(), None);
    fetcher.acquire(&cache).unwrap();

    fs::write(cache.join("chapters/chapter_01/intro.md"), "local edit\n").unwrap();
    fs::write(remote.join("chapters/chapter_01/intro.md"), "v2\n").unwrap();
    git(&remote, &["commit", "-q", "-am", "second"]);

    let outcome = fetcher.acquire(&cache).unwrap();
    assert_eq!(outcome, AcquireOutcome::Updated);
    assert_eq!(
        fs::read_to_string(cache.join("chapters/chapter_01/intro.md")).unwrap(),
        "v2\n"
    );
}

#[test]
fn test_failed_pull_keeps_stale_snapshot() {
    let tmp = tempdir().unwrap();
    let remote = tmp.path().join("remote");
    upstream(&remote);
    let cache = tmp.path().join("cache");
    let fetcher = GitFetcher::new(remote.to_string_lossy(), None);
    fetcher.acquire(&cache).unwrap();

    fs::remove_dir_all(&remote).unwrap();

    let outcome = fetcher.acquire(&cache).expect("update failure is not fatal");
    assert_eq!(outcome, AcquireOutcome::Stale);
    assert_eq!(
        fs::read_to_string(cache.join("chapters/chapter_01/intro.md")).unwrap(),
        "v1\n"
    );
}

#[test]
fn test_clone_failure_is_fatal() {
    let tmp = tempdir().unwrap();
    let cache = tmp.path().join("cache");
    let missing = tmp.path().join("does-not-exist");

    let fetcher = GitFetcher::new(missing.to_string_lossy(), None);
    let err = fetcher.acquire(&cache).unwrap_err();

    assert!(matches!(err, SyncError::Clone { .. }), "got {err:?}");
    assert!(!cache.exists());
}

#[test]
fn test_unknown_reference_fails_and_leaves_no_cache() {
    let tmp = tempdir().unwrap();
    let remote = tmp.path().join("remote");
    upstream(&remote);
    let cache = tmp.path().join("cache");

    let fetcher = GitFetcher::new(remote.to_string_lossy(), Some("no-such-branch".to_string()));
    let err = fetcher.acquire(&cache).unwrap_err();

    assert!(err.to_string().contains("checkout"), "got {err}");
    assert!(!cache.exists());
}

#[test]
fn test_pinned_tag_updates_without_going_stale() {
    let tmp = tempdir().unwrap();
    let remote = tmp.path().join("remote");
    upstream(&remote);
    git(&remote, &["tag", "v1"]);
    let cache = tmp.path().join("cache");
    let fetcher = GitFetcher::new(remote.to_string_lossy(), Some("v1".to_string()));
    assert_eq!(fetcher.acquire(&cache).unwrap(), AcquireOutcome::Cloned);

    fs::write(remote.join("chapters/chapter_01/intro.md"), "v2\n").unwrap();
    git(&remote, &["commit", "-q", "-am", "second"]);

    let outcome = fetcher.acquire(&cache).unwrap();
    assert_eq!(outcome, AcquireOutcome::Updated);
    assert_eq!(
        fs::read_to_string(cache.join("chapters/chapter_01/intro.md")).unwrap(),
        "v1\n"
    );
}

#[test]
fn test_configured_branch_follows_remote() {
    let tmp = tempdir().unwrap();
    let remote = tmp.path().join("remote");
    upstream(&remote);
    git(&remote, &["branch", "draft"]);
    let cache = tmp.path().join("cache");
    let fetcher = GitFetcher::new(remote.to_string_lossy(), Some("draft".to_string()));
    fetcher.acquire(&cache).unwrap();

    git(&remote, &["checkout", "-q", "draft"]);
    fs::write(remote.join("chapters/chapter_01/intro.md"), "draft v2\n").unwrap();
    git(&remote, &["commit", "-q", "-am", "draft edit"]);

    let outcome = fetcher.acquire(&cache).unwrap();
    assert_eq!(outcome, AcquireOutcome::Updated);
    assert_eq!(
        fs::read_to_string(cache.join("chapters/chapter_01/intro.md")).unwrap(),
        "draft v2\n"
    );
}
