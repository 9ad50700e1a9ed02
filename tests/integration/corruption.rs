//! Forced verification: silent content drift and metadata refresh.

use hashdb::store::ManifestStore;
use hashdb::types::{Mtime, RelPath};
use hashdb::workspace::{RunFlags, WorkspaceCommandService};
use std::fs;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::integration::{open_workspace, set_mtime, write_file};

fn rel(path: &str) -> RelPath {
    RelPath::new(path).unwrap()
}

/// Rewrite a file with same-length content and put its mtime back.
fn corrupt_in_place(path: &std::path::Path, content: &[u8]) {
    let original = fs::metadata(path).unwrap().modified().unwrap();
    assert_eq!(fs::metadata(path).unwrap().len(), content.len() as u64);
    fs::write(path, content).unwrap();
    set_mtime(path, original);
}

#[test]
fn test_verify_reports_silent_corruption() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "photo.raw", b"original bytes");
    write_file(temp_dir.path(), "notes.txt", b"fine");
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();

    corrupt_in_place(&temp_dir.path().join("photo.raw"), b"flipped  bytes");

    // Metadata is unchanged, so cheap status sees nothing
    let status = WorkspaceCommandService::status(&workspace).unwrap();
    assert!(status.report.unwrap().is_empty());

    let outcome = WorkspaceCommandService::verify(&workspace, false, RunFlags::default()).unwrap();
    let report = outcome.report.as_ref().unwrap();
    assert_eq!(
        report.corruption.iter().collect::<Vec<_>>(),
        vec![&rel("photo.raw")]
    );
    assert!(report.modified.is_empty());
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.hashed, 2);
    assert!(!outcome.is_success());
}

#[test]
fn test_verify_never_rewrites_corrupt_entries() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "photo.raw", b"original bytes");
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();
    let before = fs::read(workspace.manifest().path()).unwrap();

    corrupt_in_place(&temp_dir.path().join("photo.raw"), b"flipped  bytes");
    WorkspaceCommandService::verify(&workspace, true, RunFlags::default()).unwrap();

    assert_eq!(fs::read(workspace.manifest().path()).unwrap(), before);
}

#[test]
fn test_verify_update_mtimes_refreshes_matching_files() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "a.txt", b"alpha");
    write_file(temp_dir.path(), "b.txt", b"bravo");
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();

    let touched = SystemTime::now() + Duration::from_secs(3600);
    set_mtime(&temp_dir.path().join("a.txt"), touched);
    // Changed content with changed metadata stays a modification
    write_file(temp_dir.path(), "b.txt", b"bravo two");

    let outcome = WorkspaceCommandService::verify(&workspace, true, RunFlags::default()).unwrap();
    let report = outcome.report.unwrap();
    assert_eq!(
        report.mtime_refreshed.iter().collect::<Vec<_>>(),
        vec![&rel("a.txt")]
    );
    assert_eq!(report.modified.iter().collect::<Vec<_>>(), vec![&rel("b.txt")]);

    let stored = workspace.manifest().load().unwrap();
    assert_eq!(
        stored.get(&rel("a.txt")).unwrap().mtime,
        Mtime::from_system_time(touched)
    );

    // b.txt was not folded in; only update does that
    let status = WorkspaceCommandService::status(&workspace).unwrap();
    let report = status.report.unwrap();
    assert!(report.modified.contains(&rel("b.txt")));
    assert!(!report.modified.contains(&rel("a.txt")));
}

#[test]
fn test_verify_without_update_mtimes_reports_modified() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "a.txt", b"alpha");
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();
    let before = fs::read(workspace.manifest().path()).unwrap();

    set_mtime(
        &temp_dir.path().join("a.txt"),
        SystemTime::now() + Duration::from_secs(3600),
    );

    let outcome = WorkspaceCommandService::verify(&workspace, false, RunFlags::default()).unwrap();
    assert!(outcome.report.unwrap().modified.contains(&rel("a.txt")));
    assert!(outcome.failures.is_empty());
    assert_eq!(fs::read(workspace.manifest().path()).unwrap(), before);
}

#[test]
fn test_verify_pretend_does_not_refresh() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "a.txt", b"alpha");
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();
    let before = fs::read(workspace.manifest().path()).unwrap();

    set_mtime(
        &temp_dir.path().join("a.txt"),
        SystemTime::now() + Duration::from_secs(3600),
    );
    let outcome =
        WorkspaceCommandService::verify(&workspace, true, RunFlags { pretend: true }).unwrap();

    assert_eq!(outcome.report.unwrap().mtime_refreshed.len(), 1);
    assert_eq!(fs::read(workspace.manifest().path()).unwrap(), before);
}
