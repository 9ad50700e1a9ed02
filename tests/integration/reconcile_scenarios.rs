//! End-to-end reconciliation scenarios through the workspace command service:
//! unchanged, modified, added, and removed files, plus dry runs.

use hashdb::store::ManifestStore;
use hashdb::tree::hasher::compute_content_hash;
use hashdb::types::RelPath;
use hashdb::workspace::{RunFlags, WorkspaceCommandService};
use std::fs;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::integration::{open_workspace, set_mtime, write_file};

fn rel(path: &str) -> RelPath {
    RelPath::new(path).unwrap()
}

fn seeded() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "a.txt", b"alpha");
    write_file(temp_dir.path(), "docs/b.txt", b"bravo");
    write_file(temp_dir.path(), "docs/deep/c.txt", b"charlie");
    temp_dir
}

#[test]
fn test_unchanged_tree_reports_nothing() {
    let temp_dir = seeded();
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();
    let before = fs::read(workspace.manifest().path()).unwrap();

    let outcome = WorkspaceCommandService::update(&workspace, RunFlags::default()).unwrap();
    let report = outcome.report.unwrap();

    assert!(report.is_empty());
    assert_eq!(report.unchanged, 3);
    assert_eq!(report.hashed, 0);
    assert_eq!(outcome.message, "Manifest is up to date");
    assert_eq!(fs::read(workspace.manifest().path()).unwrap(), before);
}

#[test]
fn test_modified_file_is_rehashed() {
    let temp_dir = seeded();
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();

    write_file(temp_dir.path(), "docs/b.txt", b"bravo, edited");

    let status = WorkspaceCommandService::status(&workspace).unwrap();
    assert_eq!(
        status.report.unwrap().modified.into_iter().collect::<Vec<_>>(),
        vec![rel("docs/b.txt")]
    );

    let outcome = WorkspaceCommandService::update(&workspace, RunFlags::default()).unwrap();
    let report = outcome.report.unwrap();
    assert_eq!(report.modified.len(), 1);
    assert_eq!(report.hashed, 1);

    let stored = workspace.manifest().load().unwrap();
    assert_eq!(
        stored.get(&rel("docs/b.txt")).unwrap().hash,
        compute_content_hash(b"bravo, edited")
    );
}

#[test]
fn test_mtime_only_change_is_modified_under_update() {
    let temp_dir = seeded();
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();

    let path = temp_dir.path().join("a.txt");
    set_mtime(&path, SystemTime::now() + Duration::from_secs(60));

    let outcome = WorkspaceCommandService::update(&workspace, RunFlags::default()).unwrap();
    let report = outcome.report.unwrap();
    assert!(report.modified.contains(&rel("a.txt")));
    assert!(report.corruption.is_empty());

    let stored = workspace.manifest().load().unwrap();
    assert_eq!(
        stored.get(&rel("a.txt")).unwrap().hash,
        compute_content_hash(b"alpha")
    );
}

#[test]
fn test_added_and_removed_files() {
    let temp_dir = seeded();
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();

    write_file(temp_dir.path(), "docs/new.txt", b"delta");
    fs::remove_dir_all(temp_dir.path().join("docs/deep")).unwrap();

    let outcome = WorkspaceCommandService::update(&workspace, RunFlags::default()).unwrap();
    let report = outcome.report.unwrap();
    assert_eq!(report.added.iter().collect::<Vec<_>>(), vec![&rel("docs/new.txt")]);
    assert_eq!(
        report.removed.iter().collect::<Vec<_>>(),
        vec![&rel("docs/deep/c.txt")]
    );
    assert!(outcome.failures.is_empty());

    let stored = workspace.manifest().load().unwrap();
    assert!(stored.contains(&rel("docs/new.txt")));
    assert!(!stored.contains(&rel("docs/deep/c.txt")));

    let status = WorkspaceCommandService::status(&workspace).unwrap();
    assert!(status.report.unwrap().is_empty());
}

#[test]
fn test_pretend_update_keeps_manifest() {
    let temp_dir = seeded();
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();
    let before = fs::read(workspace.manifest().path()).unwrap();

    write_file(temp_dir.path(), "e.txt", b"echo");
    let outcome = WorkspaceCommandService::update(&workspace, RunFlags { pretend: true }).unwrap();

    assert_eq!(outcome.report.unwrap().added.len(), 1);
    assert_eq!(fs::read(workspace.manifest().path()).unwrap(), before);

    // Same diff again since nothing was persisted
    let status = WorkspaceCommandService::status(&workspace).unwrap();
    assert!(status.report.unwrap().added.contains(&rel("e.txt")));
}

#[test]
fn test_manifest_is_never_tracked() {
    let temp_dir = seeded();
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();
    WorkspaceCommandService::update(&workspace, RunFlags::default()).unwrap();

    let stored = workspace.manifest().load().unwrap();
    assert!(!stored.contains(&rel(".hash_db.json")));
    assert_eq!(stored.len(), 3);
}

#[test]
fn test_corrupt_manifest_aborts_without_writing() {
    let temp_dir = seeded();
    let workspace = open_workspace(temp_dir.path());
    fs::write(workspace.manifest().path(), r#"{"version": 1, "files": {"a.txt": {}}}"#).unwrap();

    let err = WorkspaceCommandService::update(&workspace, RunFlags::default()).unwrap_err();
    assert!(err.to_string().contains("Corrupt manifest"));
    assert_eq!(
        fs::read_to_string(workspace.manifest().path()).unwrap(),
        r#"{"version": 1, "files": {"a.txt": {}}}"#
    );
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_a_failure_not_an_abort() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = seeded();
    let locked = temp_dir.path().join("locked.bin");
    fs::write(&locked, b"secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&locked).is_ok() {
        // Running as root; permission bits are not enforced
        return;
    }

    let workspace = open_workspace(temp_dir.path());
    let outcome = WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();

    assert!(!outcome.is_success());
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].path, "locked.bin");
    let stored = workspace.manifest().load().unwrap();
    assert!(stored.contains(&rel("a.txt")));
    assert!(!stored.contains(&rel("locked.bin")));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}
