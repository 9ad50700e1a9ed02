//! Splitting a subdirectory off into its own manifest.

use hashdb::error::{ApiError, StorageError};
use hashdb::store::ManifestStore;
use hashdb::types::RelPath;
use hashdb::workspace::{RunFlags, WorkspaceCommandService};
use std::path::Path;
use tempfile::TempDir;

use crate::integration::{open_workspace, write_file};

#[test]
fn test_split_manifest_is_clean_for_the_subdirectory() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "archive/2023/a.txt", b"a");
    write_file(temp_dir.path(), "archive/2024/b.txt", b"b");
    write_file(temp_dir.path(), "current.txt", b"c");
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();

    let outcome =
        WorkspaceCommandService::split(&workspace, Path::new("archive"), RunFlags::default())
            .unwrap();
    assert!(outcome.message.contains("2 files"));

    let sub_workspace = open_workspace(&temp_dir.path().join("archive"));
    let stored = sub_workspace.manifest().load().unwrap();
    assert_eq!(
        stored.paths().map(RelPath::as_str).collect::<Vec<_>>(),
        vec!["2023/a.txt", "2024/b.txt"]
    );

    let status = WorkspaceCommandService::status(&sub_workspace).unwrap();
    let report = status.report.unwrap();
    assert!(report.is_empty());
    assert_eq!(report.unchanged, 2);
}

#[test]
fn test_parent_stays_clean_after_split() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "docs/a.txt", b"a");
    write_file(temp_dir.path(), "top.txt", b"t");
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();
    WorkspaceCommandService::split(&workspace, Path::new("docs"), RunFlags::default()).unwrap();

    let status = WorkspaceCommandService::status(&workspace).unwrap();
    let report = status.report.unwrap();
    assert!(report.is_empty());
    assert_eq!(report.unchanged, 2);

    // Updates inside the subtree rewrite its manifest; the parent ignores it
    let sub_workspace = open_workspace(&temp_dir.path().join("docs"));
    write_file(temp_dir.path(), "docs/b.txt", b"b");
    WorkspaceCommandService::update(&sub_workspace, RunFlags::default()).unwrap();

    let update = WorkspaceCommandService::update(&workspace, RunFlags::default()).unwrap();
    let report = update.report.unwrap();
    assert_eq!(
        report.added.iter().map(RelPath::as_str).collect::<Vec<_>>(),
        vec!["docs/b.txt"]
    );
    assert!(report.modified.is_empty());
    assert!(!workspace
        .manifest()
        .load()
        .unwrap()
        .contains(&RelPath::new("docs/.hash_db.json").unwrap()));
}

#[test]
fn test_split_accepts_absolute_subdirectory() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "docs/a.txt", b"a");
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();

    let absolute = workspace.root().join("docs");
    WorkspaceCommandService::split(&workspace, &absolute, RunFlags { pretend: true }).unwrap();
    assert!(!absolute.join(".hash_db.json").exists());

    WorkspaceCommandService::split(&workspace, &absolute, RunFlags::default()).unwrap();
    assert!(absolute.join(".hash_db.json").is_file());
}

#[test]
fn test_split_outside_root_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    write_file(temp_dir.path(), "a.txt", b"a");
    let workspace = open_workspace(temp_dir.path());
    WorkspaceCommandService::init(&workspace, RunFlags::default()).unwrap();

    assert!(matches!(
        WorkspaceCommandService::split(&workspace, outside.path(), RunFlags::default()),
        Err(ApiError::InvalidArgument(_))
    ));
}

#[test]
fn test_split_requires_a_manifest() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path(), "docs/a.txt", b"a");
    let workspace = open_workspace(temp_dir.path());

    assert!(matches!(
        WorkspaceCommandService::split(&workspace, Path::new("docs"), RunFlags::default()),
        Err(ApiError::StorageError(StorageError::ManifestNotFound(_)))
    ));
}
