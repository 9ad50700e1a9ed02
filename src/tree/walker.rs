//! Filesystem walker producing the live scan of a manifest root

use crate::error::{FailureKind, FileFailure};
use crate::types::{FileStat, RelPath};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

/// How symbolic links under the root are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkPolicy {
    /// Dereference links; a link is tracked as its target's content.
    #[default]
    Follow,
    /// Report every link as a failure and do not descend into it.
    Reject,
}

/// Filesystem walker configuration
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    pub symlinks: SymlinkPolicy,
    /// Directory or file names skipped wherever they appear (exact match)
    pub ignore_patterns: Vec<String>,
    /// File names never tracked, at any depth (manifests, listings, and their
    /// temp files)
    pub excluded_names: Vec<String>,
}

/// One item of the lazy scan sequence
#[derive(Debug, Clone)]
pub enum ScanItem {
    File(RelPath, FileStat),
    /// Regular file whose name is excluded from tracking
    Excluded(RelPath),
    Failure(FileFailure),
}

/// Collected scan: every regular file under the root plus per-path failures
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub files: BTreeMap<RelPath, FileStat>,
    /// Files seen but not tracked because of their name
    pub excluded: BTreeSet<RelPath>,
    pub failures: Vec<FileFailure>,
    failed_paths: BTreeSet<String>,
}

impl ScanResult {
    pub fn insert_file(&mut self, path: RelPath, stat: FileStat) {
        self.files.insert(path, stat);
    }

    pub fn push_failure(&mut self, failure: FileFailure) {
        self.failed_paths.insert(failure.path.clone());
        self.failures.push(failure);
    }

    pub fn get(&self, path: &RelPath) -> Option<&FileStat> {
        self.files.get(path)
    }

    /// True when the scan could not observe `path` because it, or one of its
    /// parent directories, failed. Such paths must not be treated as removed.
    pub fn is_obscured(&self, path: &RelPath) -> bool {
        if self.failed_paths.is_empty() {
            return false;
        }
        let text = path.as_str();
        text.match_indices('/')
            .map(|(idx, _)| &text[..idx])
            .chain(std::iter::once(text))
            .any(|prefix| self.failed_paths.contains(prefix))
    }
}

impl FromIterator<ScanItem> for ScanResult {
    fn from_iter<I: IntoIterator<Item = ScanItem>>(iter: I) -> Self {
        let mut result = ScanResult::default();
        for item in iter {
            match item {
                ScanItem::File(path, stat) => result.insert_file(path, stat),
                ScanItem::Excluded(path) => {
                    result.excluded.insert(path);
                }
                ScanItem::Failure(failure) => result.push_failure(failure),
            }
        }
        result
    }
}

/// Filesystem walker
///
/// Holds no state between walks; every call to [`Walker::iter`] starts over.
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the root, yielding regular files and per-path failures
    ///
    /// Order is whatever the filesystem returns. Entries that disappear while
    /// the walk is running are skipped.
    pub fn iter(&self) -> impl Iterator<Item = ScanItem> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.config.symlinks == SymlinkPolicy::Follow)
            .min_depth(1)
            .into_iter()
            .filter_entry(move |entry| entry.depth() == 0 || !self.should_ignore(entry))
            .filter_map(move |result| match result {
                Ok(entry) => self.classify_entry(&entry),
                Err(err) => self.classify_error(err),
            })
    }

    /// Walk the whole tree and collect the result
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn scan(&self) -> ScanResult {
        let result: ScanResult = self.iter().collect();
        debug!(
            files = result.files.len(),
            failures = result.failures.len(),
            "Scan completed"
        );
        result
    }

    fn classify_entry(&self, entry: &DirEntry) -> Option<ScanItem> {
        let file_type = entry.file_type();

        if entry.path_is_symlink() && self.config.symlinks == SymlinkPolicy::Reject {
            return Some(ScanItem::Failure(FileFailure::new(
                self.display_path(entry.path()),
                FailureKind::SymlinkRejected,
            )));
        }
        if !file_type.is_file() {
            if !file_type.is_dir() {
                debug!(path = %entry.path().display(), "Skipping non-regular file");
            }
            return None;
        }

        let rel = entry.path().strip_prefix(&self.root).ok()?;
        let Some(rel_path) = RelPath::from_relative_path(rel) else {
            return Some(ScanItem::Failure(FileFailure::new(
                rel.to_string_lossy(),
                FailureKind::UnrepresentablePath,
            )));
        };
        if self.is_excluded(entry) {
            return Some(ScanItem::Excluded(rel_path));
        }

        match entry.metadata() {
            Ok(metadata) => Some(ScanItem::File(rel_path, FileStat::from_metadata(&metadata))),
            Err(err) if is_not_found(&err) => {
                debug!(path = %rel_path, "File vanished during scan");
                None
            }
            Err(err) => Some(ScanItem::Failure(FileFailure::new(
                rel_path.as_str(),
                FailureKind::NotReadable(err.to_string()),
            ))),
        }
    }

    fn classify_error(&self, err: walkdir::Error) -> Option<ScanItem> {
        let Some(path) = err.path().map(Path::to_path_buf) else {
            return Some(ScanItem::Failure(FileFailure::new(
                self.root.to_string_lossy(),
                FailureKind::NotReadable(err.to_string()),
            )));
        };

        if err.loop_ancestor().is_none() && is_not_found(&err) {
            // Either a dangling link or an entry removed mid-walk
            let is_link = std::fs::symlink_metadata(&path)
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false);
            if !is_link {
                debug!(path = %path.display(), "Entry vanished during scan");
                return None;
            }
            return Some(ScanItem::Failure(FileFailure::new(
                self.display_path(&path),
                FailureKind::BrokenLink,
            )));
        }

        Some(ScanItem::Failure(FileFailure::new(
            self.display_path(&path),
            FailureKind::NotReadable(err.to_string()),
        )))
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name();
        self.config
            .excluded_names
            .iter()
            .any(|excluded| name == std::ffi::OsStr::new(excluded))
    }

    /// Check if an entry should be ignored based on ignore patterns
    fn should_ignore(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name();
        self.config
            .ignore_patterns
            .iter()
            .any(|pattern| name == std::ffi::OsStr::new(pattern))
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|e| e.kind() == ErrorKind::NotFound)
        .unwrap_or(false)
}
