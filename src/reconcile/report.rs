//! Reconciliation output: the diff report and the failure list.

use crate::error::FileFailure;
use crate::store::EntryStore;
use crate::types::RelPath;
use serde::Serialize;
use std::collections::BTreeSet;

/// Classification of every path that is not unchanged
///
/// The sets are disjoint. Unchanged paths are only counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// On disk, not in the manifest
    pub added: BTreeSet<RelPath>,
    /// In the manifest, not on disk
    pub removed: BTreeSet<RelPath>,
    /// Metadata differs from the manifest (or, under verification, content
    /// differs after a metadata change)
    pub modified: BTreeSet<RelPath>,
    /// Content differs although size and mtime did not change
    pub corruption: BTreeSet<RelPath>,
    /// Metadata changed but content did not; stored metadata was refreshed
    pub mtime_refreshed: BTreeSet<RelPath>,
    pub unchanged: usize,
    /// Number of files whose content was read during the run
    pub hashed: usize,
}

impl DiffReport {
    /// True when nothing changed relative to the manifest.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.corruption.is_empty()
            && self.mtime_refreshed.is_empty()
    }

    /// True when the run should change the stored manifest.
    pub fn changes_manifest(&self) -> bool {
        !self.added.is_empty()
            || !self.removed.is_empty()
            || !self.modified.is_empty()
            || !self.mtime_refreshed.is_empty()
    }
}

/// Everything one reconciliation produced
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub report: DiffReport,
    /// Updated manifest; the caller persists it or, on a dry run, drops it
    pub store: EntryStore,
    /// Per-path failures from the scan and from hashing
    pub failures: Vec<FileFailure>,
}

impl Reconciliation {
    /// No per-file failures and no corruption findings.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.report.corruption.is_empty()
    }
}
