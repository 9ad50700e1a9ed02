//! Entry Store
//!
//! The in-memory manifest: one [`Entry`] per tracked file, keyed by its
//! root-relative path. Holds no logic beyond storage and lookup; persistence is
//! behind the [`ManifestStore`] trait.

pub mod persistence;

pub use persistence::JsonManifestStore;

use crate::error::StorageError;
use crate::types::{ContentHash, FileStat, Mtime, RelPath};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Metadata recorded for one tracked file
///
/// `hash` matches the content as of the last time `size`/`mtime` were
/// observed together with it; it is not re-checked on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub size: u64,
    pub mtime: Mtime,
    pub hash: ContentHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

impl Entry {
    pub fn from_stat(stat: &FileStat, hash: ContentHash) -> Self {
        Self {
            size: stat.size,
            mtime: stat.mtime,
            hash,
            mode: stat.mode,
        }
    }

    /// Exact comparison of recorded metadata against a fresh stat.
    ///
    /// Permission bits only participate when `compare_permissions` is set and
    /// both sides know them.
    pub fn matches_stat(&self, stat: &FileStat, compare_permissions: bool) -> bool {
        if self.size != stat.size || self.mtime != stat.mtime {
            return false;
        }
        match (compare_permissions, self.mode, stat.mode) {
            (true, Some(recorded), Some(current)) => recorded == current,
            _ => true,
        }
    }

    /// Same content hash, metadata refreshed from `stat`.
    pub fn with_stat(&self, stat: &FileStat) -> Self {
        Self::from_stat(stat, self.hash)
    }
}

/// Path → Entry mapping with a single owner per invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStore {
    entries: BTreeMap<RelPath, Entry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &RelPath) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &RelPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert or replace, returning the previous entry.
    pub fn insert(&mut self, path: RelPath, entry: Entry) -> Option<Entry> {
        self.entries.insert(path, entry)
    }

    pub fn remove(&mut self, path: &RelPath) -> Option<Entry> {
        self.entries.remove(path)
    }

    /// Entries in path order.
    pub fn iter(&self) -> btree_map::Iter<'_, RelPath, Entry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &RelPath> {
        self.entries.keys()
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<RelPath, Entry> {
        &self.entries
    }
}

impl From<BTreeMap<RelPath, Entry>> for EntryStore {
    fn from(entries: BTreeMap<RelPath, Entry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(RelPath, Entry)> for EntryStore {
    fn from_iter<I: IntoIterator<Item = (RelPath, Entry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EntryStore {
    type Item = (RelPath, Entry);
    type IntoIter = btree_map::IntoIter<RelPath, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntryStore {
    type Item = (&'a RelPath, &'a Entry);
    type IntoIter = btree_map::Iter<'a, RelPath, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Load/store boundary for manifests
///
/// `store` must be atomic: a reader never observes a half-written manifest.
pub trait ManifestStore {
    fn exists(&self) -> bool;
    fn load(&self) -> Result<EntryStore, StorageError>;
    fn store(&self, entries: &EntryStore) -> Result<(), StorageError>;
}
