//! Importer/Merger: builds an Entry Store from foreign hash listings
//!
//! Hashes come from the listings, metadata from the live scan. Content is
//! never read.

use crate::error::{ApiError, FailureKind, FileFailure};
use crate::listing::{self, ListingEntry, LISTING_FILE_NAMES};
use crate::store::{Entry, EntryStore};
use crate::tree::walker::ScanResult;
use crate::types::{ContentHash, RelPath};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// A parsed listing and the root-relative directory its paths are relative to
#[derive(Debug, Clone)]
pub struct ListingSource {
    pub name: String,
    pub base: Option<RelPath>,
    pub entries: Vec<ListingEntry>,
}

impl ListingSource {
    /// Entries with their paths rebased onto the root.
    pub fn rooted_entries(&self) -> impl Iterator<Item = (RelPath, ContentHash)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.path.rebase(self.base.as_ref()), entry.hash))
    }
}

/// Outcome of a successful import
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub store: EntryStore,
    /// Listed paths absent from the live scan
    pub failures: Vec<FileFailure>,
    /// Files on disk that no listing mentions
    pub untracked: BTreeSet<RelPath>,
}

/// Listing files found by a scan, in path order
///
/// Listings are normally excluded from tracking, so both tracked and excluded
/// files are searched.
pub fn discover_listings(scan: &ScanResult) -> Vec<RelPath> {
    scan.files
        .keys()
        .chain(&scan.excluded)
        .filter(|path| {
            let name = path.as_str().rsplit('/').next().unwrap_or_default();
            LISTING_FILE_NAMES.contains(&name)
        })
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Read and parse every listing file
///
/// A listing that cannot be read or parsed does not stop the others; when any
/// failed, the error names all of them.
#[instrument(skip_all, fields(root = %root.display(), listings = paths.len()))]
pub fn load_listings(root: &Path, paths: &[PathBuf]) -> Result<Vec<ListingSource>, ApiError> {
    let mut sources = Vec::with_capacity(paths.len());
    let mut errors = Vec::new();

    for path in paths {
        match load_listing(root, path) {
            Ok(source) => {
                debug!(listing = %source.name, entries = source.entries.len(), "Parsed listing");
                sources.push(source);
            }
            Err(err) => {
                warn!(listing = %path.display(), error = %err, "Listing rejected");
                errors.push(err);
            }
        }
    }

    if errors.is_empty() {
        Ok(sources)
    } else {
        Err(ApiError::ImportFailed(errors))
    }
}

fn load_listing(root: &Path, path: &Path) -> Result<ListingSource, ApiError> {
    let name = path.display().to_string();
    let bytes = fs::read(path).map_err(|e| ApiError::UnrecognizedFormat {
        source_name: name.clone(),
        line: 0,
        reason: format!("cannot read listing: {}", e),
    })?;
    let entries = listing::parse_bytes(&name, &bytes)?;
    Ok(ListingSource {
        base: listing_base(root, path),
        name,
        entries,
    })
}

/// Directory of `listing` relative to `root`
///
/// Listings outside the root are treated as root-relative.
fn listing_base(root: &Path, listing: &Path) -> Option<RelPath> {
    let canonical = dunce::canonicalize(listing).ok()?;
    let parent = canonical.parent()?;
    let rel = parent.strip_prefix(root).ok()?;
    RelPath::from_relative_path(rel)
}

/// Merge listings into one path → hash map
///
/// Identical duplicates collapse; the first disagreement aborts with a
/// conflict naming both listings.
pub fn merge_listings(
    sources: &[ListingSource],
) -> Result<BTreeMap<RelPath, (ContentHash, usize)>, ApiError> {
    let mut merged: BTreeMap<RelPath, (ContentHash, usize)> = BTreeMap::new();

    for (index, source) in sources.iter().enumerate() {
        for (path, hash) in source.rooted_entries() {
            match merged.entry(path) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert((hash, index));
                }
                btree_map::Entry::Occupied(slot) => {
                    let (existing, first) = *slot.get();
                    if existing != hash {
                        return Err(ApiError::HashConflict {
                            path: slot.key().clone(),
                            first: sources[first].name.clone(),
                            second: source.name.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(merged)
}

/// Build the imported Entry Store from merged hashes and a live scan.
pub fn import(sources: &[ListingSource], scan: &ScanResult) -> Result<ImportResult, ApiError> {
    let merged = merge_listings(sources)?;

    let mut store = EntryStore::new();
    let mut failures = Vec::new();
    for (path, (hash, _)) in &merged {
        match scan.get(path) {
            Some(stat) => {
                store.insert(path.clone(), Entry::from_stat(stat, *hash));
            }
            None if scan.is_obscured(path) || scan.excluded.contains(path) => {}
            None => failures.push(FileFailure::new(path.as_str(), FailureKind::Missing)),
        }
    }

    let untracked = scan
        .files
        .keys()
        .filter(|path| !merged.contains_key(*path))
        .cloned()
        .collect();

    info!(
        imported = store.len(),
        missing = failures.len(),
        "Imported listings"
    );
    Ok(ImportResult {
        store,
        failures,
        untracked,
    })
}
