//! Subtree extraction

use crate::store::EntryStore;
use crate::types::RelPath;

/// Entries strictly underneath `prefix`
///
/// With `rebase`, keys become relative to `prefix`. A file whose path equals
/// `prefix` is not part of the subtree.
pub fn extract_subtree(store: &EntryStore, prefix: &RelPath, rebase: bool) -> EntryStore {
    store
        .iter()
        .filter_map(|(path, entry)| {
            let stripped = path.strip_prefix(prefix)?;
            let key = if rebase { stripped } else { path.clone() };
            Some((key, *entry))
        })
        .collect()
}
