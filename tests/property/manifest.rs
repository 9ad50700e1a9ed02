//! Property-based tests for manifest persistence

use hashdb::store::{Entry, EntryStore, JsonManifestStore, ManifestStore};
use hashdb::types::{ContentHash, Mtime, RelPath, HASH_LEN};
use proptest::prelude::*;
use proptest::test_runner::{Config, TestRunner};
use tempfile::TempDir;

fn entry_strategy() -> impl Strategy<Value = Entry> {
    (
        any::<u64>(),
        any::<i64>(),
        prop::collection::vec(any::<u8>(), HASH_LEN),
        any::<Option<u32>>(),
    )
        .prop_map(|(size, mtime, bytes, mode)| {
            let mut hash = [0u8; HASH_LEN];
            hash.copy_from_slice(&bytes);
            Entry {
                size,
                mtime: Mtime(mtime),
                hash: ContentHash(hash),
                mode,
            }
        })
}

fn path_strategy() -> impl Strategy<Value = RelPath> {
    "[a-zA-Z0-9 _.\"\\\\é-]{1,8}(/[a-zA-Z0-9 _.é-]{1,8}){0,3}"
        .prop_filter_map("not a valid relative path", |raw| RelPath::new(&raw).ok())
}

/// Whatever is stored is loaded back unchanged
#[test]
fn test_store_then_load_is_identity() {
    let mut runner = TestRunner::new(Config::with_cases(64));

    runner
        .run(
            &prop::collection::btree_map(path_strategy(), entry_strategy(), 0..16),
            |entries| {
                let temp_dir = TempDir::new().unwrap();
                let manifest = JsonManifestStore::new(temp_dir.path().join(".hash_db.json"));
                let store = EntryStore::from(entries);

                manifest.store(&store).unwrap();
                let loaded = manifest.load().unwrap();

                prop_assert_eq!(loaded, store);
                prop_assert!(!manifest.temp_path().exists());
                Ok(())
            },
        )
        .unwrap();
}
