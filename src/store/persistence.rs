//! Persistence layer for the Entry Store
//!
//! Manifests are JSON documents written through a temporary file, fsync, and
//! rename, so an interrupted write leaves the previous manifest intact.

use crate::error::StorageError;
use crate::store::{Entry, EntryStore, ManifestStore};
use crate::types::RelPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Current manifest document version
pub const MANIFEST_VERSION: u32 = 1;

/// Default manifest file name inside a tracked root
pub const DEFAULT_MANIFEST_NAME: &str = ".hash_db.json";

#[derive(Deserialize)]
struct ManifestDocument {
    version: u32,
    files: BTreeMap<RelPath, Entry>,
}

#[derive(Serialize)]
struct ManifestDocumentRef<'a> {
    version: u32,
    files: &'a BTreeMap<RelPath, Entry>,
}

/// JSON file implementation of [`ManifestStore`]
#[derive(Debug, Clone)]
pub struct JsonManifestStore {
    path: PathBuf,
}

impl JsonManifestStore {
    /// Create a store backed by the given manifest file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Manifest named `file_name` directly inside `root`
    pub fn for_root(root: &Path, file_name: &str) -> Self {
        Self::new(root.join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file used for atomic writes
    pub fn temp_path(&self) -> PathBuf {
        temp_path_for(&self.path)
    }

    fn corrupt(&self, reason: impl Into<String>) -> StorageError {
        StorageError::CorruptManifest {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl ManifestStore for JsonManifestStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    #[instrument(skip(self), fields(manifest = %self.path.display()))]
    fn load(&self) -> Result<EntryStore, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::ManifestNotFound(self.path.clone()))
            }
            Err(e) => return Err(StorageError::IoError(e)),
        };

        let document: ManifestDocument =
            serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;
        if document.version != MANIFEST_VERSION {
            return Err(self.corrupt(format!(
                "unsupported manifest version {} (expected {})",
                document.version, MANIFEST_VERSION
            )));
        }

        debug!(entries = document.files.len(), "Loaded manifest");
        Ok(EntryStore::from(document.files))
    }

    #[instrument(skip(self, entries), fields(manifest = %self.path.display(), entries = entries.len()))]
    fn store(&self, entries: &EntryStore) -> Result<(), StorageError> {
        let document = ManifestDocumentRef {
            version: MANIFEST_VERSION,
            files: entries.as_map(),
        };
        write_atomic(&self.path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, &document)
                .map_err(|e| std::io::Error::new(ErrorKind::Other, e))?;
            writer.write_all(b"\n")
        })?;
        debug!("Stored manifest");
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a file through a temporary sibling and rename it into place
///
/// The temporary file is synced before the rename and removed on any error.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), StorageError>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> std::io::Result<()>,
{
    let temp_path = temp_path_for(path);

    let result = (|| -> std::io::Result<()> {
        let file = fs::File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(StorageError::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to write {:?}: {}", path, e),
        )));
    }
    Ok(())
}
