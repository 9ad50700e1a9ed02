//! Path canonicalization and normalization utilities

use crate::error::StorageError;
use std::path::{Path, PathBuf};

/// Canonicalize the scan root
///
/// Resolves symlinks, `..` and `.` so that the walker and the manifest agree on
/// what "the root" is. Uses dunce to avoid UNC prefixes on Windows.
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, StorageError> {
    let canonical = dunce::canonicalize(path).map_err(|e| {
        StorageError::InvalidPath(format!("Failed to canonicalize {:?}: {}", path, e))
    })?;
    if !canonical.is_dir() {
        return Err(StorageError::InvalidPath(format!(
            "{} is not a directory",
            canonical.display()
        )));
    }
    Ok(canonical)
}

/// Normalize a `/`-separated relative path string (without filesystem access)
///
/// Drops empty and `.` components, collapses `..` against the preceding
/// component, and rejects absolute paths or paths that climb above their base.
pub fn normalize_relative(raw: &str) -> Result<String, String> {
    if raw.starts_with('/') {
        return Err(format!("path {:?} is absolute", raw));
    }

    let mut parts: Vec<&str> = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(format!("path {:?} escapes its base directory", raw));
                }
            }
            name => parts.push(name),
        }
    }

    if parts.is_empty() {
        return Err(format!("path {:?} is empty", raw));
    }
    Ok(parts.join("/"))
}
