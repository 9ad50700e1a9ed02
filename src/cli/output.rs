//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, StorageError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::StorageError(StorageError::ManifestNotFound(path)) => format!(
            "error: no manifest at {}; run `hashdb init` or `hashdb import` first",
            path.display()
        ),
        ApiError::StorageError(StorageError::ManifestExists(path)) => format!(
            "error: a manifest already exists at {}; refusing to overwrite it",
            path.display()
        ),
        other => format!("error: {}", other),
    }
}
