//! Error types for the hashdb manifest and reconciliation system.

use crate::types::RelPath;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Corrupt manifest {path:?}: {reason}")]
    CorruptManifest { path: PathBuf, reason: String },

    #[error("No manifest found at {0:?}. Run `hashdb init` or `hashdb import` first.")]
    ManifestNotFound(PathBuf),

    #[error("A manifest already exists at {0:?}")]
    ManifestExists(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Failure to read a file's content while hashing.
///
/// Both variants are "file not readable" conditions; `Vanished` is split out so
/// a file deleted between scan and hash can be reconciled as absent.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("File vanished before it could be hashed: {0:?}")]
    Vanished(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            HashError::Vanished(path)
        } else {
            HashError::Unreadable { path, source }
        }
    }
}

/// Top-level errors for hashdb operations
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Unrecognized listing format in {source_name} (line {line}): {reason}")]
    UnrecognizedFormat {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("Import failed for {} listing(s):\n  {}", .0.len(), join_errors(.0))]
    ImportFailed(Vec<ApiError>),

    #[error("Conflicting hashes for {path}: {first} and {second} disagree")]
    HashConflict {
        path: RelPath,
        first: String,
        second: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

fn join_errors(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n  ")
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::StorageError(StorageError::IoError(err))
    }
}

/// Per-path failure recorded during a run. Never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureKind {
    /// Metadata or content could not be read (permission denied, I/O error).
    NotReadable(String),
    /// Named by an imported listing but not present on disk.
    Missing,
    /// Symbolic link whose target does not exist.
    BrokenLink,
    /// Symbolic link encountered while links are rejected.
    SymlinkRejected,
    /// Name cannot be represented in the manifest (not valid UTF-8).
    UnrepresentablePath,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::NotReadable(detail) => write!(f, "not readable: {}", detail),
            FailureKind::Missing => write!(f, "listed but missing on disk"),
            FailureKind::BrokenLink => write!(f, "broken symbolic link"),
            FailureKind::SymlinkRejected => write!(f, "symbolic link rejected"),
            FailureKind::UnrepresentablePath => write!(f, "path is not valid UTF-8"),
        }
    }
}

/// A failure attached to the path it happened on.
///
/// `path` is display text: for unrepresentable names it is a lossy rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub kind: FailureKind,
}

impl FileFailure {
    pub fn new(path: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}
