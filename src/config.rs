//! Configuration System
//!
//! Layered configuration: built-in defaults, the user's global file, the
//! tracked root's `.hash_db.toml`, then `HASHDB__SECTION__KEY` environment
//! variables. CLI flags are applied on top by the caller.

use crate::logging::LoggingConfig;
use crate::store::persistence::DEFAULT_MANIFEST_NAME;
use crate::tree::hasher::DEFAULT_CHUNK_SIZE;
use crate::tree::walker::SymlinkPolicy;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::WORKSPACE_CONFIG_NAME;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HashDbConfig {
    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub reconcile: ReconcileConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the manifest lives inside a tracked root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// File name of the manifest, directly inside the root
    #[serde(default = "default_manifest_name")]
    pub file_name: String,
}

fn default_manifest_name() -> String {
    DEFAULT_MANIFEST_NAME.to_string()
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file_name: default_manifest_name(),
        }
    }
}

/// Directory scan settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub symlinks: SymlinkPolicy,

    /// File or directory names skipped anywhere under the root
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

/// Hashing and comparison settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Worker threads used for hashing
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Read buffer size for hashing (bytes)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Treat a permission-bit change as a modification
    #[serde(default)]
    pub compare_permissions: bool,
}

fn default_jobs() -> usize {
    1
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            chunk_size: default_chunk_size(),
            compare_permissions: false,
        }
    }
}

/// Report rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub color: bool,

    /// Print the reason next to every failed path
    #[serde(default)]
    pub verbose_failures: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            verbose_failures: false,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Manifest(String),
    Reconcile(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Manifest(msg) => write!(f, "manifest: {}", msg),
            ValidationError::Reconcile(msg) => write!(f, "reconcile: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ManifestConfig {
    pub fn validate(&self) -> Result<(), String> {
        let name = self.file_name.as_str();
        if name.is_empty() {
            return Err("file_name cannot be empty".to_string());
        }
        if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
            return Err(format!(
                "file_name must be a single path component, got '{}'",
                name
            ));
        }
        Ok(())
    }
}

impl ReconcileConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.jobs == 0 {
            errors.push("jobs must be at least 1".to_string());
        }
        if self.chunk_size == 0 {
            errors.push("chunk_size must be greater than 0".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl HashDbConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.manifest.validate() {
            errors.push(ValidationError::Manifest(e));
        }
        if let Err(reconcile_errors) = self.reconcile.validate() {
            errors.extend(reconcile_errors.into_iter().map(ValidationError::Reconcile));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
