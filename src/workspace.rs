//! Workspace domain: one tracked root, its manifest, and the commands run
//! against it.

mod commands;

pub use commands::{ExportDestination, WorkspaceCommandService};

use crate::config::HashDbConfig;
use crate::error::{ApiError, FileFailure};
use crate::listing::LISTING_FILE_NAMES;
use crate::reconcile::{DiffReport, ReconcileOptions};
use crate::store::JsonManifestStore;
use crate::tree::hasher::Sha512Hasher;
use crate::tree::path::canonicalize_root;
use crate::tree::walker::{Walker, WalkerConfig};
use std::path::{Path, PathBuf};

/// A tracked root with its effective configuration
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    config: HashDbConfig,
}

impl Workspace {
    /// Resolve `root` and check the configuration.
    pub fn open(root: &Path, config: HashDbConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;
        let root = canonicalize_root(root)?;
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &HashDbConfig {
        &self.config
    }

    pub fn manifest(&self) -> JsonManifestStore {
        JsonManifestStore::for_root(&self.root, &self.config.manifest.file_name)
    }

    /// Walker over the root that never tracks manifests or exported listings
    ///
    /// Matched by file name in every directory, so split-off manifests and
    /// listings written by `export` stay out of the parent's manifest.
    pub fn walker(&self) -> Walker {
        let excluded_names = std::iter::once(self.config.manifest.file_name.as_str())
            .chain(LISTING_FILE_NAMES.iter().copied())
            .flat_map(|name| [name.to_string(), format!("{}.tmp", name)])
            .collect();
        Walker::with_config(
            self.root.clone(),
            WalkerConfig {
                symlinks: self.config.scan.symlinks,
                ignore_patterns: self.config.scan.ignore_patterns.clone(),
                excluded_names,
            },
        )
    }

    pub fn hasher(&self) -> Sha512Hasher {
        Sha512Hasher::with_chunk_size(self.config.reconcile.chunk_size)
    }

    /// Apply configured jobs and permission comparison to a command preset.
    pub fn reconcile_options(&self, preset: ReconcileOptions) -> ReconcileOptions {
        preset
            .with_jobs(self.config.reconcile.jobs)
            .with_compare_permissions(self.config.reconcile.compare_permissions)
    }
}

/// Flags shared by every command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunFlags {
    /// Report what would change without writing anything
    pub pretend: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Init,
    Update,
    Status,
    Verify,
    Import,
    Split,
    Export,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Init => "init",
            CommandKind::Update => "update",
            CommandKind::Status => "status",
            CommandKind::Verify => "verify",
            CommandKind::Import => "import",
            CommandKind::Split => "split",
            CommandKind::Export => "export",
        }
    }
}

/// Structured result of one command, rendered by the CLI
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub command: CommandKind,
    pub report: Option<DiffReport>,
    pub failures: Vec<FileFailure>,
    pub message: String,
    /// Listing text destined for stdout (export to `-`)
    pub listing: Option<String>,
}

impl CommandOutcome {
    fn new(command: CommandKind, message: impl Into<String>) -> Self {
        Self {
            command,
            report: None,
            failures: Vec::new(),
            message: message.into(),
            listing: None,
        }
    }

    /// No per-file failures and no corruption findings.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
            && self
                .report
                .as_ref()
                .map_or(true, |report| report.corruption.is_empty())
    }
}
