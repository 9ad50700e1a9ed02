//! Workspace command service: single entry point per CLI command.
//!
//! Owns load, scan, reconcile, and store orchestration; the CLI parses, calls
//! one method per command, and formats the returned [`CommandOutcome`].

use super::{CommandKind, CommandOutcome, RunFlags, Workspace};
use crate::error::{ApiError, StorageError};
use crate::import;
use crate::listing::{self, DEFAULT_EXPORT_NAME};
use crate::reconcile::{ReconcileOptions, Reconciler, Reconciliation};
use crate::split::extract_subtree;
use crate::store::persistence::write_atomic;
use crate::store::{EntryStore, JsonManifestStore, ManifestStore};
use crate::types::RelPath;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Where `export` sends the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDestination {
    Stdout,
    File(PathBuf),
}

impl ExportDestination {
    /// `None` → `<root>/SHA512SUM`, `-` → stdout, otherwise the given path.
    pub fn resolve(root: &Path, output: Option<&Path>) -> Self {
        match output {
            None => ExportDestination::File(root.join(DEFAULT_EXPORT_NAME)),
            Some(path) if path == Path::new("-") => ExportDestination::Stdout,
            Some(path) => ExportDestination::File(path.to_path_buf()),
        }
    }
}

/// Stateless workspace command service.
pub struct WorkspaceCommandService;

impl WorkspaceCommandService {
    /// Create a manifest for a root that has none, hashing every file.
    #[instrument(skip_all, fields(root = %workspace.root().display()))]
    pub fn init(workspace: &Workspace, flags: RunFlags) -> Result<CommandOutcome, ApiError> {
        let manifest = workspace.manifest();
        ensure_absent(&manifest)?;

        let result = reconcile(workspace, &EntryStore::new(), ReconcileOptions::update());
        let entries = result.store.len();
        let message = if flags.pretend {
            format!("Dry run: manifest would track {} files", entries)
        } else {
            manifest.store(&result.store)?;
            info!(entries, "Initialized manifest");
            format!(
                "Initialized {} with {} files",
                manifest.path().display(),
                entries
            )
        };

        Ok(reconciled(CommandKind::Init, result, message))
    }

    /// Fold added, removed, and modified files into the manifest.
    #[instrument(skip_all, fields(root = %workspace.root().display()))]
    pub fn update(workspace: &Workspace, flags: RunFlags) -> Result<CommandOutcome, ApiError> {
        let manifest = workspace.manifest();
        let stored = manifest.load()?;

        let result = reconcile(workspace, &stored, ReconcileOptions::update());
        let message = if !result.report.changes_manifest() {
            "Manifest is up to date".to_string()
        } else if flags.pretend {
            "Dry run: manifest not written".to_string()
        } else {
            manifest.store(&result.store)?;
            format!("Manifest updated ({} files)", result.store.len())
        };

        Ok(reconciled(CommandKind::Update, result, message))
    }

    /// Report differences from metadata alone. Never writes.
    #[instrument(skip_all, fields(root = %workspace.root().display()))]
    pub fn status(workspace: &Workspace) -> Result<CommandOutcome, ApiError> {
        let stored = workspace.manifest().load()?;
        let result = reconcile(workspace, &stored, ReconcileOptions::status());
        let message = format!("{} files unchanged", result.report.unchanged);
        Ok(reconciled(CommandKind::Status, result, message))
    }

    /// Re-hash every tracked file and compare against the manifest
    ///
    /// With `update_mtimes`, entries whose metadata changed but whose content
    /// still matches get their metadata refreshed; nothing else is written.
    #[instrument(skip_all, fields(root = %workspace.root().display(), update_mtimes = update_mtimes))]
    pub fn verify(
        workspace: &Workspace,
        update_mtimes: bool,
        flags: RunFlags,
    ) -> Result<CommandOutcome, ApiError> {
        let manifest = workspace.manifest();
        let stored = manifest.load()?;

        let options = ReconcileOptions::verify().with_update_mtimes(update_mtimes);
        let result = reconcile(workspace, &stored, options);

        let refreshed = &result.report.mtime_refreshed;
        let message = if refreshed.is_empty() {
            format!("Verified {} files", result.report.hashed)
        } else if flags.pretend {
            format!(
                "Dry run: metadata of {} files would be refreshed",
                refreshed.len()
            )
        } else {
            let mut updated = stored.clone();
            for path in refreshed {
                if let Some(entry) = result.store.get(path) {
                    updated.insert(path.clone(), *entry);
                }
            }
            manifest.store(&updated)?;
            format!(
                "Verified {} files; refreshed metadata of {}",
                result.report.hashed,
                refreshed.len()
            )
        };

        Ok(reconciled(CommandKind::Verify, result, message))
    }

    /// Build a manifest from `sha512sum` listings without hashing
    ///
    /// With no listing paths, every `SHA512SUM` / `SHA512SUM.asc` under the
    /// root is used.
    #[instrument(skip_all, fields(root = %workspace.root().display(), listings = listings.len()))]
    pub fn import(
        workspace: &Workspace,
        listings: &[PathBuf],
        flags: RunFlags,
    ) -> Result<CommandOutcome, ApiError> {
        let manifest = workspace.manifest();
        ensure_absent(&manifest)?;

        let scan = workspace.walker().scan();
        let paths: Vec<PathBuf> = if listings.is_empty() {
            import::discover_listings(&scan)
                .iter()
                .map(|path| path.to_path(workspace.root()))
                .collect()
        } else {
            listings.to_vec()
        };
        if paths.is_empty() {
            return Err(ApiError::InvalidArgument(format!(
                "no listing files given and none named {} found under {}",
                listing::LISTING_FILE_NAMES.join(" or "),
                workspace.root().display()
            )));
        }

        let sources = import::load_listings(workspace.root(), &paths)?;
        let result = import::import(&sources, &scan)?;

        let mut failures = scan.failures;
        failures.extend(result.failures);

        let summary = format!(
            "{} files from {} listing(s); {} untracked",
            result.store.len(),
            sources.len(),
            result.untracked.len()
        );
        let message = if flags.pretend {
            format!("Dry run: would import {}", summary)
        } else {
            manifest.store(&result.store)?;
            format!("Imported {}", summary)
        };

        Ok(CommandOutcome {
            failures,
            ..CommandOutcome::new(CommandKind::Import, message)
        })
    }

    /// Write the entries under `subdir` as that directory's own manifest.
    #[instrument(skip_all, fields(root = %workspace.root().display(), subdir = %subdir.display()))]
    pub fn split(
        workspace: &Workspace,
        subdir: &Path,
        flags: RunFlags,
    ) -> Result<CommandOutcome, ApiError> {
        let stored = workspace.manifest().load()?;
        let prefix = resolve_subdir(workspace.root(), subdir)?;

        let target = JsonManifestStore::for_root(
            &prefix.to_path(workspace.root()),
            &workspace.config().manifest.file_name,
        );
        ensure_absent(&target)?;

        let extracted = extract_subtree(&stored, &prefix, true);
        let message = if flags.pretend {
            format!(
                "Dry run: {} would track {} files",
                target.path().display(),
                extracted.len()
            )
        } else {
            target.store(&extracted)?;
            format!(
                "Wrote {} with {} files",
                target.path().display(),
                extracted.len()
            )
        };

        Ok(CommandOutcome::new(CommandKind::Split, message))
    }

    /// Render the manifest as a `sha512sum -c` compatible listing.
    #[instrument(skip_all, fields(root = %workspace.root().display()))]
    pub fn export(
        workspace: &Workspace,
        output: Option<&Path>,
        flags: RunFlags,
    ) -> Result<CommandOutcome, ApiError> {
        let stored = workspace.manifest().load()?;
        let text = listing::render(&stored);

        match ExportDestination::resolve(workspace.root(), output) {
            ExportDestination::Stdout => Ok(CommandOutcome {
                listing: Some(text),
                ..CommandOutcome::new(CommandKind::Export, "")
            }),
            ExportDestination::File(path) => {
                let message = if flags.pretend {
                    format!(
                        "Dry run: {} entries would be written to {}",
                        stored.len(),
                        path.display()
                    )
                } else {
                    write_atomic(&path, |writer| writer.write_all(text.as_bytes()))?;
                    format!("Exported {} entries to {}", stored.len(), path.display())
                };
                Ok(CommandOutcome::new(CommandKind::Export, message))
            }
        }
    }
}

fn reconcile(workspace: &Workspace, stored: &EntryStore, preset: ReconcileOptions) -> Reconciliation {
    let scan = workspace.walker().scan();
    let hasher = workspace.hasher();
    let options = workspace.reconcile_options(preset);
    Reconciler::new(workspace.root(), &hasher, options).reconcile(stored, &scan)
}

fn reconciled(command: CommandKind, result: Reconciliation, message: String) -> CommandOutcome {
    CommandOutcome {
        report: Some(result.report),
        failures: result.failures,
        ..CommandOutcome::new(command, message)
    }
}

fn ensure_absent(manifest: &JsonManifestStore) -> Result<(), ApiError> {
    if manifest.exists() {
        return Err(StorageError::ManifestExists(manifest.path().to_path_buf()).into());
    }
    Ok(())
}

/// Resolve a subdirectory argument to a root-relative key
///
/// Relative arguments are taken relative to the root.
fn resolve_subdir(root: &Path, subdir: &Path) -> Result<RelPath, ApiError> {
    let candidate = if subdir.is_absolute() {
        subdir.to_path_buf()
    } else {
        root.join(subdir)
    };
    let canonical = dunce::canonicalize(&candidate).map_err(|e| {
        ApiError::InvalidArgument(format!("{}: {}", candidate.display(), e))
    })?;
    if !canonical.is_dir() {
        return Err(ApiError::InvalidArgument(format!(
            "{} is not a directory",
            canonical.display()
        )));
    }
    canonical
        .strip_prefix(root)
        .ok()
        .and_then(RelPath::from_relative_path)
        .ok_or_else(|| {
            ApiError::InvalidArgument(format!(
                "{} is not a subdirectory of {}",
                subdir.display(),
                root.display()
            ))
        })
}
