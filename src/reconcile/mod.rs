//! Reconciliation engine
//!
//! Compares a stored manifest against a live scan of the same root, classifies
//! each path, hashes only the files whose metadata cannot be trusted, and
//! produces a [`DiffReport`] together with the updated [`EntryStore`].
//!
//! Runs in three phases: a classification pass that touches no file content,
//! a hashing pass over read-only snapshots (optionally spread over worker
//! threads), and a single sequential reduction that builds the report and the
//! new store. Classification of a path never depends on any other path, so the
//! result is independent of scan order.

pub mod report;

pub use report::{DiffReport, Reconciliation};

use crate::error::{FailureKind, FileFailure, HashError};
use crate::store::{Entry, EntryStore};
use crate::tree::hasher::ContentHasher;
use crate::tree::walker::ScanResult;
use crate::types::{ContentHash, FileStat, RelPath};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Knobs that select between status, update, and verify behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Hash added and modified files and record the new hashes
    pub hash_on_demand: bool,
    /// Unchanged size and mtime imply unchanged content (no hashing)
    pub trust_mtime: bool,
    /// Under verification, refresh stored metadata for files whose content
    /// still matches the manifest
    pub update_mtimes: bool,
    /// Treat permission-bit changes as modifications
    pub compare_permissions: bool,
    /// Hashing worker threads; 1 hashes sequentially
    pub jobs: usize,
}

impl ReconcileOptions {
    /// Report differences from metadata alone; never reads file content.
    pub fn status() -> Self {
        Self {
            hash_on_demand: false,
            trust_mtime: true,
            update_mtimes: false,
            compare_permissions: false,
            jobs: 1,
        }
    }

    /// Hash new and changed files and fold them into the manifest.
    pub fn update() -> Self {
        Self {
            hash_on_demand: true,
            ..Self::status()
        }
    }

    /// Re-hash every tracked file regardless of metadata.
    pub fn verify() -> Self {
        Self {
            trust_mtime: false,
            ..Self::status()
        }
    }

    pub fn with_update_mtimes(mut self, update_mtimes: bool) -> Self {
        self.update_mtimes = update_mtimes;
        self
    }

    pub fn with_compare_permissions(mut self, compare_permissions: bool) -> Self {
        self.compare_permissions = compare_permissions;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self::update()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    /// Untracked file that gets a fresh entry
    Added,
    /// Tracked file whose metadata changed
    Changed,
    /// Tracked file with unchanged metadata, hashed to detect silent drift
    Verify,
}

#[derive(Debug)]
struct HashJob {
    path: RelPath,
    stat: FileStat,
    kind: JobKind,
}

/// Reconciles one manifest against one scan of its root
pub struct Reconciler<'a, H: ContentHasher + ?Sized> {
    root: &'a Path,
    hasher: &'a H,
    options: ReconcileOptions,
}

impl<'a, H: ContentHasher + ?Sized> Reconciler<'a, H> {
    pub fn new(root: &'a Path, hasher: &'a H, options: ReconcileOptions) -> Self {
        Self {
            root,
            hasher,
            options,
        }
    }

    /// Classify every path and build the updated manifest
    ///
    /// `stored` and `scan` are only read. Per-file hashing failures are
    /// collected in the result and never abort the run.
    #[instrument(skip_all, fields(root = %self.root.display(), stored = stored.len(), scanned = scan.files.len()))]
    pub fn reconcile(&self, stored: &EntryStore, scan: &ScanResult) -> Reconciliation {
        let started = Instant::now();
        let mut report = DiffReport::default();
        let mut next = EntryStore::new();
        let mut failures = scan.failures.clone();
        let mut jobs = Vec::new();

        for (path, entry) in stored {
            let Some(stat) = scan.get(path) else {
                if scan.is_obscured(path) {
                    debug!(path = %path, "Path not observed by scan; keeping entry");
                    next.insert(path.clone(), *entry);
                } else {
                    report.removed.insert(path.clone());
                }
                continue;
            };

            // Carried forward; hashing results may replace or drop it later
            next.insert(path.clone(), *entry);

            let metadata_matches = entry.matches_stat(stat, self.options.compare_permissions);
            if metadata_matches && self.options.trust_mtime {
                report.unchanged += 1;
            } else if metadata_matches {
                jobs.push(HashJob {
                    path: path.clone(),
                    stat: *stat,
                    kind: JobKind::Verify,
                });
            } else if self.options.hash_on_demand
                || (!self.options.trust_mtime && self.options.update_mtimes)
            {
                jobs.push(HashJob {
                    path: path.clone(),
                    stat: *stat,
                    kind: JobKind::Changed,
                });
            } else {
                report.modified.insert(path.clone());
            }
        }

        for (path, stat) in &scan.files {
            if stored.contains(path) {
                continue;
            }
            if self.options.hash_on_demand {
                jobs.push(HashJob {
                    path: path.clone(),
                    stat: *stat,
                    kind: JobKind::Added,
                });
            } else {
                report.added.insert(path.clone());
            }
        }

        let results = self.hash_all(&jobs);
        report.hashed = jobs.len();

        for (job, result) in jobs.into_iter().zip(results) {
            self.apply(job, result, stored, &mut report, &mut next, &mut failures);
        }

        info!(
            added = report.added.len(),
            removed = report.removed.len(),
            modified = report.modified.len(),
            corruption = report.corruption.len(),
            unchanged = report.unchanged,
            hashed = report.hashed,
            failures = failures.len(),
            duration_ms = started.elapsed().as_millis(),
            "Reconciliation completed"
        );

        Reconciliation {
            report,
            store: next,
            failures,
        }
    }

    fn apply(
        &self,
        job: HashJob,
        result: Result<ContentHash, HashError>,
        stored: &EntryStore,
        report: &mut DiffReport,
        next: &mut EntryStore,
        failures: &mut Vec<FileFailure>,
    ) {
        let HashJob { path, stat, kind } = job;

        let hash = match result {
            Ok(hash) => hash,
            Err(HashError::Vanished(_)) => {
                debug!(path = %path, "File vanished before hashing");
                if kind != JobKind::Added {
                    next.remove(&path);
                    report.removed.insert(path);
                }
                return;
            }
            Err(HashError::Unreadable { source, .. }) => {
                warn!(path = %path, error = %source, "Failed to hash file");
                failures.push(FileFailure::new(
                    path.as_str(),
                    FailureKind::NotReadable(source.to_string()),
                ));
                match kind {
                    JobKind::Added => {
                        report.added.insert(path);
                    }
                    JobKind::Changed => {
                        report.modified.insert(path);
                    }
                    JobKind::Verify => {}
                }
                return;
            }
        };

        match kind {
            JobKind::Added => {
                next.insert(path.clone(), Entry::from_stat(&stat, hash));
                report.added.insert(path);
            }
            JobKind::Changed if self.options.hash_on_demand => {
                next.insert(path.clone(), Entry::from_stat(&stat, hash));
                report.modified.insert(path);
            }
            JobKind::Changed => match stored.get(&path) {
                Some(recorded) if self.options.update_mtimes && recorded.hash == hash => {
                    next.insert(path.clone(), recorded.with_stat(&stat));
                    report.mtime_refreshed.insert(path);
                }
                _ => {
                    report.modified.insert(path);
                }
            },
            JobKind::Verify => {
                let recorded = stored.get(&path).map(|e| e.hash);
                if recorded == Some(hash) {
                    report.unchanged += 1;
                } else {
                    warn!(path = %path, "Content changed without a metadata change");
                    report.corruption.insert(path);
                }
            }
        }
    }

    fn hash_one(&self, job: &HashJob) -> Result<ContentHash, HashError> {
        self.hasher.hash_file(&job.path.to_path(self.root))
    }

    /// Hash every job, preserving job order in the returned results
    fn hash_all(&self, jobs: &[HashJob]) -> Vec<Result<ContentHash, HashError>> {
        let workers = self.options.jobs.clamp(1, jobs.len().max(1));
        if workers == 1 {
            return jobs.iter().map(|job| self.hash_one(job)).collect();
        }

        let chunk_size = (jobs.len() + workers - 1) / workers;
        debug!(workers, chunk_size, jobs = jobs.len(), "Hashing in parallel");
        std::thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .chunks(chunk_size)
                .map(|slice| {
                    scope.spawn(move || {
                        slice
                            .iter()
                            .map(|job| self.hash_one(job))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    }
}
