//! hashdb: persistent SHA-512 manifests for directory trees
//!
//! A manifest records size, mtime, and content hash for every regular file
//! under a root. Reconciling it against a fresh scan reports added, removed,
//! and modified files while hashing only what changed, and forced
//! verification detects content drift behind unchanged metadata.

pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod listing;
pub mod logging;
pub mod reconcile;
pub mod split;
pub mod store;
pub mod tree;
pub mod types;
pub mod workspace;
