//! Live filesystem side of a manifest
//!
//! Walks the tracked root and computes content hashes for the files the
//! reconciler decides it cannot trust.

pub mod hasher;
pub mod path;
pub mod walker;
