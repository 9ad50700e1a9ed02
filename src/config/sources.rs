//! File sources: the user's global config and the per-root config.

pub mod global_file;
pub mod workspace_file;
