//! Entry point for loading [`HashDbConfig`].

use super::merge::{builder_with_defaults, with_environment};
use super::sources::{global_file, workspace_file};
use super::HashDbConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

/// Loads configuration from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, then `<root>/.hash_db.toml`, then
    /// environment overrides.
    pub fn load(root: &Path) -> Result<HashDbConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, root)?;
        let config: HashDbConfig = with_environment(builder).build()?.try_deserialize()?;
        debug!(root = %root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Defaults, then exactly one explicit file, then environment overrides.
    pub fn load_from_file(path: &Path) -> Result<HashDbConfig, ConfigError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        with_environment(builder).build()?.try_deserialize()
    }
}
