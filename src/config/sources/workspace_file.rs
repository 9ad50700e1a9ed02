//! Per-root config file source: `<root>/.hash_db.toml`

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;
use tracing::debug;

/// File name of the per-root config
pub const WORKSPACE_CONFIG_NAME: &str = ".hash_db.toml";

/// Add the root's config file to builder when present.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = root.join(WORKSPACE_CONFIG_NAME);
    if !path.is_file() {
        return Ok(builder);
    }
    debug!(config_path = %path.display(), "Using root configuration");
    Ok(builder.add_source(File::from(path).required(false)))
}
