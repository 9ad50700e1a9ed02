//! Merge rules: defaults first, environment last.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix for `HASHDB__SECTION__KEY` overrides
pub const ENV_PREFIX: &str = "HASHDB";

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("manifest.file_name", crate::store::persistence::DEFAULT_MANIFEST_NAME)?
        .set_default("scan.symlinks", "follow")?
        .set_default("reconcile.jobs", 1_i64)?
        .set_default(
            "reconcile.chunk_size",
            crate::tree::hasher::DEFAULT_CHUNK_SIZE as i64,
        )?
        .set_default("reconcile.compare_permissions", false)?
        .set_default("output.color", true)?
        .set_default("output.verbose_failures", false)
}

/// Environment overrides win over every file source.
pub fn with_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
