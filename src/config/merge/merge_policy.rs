//! Merge rules: built-in defaults first, later sources override earlier ones key by key.

use crate::config::{DEFAULT_GENERATION_MODEL, DEFAULT_REMOVAL_MODEL, DEFAULT_SPECIFICATIONS_TABLE};
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("generator.provider_type", "huggingface")?
        .set_default("generator.model", DEFAULT_GENERATION_MODEL)?
        .set_default("remover.model", DEFAULT_REMOVAL_MODEL)?
        .set_default("specifications.table", DEFAULT_SPECIFICATIONS_TABLE)?
        .set_default("storage.root", "assets")
}
