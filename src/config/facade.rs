//! Config loader: composes sources in precedence order and deserializes the result.

use crate::config::merge::builder_with_defaults;
use crate::config::sources::{env, global_file, workspace_file};
use crate::config::BriefgenConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Sources (lowest to highest precedence): defaults, global file, workspace
    /// `config/config.toml`, workspace `config/{BRIEFGEN_ENV}.toml`, environment.
    pub fn load(workspace_root: &Path) -> Result<BriefgenConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = env::add_to_builder(builder);

        let mut config: BriefgenConfig = builder.build()?.try_deserialize()?;
        if config.workspace_root.is_none() {
            config.workspace_root = Some(workspace_root.to_path_buf());
        }
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load from one explicit file, skipping the global and workspace files.
    pub fn load_from_file(path: &Path) -> Result<BriefgenConfig, ConfigError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        let builder = env::add_to_builder(builder);

        let mut config: BriefgenConfig = builder.build()?.try_deserialize()?;
        if config.workspace_root.is_none() {
            config.workspace_root = path.parent().map(Path::to_path_buf);
        }
        Ok(config)
    }

    /// Path of the global config file, if a home directory is known.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
