//! Workspace config layers under `{workspace}/config/`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Selects the environment overlay, e.g. `BRIEFGEN_ENV=production` loads `production.toml`.
pub const ENV_SELECTOR: &str = "BRIEFGEN_ENV";
const DEFAULT_ENV: &str = "development";

/// Candidate files in increasing precedence: the shared base, then the environment overlay.
pub fn layer_paths(workspace_root: &Path) -> [PathBuf; 2] {
    let dir = workspace_root.join("config");
    let env_name = std::env::var(ENV_SELECTOR)
        .ok()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());
    [dir.join("config.toml"), dir.join(format!("{}.toml", env_name))]
}

/// Add every workspace layer that exists on disk.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(layer_paths(workspace_root)
        .into_iter()
        .filter(|path| path.is_file())
        .fold(builder, |builder, path| {
            debug!(config_path = %path.display(), "Applying workspace configuration");
            builder.add_source(File::from(path).required(true))
        }))
}
