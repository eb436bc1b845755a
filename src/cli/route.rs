//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, ConfigCommands, OutputFormat};
use crate::cli::presentation::{
    format_config_validation, format_plan_json, format_plan_text, format_summary_json,
    format_summary_text,
};
use crate::config::{BriefgenConfig, ConfigLoader};
use crate::error::PipelineError;
use crate::generation::{plan_brief, BriefOrchestrator};
use crate::services::{spec_store_from_config, ServiceContext};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Runtime context for CLI execution: workspace and loaded configuration.
///
/// Collaborators are built per command so that `config` and `plan` work without
/// generation credentials.
pub struct RunContext {
    workspace_root: PathBuf,
    config: BriefgenConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PipelineError> {
        let config = load_config(&workspace_root, config_path.as_deref())?;
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: BriefgenConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &BriefgenConfig {
        &self.config
    }

    /// Execute a command and return its rendered output.
    pub fn execute(&self, command: &Commands) -> Result<String, PipelineError> {
        let started = Instant::now();
        let result = match command {
            Commands::Run { brief_id, format } => self.handle_run(brief_id, *format),
            Commands::Plan { brief_id, format } => self.handle_plan(brief_id, *format),
            Commands::Config { command } => self.handle_config(command),
        };
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn handle_run(&self, brief_id: &str, format: OutputFormat) -> Result<String, PipelineError> {
        let services = Arc::new(ServiceContext::from_config(&self.config)?);
        let orchestrator = BriefOrchestrator::new(services);
        let summary = block_on(orchestrator.process_brief(brief_id))?;
        Ok(match format {
            OutputFormat::Text => format_summary_text(&summary),
            OutputFormat::Json => format_summary_json(&summary),
        })
    }

    fn handle_plan(&self, brief_id: &str, format: OutputFormat) -> Result<String, PipelineError> {
        let store = spec_store_from_config(&self.config)?;
        let plan = block_on(plan_brief(store.as_ref(), brief_id))?;
        Ok(match format {
            OutputFormat::Text => format_plan_text(&plan),
            OutputFormat::Json => format_plan_json(&plan),
        })
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, PipelineError> {
        match command {
            ConfigCommands::Validate => match self.config.validate() {
                Ok(()) => Ok(format_config_validation(&[])),
                Err(errors) => Err(PipelineError::ConfigError(format_config_validation(&errors))),
            },
            ConfigCommands::Show => toml::to_string_pretty(&self.config.redacted())
                .map_err(|e| PipelineError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }
}

fn load_config(
    workspace_root: &Path,
    config_path: Option<&Path>,
) -> Result<BriefgenConfig, PipelineError> {
    let loaded = match config_path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(workspace_root),
    };
    loaded.map_err(|e| PipelineError::ConfigError(format!("Failed to load config: {}", e)))
}

fn block_on<F: Future>(future: F) -> Result<F::Output, PipelineError> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        PipelineError::ServicesUnavailable(format!("Failed to create async runtime: {}", e))
    })?;
    Ok(rt.block_on(future))
}

pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Run { .. } => "run",
        Commands::Plan { .. } => "plan",
        Commands::Config {
            command: ConfigCommands::Validate,
        } => "config validate",
        Commands::Config {
            command: ConfigCommands::Show,
        } => "config show",
    }
}
