//! Service context: the four collaborators a brief run needs, built once per process.

use crate::config::{BriefgenConfig, SpecificationsBackend, StorageBackend};
use crate::error::PipelineError;
use crate::provider::{BackgroundRemover, ImageGenerator, ProviderFactory};
use crate::specification::{JsonFileSpecificationStore, SpecificationStore};
use crate::storage::{FilesystemObjectStorage, ObjectStorage};
use crate::supabase::SupabaseClient;
use std::sync::Arc;
use tracing::{debug, info};

/// Collaborators shared by the orchestrator and the job runner.
///
/// `remover` is `None` when background removal is disabled.
pub struct ServiceContext {
    pub spec_store: Arc<dyn SpecificationStore>,
    pub generator: Arc<dyn ImageGenerator>,
    pub remover: Option<Arc<dyn BackgroundRemover>>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl ServiceContext {
    pub fn new(
        spec_store: Arc<dyn SpecificationStore>,
        generator: Arc<dyn ImageGenerator>,
        remover: Option<Arc<dyn BackgroundRemover>>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            spec_store,
            generator,
            remover,
            storage,
        }
    }

    /// Build every collaborator from configuration.
    ///
    /// Any failure is reported as `ServicesUnavailable`; no partial context is returned.
    pub fn from_config(config: &BriefgenConfig) -> Result<Self, PipelineError> {
        Self::build(config).map_err(|e| match e {
            PipelineError::ServicesUnavailable(_) => e,
            other => PipelineError::ServicesUnavailable(other.to_string()),
        })
    }

    fn build(config: &BriefgenConfig) -> Result<Self, PipelineError> {
        config.ensure_valid()?;
        let http = config.http.to_settings();
        let supabase = supabase_client(config)?;

        let spec_store = spec_store_with(config, supabase.as_ref())?;

        let generator: Arc<dyn ImageGenerator> =
            ProviderFactory::create_generator(&config.generator_provider()?, &http)?.into();

        let remover: Option<Arc<dyn BackgroundRemover>> = match config.remover_provider()? {
            Some(provider) => Some(ProviderFactory::create_remover(&provider, &http)?.into()),
            None => None,
        };

        let storage: Arc<dyn ObjectStorage> = match config.storage.backend {
            StorageBackend::Filesystem => Arc::new(FilesystemObjectStorage::new(
                config.resolve_path(&config.storage.root),
            )?),
            StorageBackend::Supabase => supabase_required(supabase.as_ref())?,
        };

        info!(
            specifications = spec_store.store_name(),
            generator = generator.provider_name(),
            generation_model = generator.model_name(),
            remover = remover.as_ref().map(|r| r.model_name()).unwrap_or("disabled"),
            storage = storage.storage_name(),
            "Services ready"
        );

        Ok(Self::new(spec_store, generator, remover, storage))
    }
}

/// Build only the specification store, for commands that never generate.
pub fn spec_store_from_config(
    config: &BriefgenConfig,
) -> Result<Arc<dyn SpecificationStore>, PipelineError> {
    let supabase = match config.specifications.backend {
        SpecificationsBackend::Supabase => supabase_client(config)?,
        SpecificationsBackend::File => None,
    };
    spec_store_with(config, supabase.as_ref())
        .map_err(|e| PipelineError::ServicesUnavailable(e.to_string()))
}

fn spec_store_with(
    config: &BriefgenConfig,
    supabase: Option<&Arc<SupabaseClient>>,
) -> Result<Arc<dyn SpecificationStore>, PipelineError> {
    match config.specifications.backend {
        SpecificationsBackend::File => {
            let path = config.specifications.path.as_ref().ok_or_else(|| {
                PipelineError::ConfigError("specifications.path is required".to_string())
            })?;
            let path = config.resolve_path(path);
            debug!(path = %path.display(), "Using file specification store");
            Ok(Arc::new(JsonFileSpecificationStore::new(path)))
        }
        SpecificationsBackend::Supabase => Ok(supabase_required(supabase)?),
    }
}

fn supabase_required(
    supabase: Option<&Arc<SupabaseClient>>,
) -> Result<Arc<SupabaseClient>, PipelineError> {
    supabase
        .cloned()
        .ok_or_else(|| PipelineError::ConfigError("supabase is not configured".to_string()))
}

fn supabase_client(config: &BriefgenConfig) -> Result<Option<Arc<SupabaseClient>>, PipelineError> {
    if !config.uses_supabase() {
        return Ok(None);
    }
    let url = config
        .supabase
        .resolve_url()
        .ok_or_else(|| PipelineError::ConfigError("SUPABASE_URL is not set".to_string()))?;
    let key = config
        .supabase
        .resolve_key()
        .ok_or_else(|| PipelineError::ConfigError("SUPABASE_KEY is not set".to_string()))?;
    let client = SupabaseClient::new(
        &url,
        key,
        config.specifications.table.clone(),
        config.supabase.upsert,
        &config.http.to_settings(),
    )?;
    Ok(Some(Arc::new(client)))
}
