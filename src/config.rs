//! Configuration System
//!
//! Layered configuration for the generation pipeline: built-in defaults, the global
//! user file, workspace files, then `BRIEFGEN__SECTION__KEY` environment variables.
//! Validation reports every problem at once.

use crate::error::PipelineError;
use crate::logging::LoggingConfig;
use crate::provider::{HttpSettings, ModelProvider};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use crate::provider::{ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

pub const DEFAULT_GENERATION_MODEL: &str = "prompthero/openjourney";
pub const DEFAULT_REMOVAL_MODEL: &str = "briaai/RMBG-1.4";
pub const DEFAULT_SPECIFICATIONS_TABLE: &str = "element_specifications";

const REDACTED: &str = "********";

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefgenConfig {
    /// Base for relative paths (set by the loader when absent)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Image-generation collaborator
    #[serde(default = "default_generator")]
    pub generator: ProviderConfig,

    /// Background-removal collaborator
    #[serde(default)]
    pub remover: RemoverConfig,

    #[serde(default)]
    pub specifications: SpecificationsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub supabase: SupabaseConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_generator() -> ProviderConfig {
    ProviderConfig::huggingface(DEFAULT_GENERATION_MODEL)
}

impl Default for BriefgenConfig {
    fn default() -> Self {
        Self {
            workspace_root: None,
            generator: default_generator(),
            remover: RemoverConfig::default(),
            specifications: SpecificationsConfig::default(),
            storage: StorageConfig::default(),
            supabase: SupabaseConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoverConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_remover_type")]
    pub provider_type: ProviderType,
    #[serde(default = "default_removal_model")]
    pub model: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_remover_type() -> ProviderType {
    ProviderType::HuggingFace
}

fn default_removal_model() -> String {
    DEFAULT_REMOVAL_MODEL.to_string()
}

impl Default for RemoverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider_type: default_remover_type(),
            model: default_removal_model(),
            endpoint: None,
            api_key: None,
        }
    }
}

impl RemoverConfig {
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider_type: self.provider_type,
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            size: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.provider_type == ProviderType::OpenAI {
            return Err("openai does not offer background removal".to_string());
        }
        self.to_provider_config().validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecificationsBackend {
    Supabase,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationsConfig {
    #[serde(default = "default_specifications_backend")]
    pub backend: SpecificationsBackend,
    /// PostgREST table (supabase backend)
    #[serde(default = "default_table")]
    pub table: String,
    /// JSON document (file backend)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_specifications_backend() -> SpecificationsBackend {
    SpecificationsBackend::Supabase
}

fn default_table() -> String {
    DEFAULT_SPECIFICATIONS_TABLE.to_string()
}

impl Default for SpecificationsConfig {
    fn default() -> Self {
        Self {
            backend: default_specifications_backend(),
            table: default_table(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Supabase,
    Filesystem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    /// Filesystem backend root; buckets become subdirectories
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Supabase
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("assets")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            root: default_storage_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    /// Overwrite existing objects on upload
    #[serde(default = "default_true")]
    pub upsert: bool,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            upsert: true,
        }
    }
}

impl SupabaseConfig {
    /// Configured URL, else `SUPABASE_URL`.
    pub fn resolve_url(&self) -> Option<String> {
        resolve_with_env(self.url.as_deref(), "SUPABASE_URL")
    }

    /// Configured key, else `SUPABASE_KEY`.
    pub fn resolve_key(&self) -> Option<String> {
        resolve_with_env(self.key.as_deref(), "SUPABASE_KEY")
    }

    pub fn validate(&self) -> Result<(), String> {
        match (self.resolve_url(), self.resolve_key()) {
            (None, _) => Err("url is not set (configure supabase.url or SUPABASE_URL)".to_string()),
            (_, None) => Err("key is not set (configure supabase.key or SUPABASE_KEY)".to_string()),
            (Some(url), Some(_)) if !url.starts_with("http://") && !url.starts_with("https://") => {
                Err(format!("url must start with http:// or https://: {}", url))
            }
            _ => Ok(()),
        }
    }
}

fn resolve_with_env(configured: Option<&str>, var: &str) -> Option<String> {
    configured
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    300
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn to_settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Generator(String),
    Remover(String),
    Specifications(String),
    Storage(String),
    Supabase(String),
    Http(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Generator(msg) => write!(f, "generator: {}", msg),
            ValidationError::Remover(msg) => write!(f, "remover: {}", msg),
            ValidationError::Specifications(msg) => write!(f, "specifications: {}", msg),
            ValidationError::Storage(msg) => write!(f, "storage: {}", msg),
            ValidationError::Supabase(msg) => write!(f, "supabase: {}", msg),
            ValidationError::Http(msg) => write!(f, "http: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl BriefgenConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.generator.validate() {
            errors.push(ValidationError::Generator(e));
        }
        if self.remover.enabled {
            if let Err(e) = self.remover.validate() {
                errors.push(ValidationError::Remover(e));
            }
        }

        match self.specifications.backend {
            SpecificationsBackend::File => {
                if self.specifications.path.is_none() {
                    errors.push(ValidationError::Specifications(
                        "file backend requires a path".to_string(),
                    ));
                }
            }
            SpecificationsBackend::Supabase => {
                if self.specifications.table.trim().is_empty() {
                    errors.push(ValidationError::Specifications(
                        "table cannot be empty".to_string(),
                    ));
                }
            }
        }

        if self.storage.backend == StorageBackend::Filesystem
            && self.storage.root.as_os_str().is_empty()
        {
            errors.push(ValidationError::Storage(
                "filesystem backend requires a root".to_string(),
            ));
        }

        if self.uses_supabase() {
            if let Err(e) = self.supabase.validate() {
                errors.push(ValidationError::Supabase(e));
            }
        }

        if self.http.connect_timeout_secs == 0 || self.http.request_timeout_secs == 0 {
            errors.push(ValidationError::Http(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and flatten all problems into one error.
    pub fn ensure_valid(&self) -> Result<(), PipelineError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PipelineError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    pub fn uses_supabase(&self) -> bool {
        self.specifications.backend == SpecificationsBackend::Supabase
            || self.storage.backend == StorageBackend::Supabase
    }

    pub fn generator_provider(&self) -> Result<ModelProvider, PipelineError> {
        self.generator.to_model_provider()
    }

    /// `None` when background removal is disabled.
    pub fn remover_provider(&self) -> Result<Option<ModelProvider>, PipelineError> {
        if !self.remover.enabled {
            return Ok(None);
        }
        self.remover.validate().map_err(PipelineError::ConfigError)?;
        self.remover.to_provider_config().to_model_provider().map(Some)
    }

    /// Resolve `path` against the workspace root when it is relative.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Copy with every credential masked, for display.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_string());
        let mut config = self.clone();
        config.generator.api_key = mask(&self.generator.api_key);
        config.remover.api_key = mask(&self.remover.api_key);
        config.supabase.key = mask(&self.supabase.key);
        config
    }
}
