//! Provider configuration as written in config files.

use crate::error::PipelineError;
use crate::provider::ModelProvider;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    HuggingFace,
    OpenAI,
    Local,
}

impl ProviderType {
    pub fn slug(self) -> &'static str {
        match self {
            ProviderType::HuggingFace => "huggingface",
            ProviderType::OpenAI => "openai",
            ProviderType::Local => "local",
        }
    }

    /// Environment variable consulted when no `api_key` is configured.
    pub fn api_key_env_var(self) -> Option<&'static str> {
        match self {
            ProviderType::HuggingFace => Some("HF_TOKEN"),
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Local => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub model: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Output size hint, e.g. `1024x1024` (OpenAI only)
    #[serde(default)]
    pub size: Option<String>,
}

impl ProviderConfig {
    pub fn huggingface(model: &str) -> Self {
        Self {
            provider_type: ProviderType::HuggingFace,
            model: model.to_string(),
            endpoint: None,
            api_key: None,
            size: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "Endpoint must start with http:// or https://: {}",
                    endpoint
                ));
            }
        }
        if self.provider_type == ProviderType::Local && self.endpoint.is_none() {
            return Err("Local providers require an endpoint".to_string());
        }
        if self.size.is_some() && self.provider_type != ProviderType::OpenAI {
            return Err("size is only supported by openai providers".to_string());
        }
        Ok(())
    }

    /// Configured key, else the provider's conventional environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| {
                self.provider_type
                    .api_key_env_var()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.is_empty())
            })
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, PipelineError> {
        self.validate().map_err(PipelineError::ConfigError)?;
        match self.provider_type {
            ProviderType::HuggingFace => Ok(ModelProvider::HuggingFace {
                model: self.model.clone(),
                api_key: self.resolve_api_key(),
                base_url: self.endpoint.clone(),
            }),
            ProviderType::OpenAI => {
                let api_key = self.resolve_api_key().ok_or_else(|| {
                    PipelineError::ConfigError(
                        "OpenAI provider requires api_key or OPENAI_API_KEY".to_string(),
                    )
                })?;
                Ok(ModelProvider::OpenAI {
                    model: self.model.clone(),
                    api_key,
                    base_url: self.endpoint.clone(),
                    size: self.size.clone(),
                })
            }
            ProviderType::Local => Ok(ModelProvider::LocalCustom {
                model: self.model.clone(),
                // validate() guarantees an endpoint
                endpoint: self.endpoint.clone().unwrap_or_default(),
                api_key: self.resolve_api_key(),
            }),
        }
    }
}
