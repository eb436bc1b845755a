//! Model Provider Abstraction
//!
//! Interfaces for the two model collaborators of the pipeline: text-to-image generation
//! and background removal. Concrete clients speak to the Hugging Face inference API,
//! the OpenAI images API, or a custom local endpoint.

use crate::error::PipelineError;
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod huggingface;
pub mod local;
pub mod openai;
pub mod profile;

pub use huggingface::HuggingFaceClient;
pub use local::LocalImageClient;
pub use openai::OpenAIImageClient;
pub use profile::{ProviderConfig, ProviderType};

/// Resolved provider selection with credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelProvider {
    HuggingFace {
        model: String,
        api_key: Option<String>,
        base_url: Option<String>, // Default: https://api-inference.huggingface.co
    },
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>,
        size: Option<String>,
    },
    LocalCustom {
        model: String,
        endpoint: String, // Base URL, e.g. http://localhost:8080/v1
        api_key: Option<String>,
    },
}

/// Text prompt to raster image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<DynamicImage, PipelineError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Raster image to raster image with the background made transparent.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, PipelineError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Timeouts applied to every provider HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
        }
    }
}

pub(crate) fn build_provider_http_client(settings: &HttpSettings) -> Result<Client, PipelineError> {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .map_err(|e| PipelineError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

// Helper function to map HTTP errors to PipelineError
pub(crate) fn map_http_error(error: reqwest::Error) -> PipelineError {
    if let Some(status) = error.status() {
        status_error(status, &error.to_string())
    } else if error.is_timeout() {
        PipelineError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        PipelineError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        PipelineError::ProviderError(format!("HTTP error: {}", error))
    }
}

pub(crate) fn status_error(status: StatusCode, detail: &str) -> PipelineError {
    match status.as_u16() {
        401 | 403 => PipelineError::ProviderAuthFailed(format!("Authentication failed: {}", detail)),
        429 => PipelineError::ProviderRateLimit(format!("Rate limit exceeded: {}", detail)),
        404 => PipelineError::ProviderModelNotFound(format!("Model not found: {}", detail)),
        _ => PipelineError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, detail
        )),
    }
}

/// Turn a non-success response into an error, consuming its body for the message.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, PipelineError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(status_error(status, &error_text))
}

pub(crate) fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}

/// Provider factory for creating collaborator clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_generator(
        provider: &ModelProvider,
        http: &HttpSettings,
    ) -> Result<Box<dyn ImageGenerator>, PipelineError> {
        match provider {
            ModelProvider::HuggingFace {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(HuggingFaceClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
                http,
            )?)),
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
                size,
            } => Ok(Box::new(OpenAIImageClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
                size.clone(),
                http,
            )?)),
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => Ok(Box::new(LocalImageClient::new(
                model.clone(),
                endpoint.clone(),
                api_key.clone(),
                http,
            )?)),
        }
    }

    pub fn create_remover(
        provider: &ModelProvider,
        http: &HttpSettings,
    ) -> Result<Box<dyn BackgroundRemover>, PipelineError> {
        match provider {
            ModelProvider::HuggingFace {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(HuggingFaceClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
                http,
            )?)),
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => Ok(Box::new(LocalImageClient::new(
                model.clone(),
                endpoint.clone(),
                api_key.clone(),
                http,
            )?)),
            ModelProvider::OpenAI { .. } => Err(PipelineError::ConfigError(
                "OpenAI does not offer background removal; use huggingface or local".to_string(),
            )),
        }
    }
}
