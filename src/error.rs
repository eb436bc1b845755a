//! Error types for the brief image pipeline.

use thiserror::Error;

/// Errors raised by collaborators, configuration, and service construction.
///
/// Per-job failures never surface as this type past the job runner; they are folded
/// into [`crate::generation::JobOutcome`] values instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Specification store error: {0}")]
    SpecStoreError(String),

    #[error("Storage error at {bucket}/{path}: {message}")]
    StorageError {
        bucket: String,
        path: String,
        message: String,
    },

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Services unavailable: {0}")]
    ServicesUnavailable(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PipelineError {
    pub fn storage(bucket: &str, path: &str, message: impl Into<String>) -> Self {
        PipelineError::StorageError {
            bucket: bucket.to_string(),
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::ConfigError(err.to_string())
    }
}
