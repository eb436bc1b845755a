//! OpenAI images API client (`/images/generations`, base64 payloads).

use crate::asset::decode_image;
use crate::error::PipelineError;
use crate::provider::{
    build_provider_http_client, ensure_success, map_http_error, HttpSettings, ImageGenerator,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::DynamicImage;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SIZE: &str = "1024x1024";

#[derive(Serialize)]
pub(crate) struct ImageGenerationRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'a str>,
    pub response_format: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct ImageGenerationResponse {
    pub data: Vec<ImageData>,
}

#[derive(Deserialize)]
pub(crate) struct ImageData {
    #[serde(default)]
    pub b64_json: Option<String>,
}

/// Send an OpenAI-shaped image generation request and decode the first image.
pub(crate) async fn request_b64_image(
    request: RequestBuilder,
    body: &ImageGenerationRequest<'_>,
) -> Result<DynamicImage, PipelineError> {
    let response = request
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(map_http_error)?;
    let response = ensure_success(response).await?;
    let parsed: ImageGenerationResponse = response
        .json()
        .await
        .map_err(|e| PipelineError::ProviderError(format!("Failed to parse response: {}", e)))?;
    decode_first_image(parsed)
}

pub(crate) fn decode_first_image(
    response: ImageGenerationResponse,
) -> Result<DynamicImage, PipelineError> {
    let encoded = response
        .data
        .into_iter()
        .find_map(|d| d.b64_json)
        .ok_or_else(|| PipelineError::ProviderError("No images in response".to_string()))?;
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| PipelineError::ProviderError(format!("Invalid base64 image: {}", e)))?;
    decode_image(&bytes)
}

pub struct OpenAIImageClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
    size: String,
}

impl OpenAIImageClient {
    pub fn new(
        model: String,
        api_key: String,
        base_url: Option<String>,
        size: Option<String>,
        http: &HttpSettings,
    ) -> Result<Self, PipelineError> {
        let client = build_provider_http_client(http)?;
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            client,
            model,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            size: size.unwrap_or_else(|| DEFAULT_SIZE.to_string()),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAIImageClient {
    async fn generate(&self, prompt: &str) -> Result<DynamicImage, PipelineError> {
        let url = format!("{}/images/generations", self.base_url);
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let body = ImageGenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: Some(&self.size),
            response_format: "b64_json",
        };
        request_b64_image(request, &body).await
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
