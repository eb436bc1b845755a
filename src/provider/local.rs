//! Custom local image server.
//!
//! Generation uses the OpenAI images request shape at `{endpoint}/images/generations`.
//! Background removal posts PNG bytes to `{endpoint}/remove-background` and expects
//! image bytes back.

use crate::asset::{decode_image, encode_png, PNG_CONTENT_TYPE};
use crate::error::PipelineError;
use crate::provider::openai::{request_b64_image, ImageGenerationRequest};
use crate::provider::{
    build_provider_http_client, ensure_success, map_http_error, BackgroundRemover, HttpSettings,
    ImageGenerator,
};
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::{Client, RequestBuilder};

pub struct LocalImageClient {
    client: Client,
    model: String,
    endpoint: String,
    api_key: Option<String>,
}

impl LocalImageClient {
    pub fn new(
        model: String,
        endpoint: String,
        api_key: Option<String>,
        http: &HttpSettings,
    ) -> Result<Self, PipelineError> {
        let client = build_provider_http_client(http)?;
        Ok(Self {
            client,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn post(&self, route: &str) -> RequestBuilder {
        let builder = self.client.post(format!("{}/{}", self.endpoint, route));
        match &self.api_key {
            Some(api_key) => builder.header("Authorization", format!("Bearer {}", api_key)),
            None => builder,
        }
    }
}

#[async_trait]
impl ImageGenerator for LocalImageClient {
    async fn generate(&self, prompt: &str) -> Result<DynamicImage, PipelineError> {
        let body = ImageGenerationRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: None,
            response_format: "b64_json",
        };
        request_b64_image(self.post("images/generations"), &body).await
    }

    fn provider_name(&self) -> &str {
        "local"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl BackgroundRemover for LocalImageClient {
    async fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, PipelineError> {
        let response = self
            .post("remove-background")
            .header("Content-Type", PNG_CONTENT_TYPE)
            .body(encode_png(image)?)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await.map_err(map_http_error)?;
        decode_image(&bytes)
    }

    fn provider_name(&self) -> &str {
        "local"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
