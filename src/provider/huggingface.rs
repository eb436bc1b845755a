//! Hugging Face inference API client.
//!
//! Text-to-image models (e.g. `prompthero/openjourney`) answer a `{"inputs": prompt}`
//! request with raw image bytes. Background-removal models (e.g. `briaai/RMBG-1.4`)
//! take raw image bytes and answer either with the cut-out image or, when served as an
//! image-segmentation task, with a JSON list of base64 PNG masks that we apply as alpha.

use crate::asset::{decode_image, encode_png, PNG_CONTENT_TYPE};
use crate::error::PipelineError;
use crate::provider::{
    build_provider_http_client, ensure_success, is_json, map_http_error, BackgroundRemover,
    HttpSettings, ImageGenerator,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

pub struct HuggingFaceClient {
    client: Client,
    model: String,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Deserialize)]
struct SegmentationMask {
    #[serde(default)]
    label: Option<String>,
    mask: String,
}

#[derive(Deserialize)]
struct InferenceError {
    error: String,
    #[serde(default)]
    estimated_time: Option<f64>,
}

impl HuggingFaceClient {
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        http: &HttpSettings,
    ) -> Result<Self, PipelineError> {
        let client = build_provider_http_client(http)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            model,
            api_key,
            base_url,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceClient {
    async fn generate(&self, prompt: &str) -> Result<DynamicImage, PipelineError> {
        let request = self
            .client
            .post(self.model_url())
            .header("Accept", PNG_CONTENT_TYPE)
            .json(&json!({ "inputs": prompt }));
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = ensure_success(response).await?;

        if is_json(&response) {
            let body = response.text().await.map_err(map_http_error)?;
            return Err(inference_error(&body));
        }
        let bytes = response.bytes().await.map_err(map_http_error)?;
        debug!(model = %self.model, bytes = bytes.len(), "Received generated image");
        decode_image(&bytes)
    }

    fn provider_name(&self) -> &str {
        "huggingface"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl BackgroundRemover for HuggingFaceClient {
    async fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, PipelineError> {
        let request = self
            .client
            .post(self.model_url())
            .header("Content-Type", PNG_CONTENT_TYPE)
            .body(encode_png(image)?);
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = ensure_success(response).await?;

        if is_json(&response) {
            let body = response.text().await.map_err(map_http_error)?;
            let masks: Vec<SegmentationMask> =
                serde_json::from_str(&body).map_err(|_| inference_error(&body))?;
            let mask = masks.first().ok_or_else(|| {
                PipelineError::ProviderError("No masks in segmentation response".to_string())
            })?;
            debug!(
                model = %self.model,
                label = mask.label.as_deref().unwrap_or("-"),
                "Applying segmentation mask"
            );
            let mask_bytes = BASE64.decode(mask.mask.as_bytes()).map_err(|e| {
                PipelineError::ProviderError(format!("Invalid base64 mask: {}", e))
            })?;
            return Ok(apply_mask(image, &decode_image(&mask_bytes)?));
        }

        let bytes = response.bytes().await.map_err(map_http_error)?;
        decode_image(&bytes)
    }

    fn provider_name(&self) -> &str {
        "huggingface"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn inference_error(body: &str) -> PipelineError {
    match serde_json::from_str::<InferenceError>(body) {
        Ok(InferenceError {
            error,
            estimated_time: Some(eta),
        }) => PipelineError::ProviderRequestFailed(format!(
            "{} (estimated time {:.0}s)",
            error, eta
        )),
        Ok(InferenceError { error, .. }) => PipelineError::ProviderRequestFailed(error),
        Err(_) => PipelineError::ProviderError(format!("Unexpected response: {}", body)),
    }
}

/// Use the mask's luminance as the alpha channel of `image`.
///
/// The mask is resized to the image dimensions when the model answers at a different
/// resolution.
pub(crate) fn apply_mask(image: &DynamicImage, mask: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let mask = if mask.dimensions() == (width, height) {
        mask.to_luma8()
    } else {
        mask.resize_exact(width, height, FilterType::Nearest)
            .to_luma8()
    };
    let mut rgba = image.to_rgba8();
    for (x, y, pixel) in rgba.enumerate_pixels_mut() {
        pixel.0[3] = mask.get_pixel(x, y).0[0];
    }
    DynamicImage::ImageRgba8(rgba)
}
