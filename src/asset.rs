//! Stored asset naming and encoding.
//!
//! Every generated image lands in the `element-images` bucket as a PNG under a path
//! derived only from the brief id and element id:
//!
//! - `{brief_id}/{element_id}_original.png`
//! - `{brief_id}/{element_id}_transparent.png`
//! - `{brief_id}/background.png`

use crate::error::PipelineError;
use image::{DynamicImage, ImageOutputFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

pub const ELEMENT_IMAGES_BUCKET: &str = "element-images";
pub const PNG_CONTENT_TYPE: &str = "image/png";

pub fn original_path(brief_id: &str, element_id: &str) -> String {
    format!("{}/{}_original.png", brief_id, element_id)
}

pub fn transparent_path(brief_id: &str, element_id: &str) -> String {
    format!("{}/{}_transparent.png", brief_id, element_id)
}

pub fn background_path(brief_id: &str) -> String {
    format!("{}/background.png", brief_id)
}

/// A durable write acknowledged by object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
}

impl StoredAsset {
    pub fn png(path: String) -> Self {
        Self {
            bucket: ELEMENT_IMAGES_BUCKET.to_string(),
            path,
            content_type: PNG_CONTENT_TYPE.to_string(),
        }
    }
}

/// Lossless PNG encoding of a raster image.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PipelineError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageOutputFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Decode image bytes returned by a provider, sniffing the format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    Ok(image::load_from_memory(bytes)?)
}
