//! Generation job runner: generate, store the original, then best-effort transparency.

use crate::asset::{encode_png, StoredAsset, ELEMENT_IMAGES_BUCKET, PNG_CONTENT_TYPE};
use crate::error::PipelineError;
use crate::generation::outcome::{
    FailureReason, JobOutcome, SkipReason, StoredJob, TransparentOutcome,
};
use crate::generation::plan::GenerationJob;
use crate::services::ServiceContext;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Executes one job against the configured collaborators.
///
/// Never returns an error: every failure is folded into the returned outcome. Once the
/// original is stored the job counts as stored, whatever happens to the transparent
/// variant.
pub struct GenerationJobRunner {
    services: Arc<ServiceContext>,
}

impl GenerationJobRunner {
    pub fn new(services: Arc<ServiceContext>) -> Self {
        Self { services }
    }

    pub async fn run(&self, job: &GenerationJob) -> JobOutcome {
        let element_id = job.element_id.as_deref().unwrap_or("background");
        if job.prompt.is_empty() {
            warn!(element_id, "Skipping job with empty prompt");
            return JobOutcome::Skipped(SkipReason::EmptyPrompt);
        }

        let started = Instant::now();
        let image = match self.services.generator.generate(&job.prompt).await {
            Ok(image) => image,
            Err(e) => {
                warn!(
                    element_id,
                    provider = self.services.generator.provider_name(),
                    model = self.services.generator.model_name(),
                    error = %e,
                    "Image generation failed"
                );
                return JobOutcome::Failed(FailureReason::Generation(e.to_string()));
            }
        };
        debug!(
            element_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Image generated"
        );

        let original_path = job.original_path();
        if let Err(e) = self.store(&original_path, &image).await {
            warn!(element_id, path = %original_path, error = %e, "Failed to store original image");
            return JobOutcome::Failed(FailureReason::StoreOriginal(e.to_string()));
        }
        info!(
            element_id,
            bucket = ELEMENT_IMAGES_BUCKET,
            path = %original_path,
            "Successfully stored image"
        );

        let transparent = match job.transparent_path() {
            Some(path) if job.needs_background_removal => {
                self.store_transparent(element_id, &path, &image).await
            }
            _ => TransparentOutcome::NotRequested,
        };

        JobOutcome::Stored(StoredJob {
            original: StoredAsset::png(original_path),
            transparent,
        })
    }

    async fn store_transparent(
        &self,
        element_id: &str,
        path: &str,
        image: &DynamicImage,
    ) -> TransparentOutcome {
        let Some(remover) = self.services.remover.as_ref() else {
            debug!(element_id, "Background removal disabled");
            return TransparentOutcome::Disabled;
        };

        let transparent = match remover.remove_background(image).await {
            Ok(transparent) => transparent,
            Err(e) => {
                warn!(
                    element_id,
                    provider = remover.provider_name(),
                    model = remover.model_name(),
                    error = %e,
                    "Background removal failed; keeping original only"
                );
                return TransparentOutcome::RemovalFailed(e.to_string());
            }
        };

        match self.store(path, &transparent).await {
            Ok(()) => {
                info!(
                    element_id,
                    bucket = ELEMENT_IMAGES_BUCKET,
                    path,
                    "Successfully stored image"
                );
                TransparentOutcome::Stored(StoredAsset::png(path.to_string()))
            }
            Err(e) => {
                warn!(element_id, path, error = %e, "Failed to store transparent image");
                TransparentOutcome::StoreFailed(e.to_string())
            }
        }
    }

    async fn store(&self, path: &str, image: &DynamicImage) -> Result<(), PipelineError> {
        let bytes = encode_png(image)?;
        self.services
            .storage
            .upload(ELEMENT_IMAGES_BUCKET, path, bytes, PNG_CONTENT_TYPE)
            .await
    }
}
