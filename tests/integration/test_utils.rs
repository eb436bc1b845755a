//! Shared test utilities for integration tests
//!
//! Scriptable collaborators that record every call, plus environment isolation for
//! configuration tests.

use async_trait::async_trait;
use briefgen::error::PipelineError;
use briefgen::provider::{BackgroundRemover, ImageGenerator};
use briefgen::specification::{SpecificationRecord, SpecificationStore};
use briefgen::storage::{MemoryObjectStorage, ObjectStorage};
use briefgen::ServiceContext;
use image::{DynamicImage, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

/// Store returning a fixed record list, counting lookups.
pub struct StaticSpecStore {
    records: Vec<SpecificationRecord>,
    pub lookups: Mutex<Vec<String>>,
}

impl StaticSpecStore {
    pub fn new(records: Vec<SpecificationRecord>) -> Self {
        Self {
            records,
            lookups: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpecificationStore for StaticSpecStore {
    async fn fetch_records(&self, brief_id: &str) -> Result<Vec<SpecificationRecord>, PipelineError> {
        self.lookups.lock().push(brief_id.to_string());
        Ok(self.records.clone())
    }

    fn store_name(&self) -> &str {
        "static"
    }
}

/// Store whose every lookup fails.
pub struct UnreachableSpecStore;

#[async_trait]
impl SpecificationStore for UnreachableSpecStore {
    async fn fetch_records(&self, _: &str) -> Result<Vec<SpecificationRecord>, PipelineError> {
        Err(PipelineError::SpecStoreError("connection refused".to_string()))
    }

    fn store_name(&self) -> &str {
        "unreachable"
    }
}

/// Generator recording prompts; fails for prompts registered with `fail_on`.
#[derive(Default)]
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(self, prompt: &str) -> Self {
        self.failing.lock().insert(prompt.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ImageGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<DynamicImage, PipelineError> {
        self.prompts.lock().push(prompt.to_string());
        if self.failing.lock().contains(prompt) {
            return Err(PipelineError::ProviderRequestFailed(format!(
                "HTTP 503: model overloaded for '{}'",
                prompt
            )));
        }
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            Rgba([200, 120, 40, 255]),
        )))
    }

    fn provider_name(&self) -> &str {
        "recording"
    }

    fn model_name(&self) -> &str {
        "solid-4x4"
    }
}

/// Remover that clears the alpha channel, or always fails.
pub struct ScriptedRemover {
    fail: bool,
    pub calls: Mutex<usize>,
}

impl ScriptedRemover {
    pub fn working() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl BackgroundRemover for ScriptedRemover {
    async fn remove_background(&self, image: &DynamicImage) -> Result<DynamicImage, PipelineError> {
        *self.calls.lock() += 1;
        if self.fail {
            return Err(PipelineError::ProviderError(
                "segmentation model unavailable".to_string(),
            ));
        }
        let mut rgba = image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            pixel.0[3] = 0;
        }
        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "alpha-clear"
    }
}

/// Memory storage that rejects uploads whose path ends with one of `reject_suffixes`.
pub struct SelectiveStorage {
    pub inner: MemoryObjectStorage,
    reject_suffixes: Vec<String>,
}

impl SelectiveStorage {
    pub fn rejecting(suffixes: &[&str]) -> Self {
        Self {
            inner: MemoryObjectStorage::new(),
            reject_suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ObjectStorage for SelectiveStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PipelineError> {
        if self.reject_suffixes.iter().any(|s| path.ends_with(s.as_str())) {
            return Err(PipelineError::storage(bucket, path, "HTTP 403: permission denied"));
        }
        self.inner.upload(bucket, path, bytes, content_type).await
    }

    fn storage_name(&self) -> &str {
        "selective"
    }
}

pub fn service_context(
    store: Arc<dyn SpecificationStore>,
    generator: Arc<dyn ImageGenerator>,
    remover: Option<Arc<dyn BackgroundRemover>>,
    storage: Arc<dyn ObjectStorage>,
) -> Arc<ServiceContext> {
    Arc::new(ServiceContext::new(store, generator, remover, storage))
}

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = parking_lot::const_mutex(());

/// Environment variable state to restore after test
struct EnvState(Vec<(&'static str, Option<String>)>);

const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "BRIEFGEN_ENV",
    "SUPABASE_URL",
    "SUPABASE_KEY",
    "BRIEFGEN__STORAGE__BACKEND",
    "BRIEFGEN__REMOVER__ENABLED",
];

impl EnvState {
    fn capture() -> Self {
        Self(
            ISOLATED_VARS
                .iter()
                .map(|var| (*var, std::env::var(var).ok()))
                .collect(),
        )
    }

    fn restore(self) {
        for (var, value) in self.0 {
            match value {
                Some(value) => std::env::set_var(var, value),
                None => std::env::remove_var(var),
            }
        }
    }
}

/// Run `f` with HOME pointing into a fresh temp dir and every briefgen-related
/// variable cleared; the original environment is restored afterwards.
pub fn with_isolated_env<F, R>(f: F) -> R
where
    F: FnOnce(&TempDir) -> R,
{
    let _guard = ENV_MUTEX.lock();
    let state = EnvState::capture();
    let temp = TempDir::new().unwrap();
    for var in ISOLATED_VARS {
        std::env::remove_var(var);
    }
    std::env::set_var("HOME", temp.path().join("home"));

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&temp)));
    state.restore();
    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
