//! Object storage
//!
//! Durable writes of named blobs into named buckets. The pipeline only ever writes;
//! it holds no reference to an object once `upload` returns.

use crate::error::PipelineError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PipelineError>;

    fn storage_name(&self) -> &str;
}

/// Filesystem-backed storage laid out as `{root}/{bucket}/{path}`.
///
/// Writes go to a `.tmp` sibling first and are renamed into place, so a reader never
/// observes a half-written image. Existing objects are overwritten.
pub struct FilesystemObjectStorage {
    root: PathBuf,
}

impl FilesystemObjectStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, PipelineError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            PipelineError::ServicesUnavailable(format!(
                "Failed to create storage root {:?}: {}",
                root, e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object location, refusing anything that would escape the bucket.
    pub fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, PipelineError> {
        let mut resolved = self.root.clone();
        for part in [bucket, path] {
            let relative = Path::new(part);
            if part.is_empty()
                || relative
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(PipelineError::storage(
                    bucket,
                    path,
                    "object names must be relative and must not contain '..'",
                ));
            }
            resolved.push(relative);
        }
        Ok(resolved)
    }
}

#[async_trait]
impl ObjectStorage for FilesystemObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), PipelineError> {
        let object_path = self.object_path(bucket, path)?;
        let io_err = |e: std::io::Error| PipelineError::storage(bucket, path, e.to_string());

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut temp_name = object_path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, &bytes).map_err(io_err)?;
        fs::rename(&temp_path, &object_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            io_err(e)
        })?;
        debug!(path = %object_path.display(), bytes = bytes.len(), "Wrote object");
        Ok(())
    }

    fn storage_name(&self) -> &str {
        "filesystem"
    }
}

/// One acknowledged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-process storage that keeps every write in arrival order.
#[derive(Default)]
pub struct MemoryObjectStorage {
    writes: Mutex<Vec<StoredObject>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write so far, in order (overwrites appear twice).
    pub fn writes(&self) -> Vec<StoredObject> {
        self.writes.lock().clone()
    }

    /// `bucket/path` of every write so far, in order.
    pub fn written_paths(&self) -> Vec<String> {
        self.writes
            .lock()
            .iter()
            .map(|w| format!("{}/{}", w.bucket, w.path))
            .collect()
    }

    /// Latest content written at `bucket/path`.
    pub fn get(&self, bucket: &str, path: &str) -> Option<StoredObject> {
        self.writes
            .lock()
            .iter()
            .rev()
            .find(|w| w.bucket == bucket && w.path == path)
            .cloned()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PipelineError> {
        self.writes.lock().push(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            bytes,
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    fn storage_name(&self) -> &str {
        "memory"
    }
}
