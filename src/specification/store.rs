//! Specification store: lookup of a brief's specification records.

use crate::error::PipelineError;
use crate::specification::SpecificationRecord;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[async_trait]
pub trait SpecificationStore: Send + Sync {
    /// Fetch every record for `brief_id`, in the store's own order.
    async fn fetch_records(&self, brief_id: &str) -> Result<Vec<SpecificationRecord>, PipelineError>;

    fn store_name(&self) -> &str;

    /// Lookup failures are logged and reported as "no specifications".
    async fn fetch(&self, brief_id: &str) -> Vec<SpecificationRecord> {
        match self.fetch_records(brief_id).await {
            Ok(records) => {
                debug!(
                    brief_id,
                    store = self.store_name(),
                    records = records.len(),
                    "Fetched specification records"
                );
                records
            }
            Err(e) => {
                error!(
                    brief_id,
                    store = self.store_name(),
                    error = %e,
                    "Error fetching element specifications"
                );
                Vec::new()
            }
        }
    }
}

/// Specification store backed by a local JSON file.
///
/// Two layouts are accepted:
/// - an object keyed by brief id, each value an array of records
/// - an array of rows shaped `{"brief_id": ..., "specification_data": ...}`
///
/// The file is re-read on every fetch so edits are picked up between runs.
pub struct JsonFileSpecificationStore {
    path: PathBuf,
}

#[derive(Deserialize)]
struct SpecificationRow {
    brief_id: String,
    #[serde(default)]
    specification_data: Option<Value>,
}

impl JsonFileSpecificationStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Value, PipelineError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            PipelineError::SpecStoreError(format!(
                "Failed to read specification file {:?}: {}",
                self.path, e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            PipelineError::SpecStoreError(format!(
                "Failed to parse specification file {:?}: {}",
                self.path, e
            ))
        })
    }
}

#[async_trait]
impl SpecificationStore for JsonFileSpecificationStore {
    async fn fetch_records(&self, brief_id: &str) -> Result<Vec<SpecificationRecord>, PipelineError> {
        let parse_err = |e: serde_json::Error| {
            PipelineError::SpecStoreError(format!("Unexpected specification file layout: {}", e))
        };
        match self.read_all()? {
            keyed @ Value::Object(_) => {
                let mut by_brief: HashMap<String, Vec<SpecificationRecord>> =
                    serde_json::from_value(keyed).map_err(parse_err)?;
                Ok(by_brief.remove(brief_id).unwrap_or_default())
            }
            rows @ Value::Array(_) => {
                let rows: Vec<SpecificationRow> = serde_json::from_value(rows).map_err(parse_err)?;
                Ok(rows
                    .into_iter()
                    .filter(|row| row.brief_id == brief_id)
                    .map(|row| SpecificationRecord {
                        specification_data: row.specification_data,
                    })
                    .collect())
            }
            _ => Err(PipelineError::SpecStoreError(format!(
                "Specification file {:?} must hold a JSON object or array",
                self.path
            ))),
        }
    }

    fn store_name(&self) -> &str {
        "file"
    }
}
