//! Supabase client: PostgREST lookups of specification records and Storage uploads.

use crate::error::PipelineError;
use crate::provider::{build_provider_http_client, ensure_success, map_http_error, HttpSettings};
use crate::specification::{SpecificationRecord, SpecificationStore};
use crate::storage::ObjectStorage;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use tracing::info;

pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    key: String,
    table: String,
    upsert: bool,
}

impl SupabaseClient {
    pub fn new(
        url: &str,
        key: String,
        table: String,
        upsert: bool,
        http: &HttpSettings,
    ) -> Result<Self, PipelineError> {
        let base_url = Url::parse(url)
            .map_err(|e| PipelineError::ConfigError(format!("Invalid Supabase URL {}: {}", url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(PipelineError::ConfigError(format!(
                "Supabase URL cannot be used as a base: {}",
                url
            )));
        }
        Ok(Self {
            client: build_provider_http_client(http)?,
            base_url,
            key,
            table,
            upsert,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    /// `{base}/{segments...}` with each segment percent-encoded.
    pub(crate) fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn records_url(&self, brief_id: &str) -> Url {
        let mut url = self.endpoint(["rest", "v1", self.table.as_str()]);
        url.query_pairs_mut()
            .append_pair("select", "specification_data")
            .append_pair("brief_id", &format!("eq.{}", brief_id));
        url
    }

    pub(crate) fn object_url(&self, bucket: &str, path: &str) -> Url {
        let segments = ["storage", "v1", "object", bucket]
            .into_iter()
            .chain(path.split('/'));
        self.endpoint(segments)
    }
}

#[async_trait]
impl SpecificationStore for SupabaseClient {
    async fn fetch_records(&self, brief_id: &str) -> Result<Vec<SpecificationRecord>, PipelineError> {
        let request = self
            .client
            .get(self.records_url(brief_id))
            .header("Accept", "application/json");
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| PipelineError::SpecStoreError(map_http_error(e).to_string()))?;
        let response = ensure_success(response)
            .await
            .map_err(|e| PipelineError::SpecStoreError(e.to_string()))?;
        response
            .json::<Vec<SpecificationRecord>>()
            .await
            .map_err(|e| PipelineError::SpecStoreError(format!("Failed to parse rows: {}", e)))
    }

    fn store_name(&self) -> &str {
        "supabase"
    }
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PipelineError> {
        let request = self
            .client
            .post(self.object_url(bucket, path))
            .header("Content-Type", content_type)
            .header("x-upsert", if self.upsert { "true" } else { "false" })
            .body(bytes);
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| PipelineError::storage(bucket, path, map_http_error(e).to_string()))?;
        ensure_success(response)
            .await
            .map_err(|e| PipelineError::storage(bucket, path, e.to_string()))?;
        info!(bucket, path, "Successfully stored image");
        Ok(())
    }

    fn storage_name(&self) -> &str {
        "supabase"
    }
}
