//! `/storage/v1` bucket endpoints.

use async_trait::async_trait;

use super::SupabaseClient;
use crate::backend::{BlobStorage, StoredObject};
use crate::error::RemoteError;
use crate::urls::{object_path_from_url, public_object_url};

/// Upper bound on entries returned by a single listing.
const LIST_LIMIT: u32 = 1000;

impl SupabaseClient {
    fn object_endpoint(&self, path: &str) -> String {
        self.endpoint(&format!("storage/v1/object/{}/{path}", self.config.bucket))
    }
}

#[async_trait]
impl BlobStorage for SupabaseClient {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        let size = bytes.len();
        let request = self
            .client
            .post(self.object_endpoint(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes);
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(response).await?;
        tracing::debug!(path, size, "Object uploaded");
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        public_object_url(&self.config.url, &self.config.bucket, path)
    }

    fn object_path(&self, url: &str) -> Option<String> {
        object_path_from_url(url, &self.config.bucket)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), RemoteError> {
        if paths.is_empty() {
            return Ok(());
        }
        let request = self
            .client
            .delete(self.endpoint(&format!("storage/v1/object/{}", self.config.bucket)))
            .json(&serde_json::json!({ "prefixes": paths }));
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(response).await?;
        tracing::debug!(count = paths.len(), "Objects removed");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, RemoteError> {
        let request = self
            .client
            .post(self.endpoint(&format!("storage/v1/object/list/{}", self.config.bucket)))
            .json(&serde_json::json!({
                "prefix": prefix,
                "limit": LIST_LIMIT,
                "offset": 0,
                "sortBy": { "column": "name", "order": "asc" },
            }));
        let response = self.authorized(request).await.send().await?;
        Self::parse_response(response).await
    }
}
