//! Image blob transfer.
//!
//! Uploads store files under a per-user prefix and hand back a public URL.
//! Deletes are best effort: failures are logged and never propagated, so a
//! cascading delete is never blocked by one stubborn blob.

use std::sync::Arc;

use dinodex_core::upload::{generate_object_name, user_object_path, UploadFile};
use dinodex_remote::{BlobStorage, RemoteError};

/// Upload/delete helper over the blob storage bucket.
#[derive(Clone)]
pub struct ImageTransfer {
    storage: Arc<dyn BlobStorage>,
}

impl ImageTransfer {
    pub fn new(storage: Arc<dyn BlobStorage>) -> Self {
        Self { storage }
    }

    /// Store `file` under `{user_id}/` with a random name keeping the
    /// original extension. Returns the public URL.
    pub async fn upload_image(&self, file: &UploadFile, user_id: &str) -> Result<String, RemoteError> {
        let path = user_object_path(user_id, &generate_object_name(&file.file_name));
        let stored = self
            .storage
            .upload(&path, file.bytes.clone(), &file.content_type)
            .await?;
        tracing::debug!(user_id, path = %stored, "Image uploaded");
        Ok(self.storage.public_url(&stored))
    }

    /// Delete the blob behind a public URL. Never fails.
    pub async fn delete_image(&self, url: &str) {
        let Some(path) = self.storage.object_path(url) else {
            tracing::warn!(url, "Could not derive storage path from image URL");
            return;
        };
        match self.storage.remove(std::slice::from_ref(&path)).await {
            Ok(()) => tracing::debug!(path = %path, "Image deleted"),
            Err(e) => tracing::error!(path = %path, error = %e, "Storage delete error"),
        }
    }

    /// Delete every blob under the user's prefix. Never fails.
    pub async fn delete_user_images(&self, user_id: &str) {
        let objects = match self.storage.list(user_id).await {
            Ok(objects) => objects,
            Err(e) => {
                tracing::error!(user_id, error = %e, "Error listing user images");
                return;
            }
        };
        if objects.is_empty() {
            return;
        }

        let paths: Vec<String> = objects
            .iter()
            .map(|o| user_object_path(user_id, &o.name))
            .collect();
        match self.storage.remove(&paths).await {
            Ok(()) => tracing::info!(user_id, count = paths.len(), "User images deleted"),
            Err(e) => tracing::error!(user_id, error = %e, "Storage bulk delete error"),
        }
    }
}
