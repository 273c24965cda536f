//! Collection state manager.
//!
//! Holds the signed-in user's collection in memory and mirrors it to the
//! remote store as one document. Every mutation follows the same two-phase
//! contract:
//!
//! 1. commit the change to local state,
//! 2. upsert the whole document,
//! 3. if the upsert fails, reconcile by reloading the remote document.
//!
//! Blob deletes that accompany a mutation are best effort and never abort it.

use std::sync::Arc;

use dinodex_core::collection::{self, Category, Dino, DinoImage};
use dinodex_core::colors::{CategoryView, FilterMode};
use dinodex_core::error::CoreError;
use dinodex_core::master_list::find_master_entry;
use dinodex_core::types::AuthUser;
use dinodex_core::upload::{validate_upload_batch, TaggedUpload};
use dinodex_remote::{AuthBackend, DocumentStore};
use futures::future::join_all;
use tokio::sync::RwLock;

use crate::error::{ClientError, ClientResult};
use crate::images::ImageTransfer;

/// In-memory cache of one user's collection document.
pub struct CollectionManager {
    collection: RwLock<Vec<Dino>>,
    auth: Arc<dyn AuthBackend>,
    documents: Arc<dyn DocumentStore>,
    images: ImageTransfer,
}

impl CollectionManager {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        documents: Arc<dyn DocumentStore>,
        images: ImageTransfer,
    ) -> Self {
        Self {
            collection: RwLock::new(Vec::new()),
            auth,
            documents,
            images,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Snapshot of the current collection.
    pub async fn collection(&self) -> Vec<Dino> {
        self.collection.read().await.clone()
    }

    /// First entry with the given id.
    pub async fn find_dino(&self, dino_id: &str) -> Option<Dino> {
        self.collection
            .read()
            .await
            .iter()
            .find(|d| d.id == dino_id)
            .cloned()
    }

    pub async fn total_colors(&self) -> usize {
        collection::total_colors(&self.collection.read().await)
    }

    /// Filtered, numerically sorted images of a category (owner view:
    /// exact color match).
    pub async fn sorted_images(
        &self,
        dino_id: &str,
        category_id: &str,
        filter: &str,
    ) -> Option<Vec<DinoImage>> {
        let dinos = self.collection.read().await;
        let category = find_category(&dinos, dino_id, category_id)?;
        Some(CategoryView::new(category, FilterMode::Exact).images(filter))
    }

    /// Requested colors absent from a category.
    pub async fn missing_colors(
        &self,
        dino_id: &str,
        category_id: &str,
        query: &str,
    ) -> Option<Vec<String>> {
        let dinos = self.collection.read().await;
        let category = find_category(&dinos, dino_id, category_id)?;
        Some(CategoryView::new(category, FilterMode::Exact).missing_colors(query))
    }

    // -----------------------------------------------------------------------
    // Remote document
    // -----------------------------------------------------------------------

    /// Replace local state with the signed-in user's remote document.
    ///
    /// A missing document yields an empty collection. A failed fetch is
    /// logged and leaves local state untouched. Does nothing when signed out.
    pub async fn load_collection(&self) {
        let Some(user) = self.auth.current_user().await else {
            tracing::debug!("Skipping collection load, no user signed in");
            return;
        };

        match self.documents.fetch_collection(&user.id).await {
            Ok(Some(dinos)) => {
                tracing::info!(user_id = %user.id, dinos = dinos.len(), "Collection loaded");
                *self.collection.write().await = dinos;
            }
            Ok(None) => {
                tracing::info!(user_id = %user.id, "No collection document yet, starting empty");
                self.collection.write().await.clear();
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to load collection, keeping local state");
            }
        }
    }

    /// Upsert the whole in-memory collection as the user's document.
    ///
    /// A no-op when no user is signed in.
    pub async fn sync_collection(&self) -> ClientResult<()> {
        let Some(user) = self.auth.current_user().await else {
            tracing::debug!("Skipping collection sync, no user signed in");
            return Ok(());
        };

        let snapshot = self.collection().await;
        self.documents.upsert_collection(&user.id, &snapshot).await?;
        tracing::debug!(user_id = %user.id, dinos = snapshot.len(), "Collection synced");
        Ok(())
    }

    /// Reset to the signed-out state.
    pub async fn clear(&self) {
        self.collection.write().await.clear();
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append `dino` with an empty category list.
    ///
    /// Duplicate ids are allowed; the collection is a list, not a set.
    pub async fn add_to_collection(&self, dino: Dino) -> Dino {
        let entry = Dino {
            categories: Vec::new(),
            ..dino
        };
        self.collection.write().await.push(entry.clone());
        tracing::info!(dino_id = %entry.id, name = %entry.name, "Dino added");
        self.persist().await;
        entry
    }

    /// Add a master list entry by id.
    pub async fn add_from_master(&self, master_id: &str) -> ClientResult<Dino> {
        let entry = find_master_entry(master_id)
            .ok_or_else(|| CoreError::not_found("master list entry", master_id))?;
        Ok(self.add_to_collection(Dino::from_master(entry)).await)
    }

    /// Remove every entry with `dino_id`, deleting all of their images first.
    pub async fn remove_from_collection(&self, dino_id: &str) {
        let urls: Vec<String> = self
            .collection
            .read()
            .await
            .iter()
            .filter(|d| d.id == dino_id)
            .flat_map(|d| d.images().map(|img| img.url.clone()).collect::<Vec<_>>())
            .collect();

        for url in &urls {
            self.images.delete_image(url).await;
        }

        self.collection.write().await.retain(|d| d.id != dino_id);
        tracing::info!(dino_id, images = urls.len(), "Dino removed");
        self.persist().await;
    }

    /// Append a new empty category to the dino.
    ///
    /// Blank names are rejected here with `Validation` rather than left to
    /// the caller's form check, and an unknown dino yields `NotFound`.
    pub async fn add_category(&self, dino_id: &str, name: &str) -> ClientResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("Category name must not be empty".to_string()).into());
        }

        let category = Category::new(name);
        {
            let mut dinos = self.collection.write().await;
            let dino = dinos
                .iter_mut()
                .find(|d| d.id == dino_id)
                .ok_or_else(|| CoreError::not_found("dino", dino_id))?;
            dino.categories.push(category.clone());
        }

        tracing::info!(dino_id, category_id = %category.id, "Category added");
        self.persist().await;
        Ok(category)
    }

    /// Remove a category after deleting all of its images.
    pub async fn remove_category(&self, dino_id: &str, category_id: &str) -> ClientResult<()> {
        let urls: Vec<String> = {
            let dinos = self.collection.read().await;
            let category = find_category(&dinos, dino_id, category_id)
                .ok_or_else(|| CoreError::not_found("category", category_id))?;
            category.images.iter().map(|img| img.url.clone()).collect()
        };

        for url in &urls {
            self.images.delete_image(url).await;
        }

        {
            let mut dinos = self.collection.write().await;
            for dino in dinos.iter_mut().filter(|d| d.id == dino_id) {
                dino.categories.retain(|c| c.id != category_id);
            }
        }

        tracing::info!(dino_id, category_id, images = urls.len(), "Category removed");
        self.persist().await;
        Ok(())
    }

    /// Append already uploaded images to a category.
    pub async fn add_images(
        &self,
        dino_id: &str,
        category_id: &str,
        images: Vec<DinoImage>,
    ) -> ClientResult<()> {
        let count = images.len();
        {
            let mut dinos = self.collection.write().await;
            let category = find_category_mut(&mut dinos, dino_id, category_id)
                .ok_or_else(|| CoreError::not_found("category", category_id))?;
            category.images.extend(images);
        }

        tracing::info!(dino_id, category_id, count, "Images added");
        self.persist().await;
        Ok(())
    }

    /// Remove one image: local state first, then the blob, then the document.
    ///
    /// If persisting fails the remote document is reloaded, which restores
    /// the image locally when the document still lists it.
    pub async fn remove_image(
        &self,
        dino_id: &str,
        category_id: &str,
        image_id: &str,
    ) -> ClientResult<()> {
        let url = {
            let mut dinos = self.collection.write().await;
            let category = find_category_mut(&mut dinos, dino_id, category_id)
                .ok_or_else(|| CoreError::not_found("category", category_id))?;
            let index = category
                .images
                .iter()
                .position(|img| img.id == image_id)
                .ok_or_else(|| CoreError::not_found("image", image_id))?;
            category.images.remove(index).url
        };

        self.images.delete_image(&url).await;
        tracing::info!(dino_id, category_id, image_id, "Image removed");
        self.persist().await;
        Ok(())
    }

    /// Validate, upload and attach a batch of tagged files to a category.
    ///
    /// Nothing is uploaded unless the whole batch validates. Files upload
    /// concurrently; if any upload fails, the ones that succeeded are
    /// deleted again and the category is left unchanged. The same cleanup
    /// runs when the category disappears while the uploads are in flight.
    pub async fn upload_to_category(
        &self,
        dino_id: &str,
        category_id: &str,
        batch: Vec<TaggedUpload>,
    ) -> ClientResult<Vec<DinoImage>> {
        validate_upload_batch(&batch)?;
        let user = self.require_user().await?;

        {
            let dinos = self.collection.read().await;
            find_category(&dinos, dino_id, category_id)
                .ok_or_else(|| CoreError::not_found("category", category_id))?;
        }

        let results = join_all(
            batch
                .iter()
                .map(|upload| self.images.upload_image(&upload.file, &user.id)),
        )
        .await;

        let mut urls = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(url) => urls.push(url),
                Err(e) => {
                    tracing::error!(user_id = %user.id, error = %e, "Error uploading image");
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            for url in &urls {
                self.images.delete_image(url).await;
            }
            return Err(e.into());
        }

        let images: Vec<DinoImage> = batch
            .iter()
            .zip(urls)
            .map(|(upload, url)| DinoImage::new(url, upload.color.trim()))
            .collect();
        if let Err(e) = self.add_images(dino_id, category_id, images.clone()).await {
            tracing::warn!(dino_id, category_id, error = %e, "Discarding uploaded images");
            for img in &images {
                self.images.delete_image(&img.url).await;
            }
            return Err(e);
        }
        Ok(images)
    }

    /// Delete every blob under the user's prefix and empty the document.
    pub async fn reset_collection(&self) -> ClientResult<()> {
        let user = self.require_user().await?;
        self.images.delete_user_images(&user.id).await;
        self.collection.write().await.clear();
        tracing::info!(user_id = %user.id, "Collection reset");
        self.persist().await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Persist after a local commit; reconcile from the remote document when
    /// the write fails.
    async fn persist(&self) {
        if let Err(e) = self.sync_collection().await {
            tracing::warn!(error = %e, "Collection sync failed, reloading remote document");
            self.load_collection().await;
        }
    }

    async fn require_user(&self) -> ClientResult<AuthUser> {
        self.auth.current_user().await.ok_or(ClientError::NotSignedIn)
    }
}

/// The category `category_id` under the first dino `dino_id` that holds it.
fn find_category<'a>(dinos: &'a [Dino], dino_id: &str, category_id: &str) -> Option<&'a Category> {
    dinos
        .iter()
        .filter(|d| d.id == dino_id)
        .find_map(|d| d.category(category_id))
}

fn find_category_mut<'a>(
    dinos: &'a mut [Dino],
    dino_id: &str,
    category_id: &str,
) -> Option<&'a mut Category> {
    dinos
        .iter_mut()
        .filter(|d| d.id == dino_id)
        .find_map(|d| d.category_mut(category_id))
}
