//! Read-only loader for another user's collection.
//!
//! An identifier from a share link is resolved as an alias first and taken
//! literally as a user id otherwise. The result exposes derived views only;
//! nothing in this module can mutate a collection.

use std::sync::Arc;

use dinodex_core::collection::{self, Category, Dino};
use dinodex_core::colors::{CategoryView, FilterMode};
use dinodex_remote::{AliasStore, DocumentStore};

/// Failure to load a shared collection. Display strings are shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SharedViewError {
    #[error("No identifier provided")]
    NoIdentifier,

    #[error("Collection not found")]
    NotFound,

    #[error("Failed to load collection")]
    LoadFailed,
}

/// Resolves share identifiers and fetches the matching document.
pub struct SharedViewLoader {
    aliases: Arc<dyn AliasStore>,
    documents: Arc<dyn DocumentStore>,
}

impl SharedViewLoader {
    pub fn new(aliases: Arc<dyn AliasStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { aliases, documents }
    }

    pub async fn load(&self, identifier: Option<&str>) -> Result<SharedCollection, SharedViewError> {
        let identifier = identifier
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(SharedViewError::NoIdentifier)?;

        let user_id = self.resolve(identifier).await;

        let mut dinos = match self.documents.fetch_collection(&user_id).await {
            Ok(Some(dinos)) => dinos,
            Ok(None) => {
                tracing::debug!(identifier, user_id = %user_id, "No shared collection");
                return Err(SharedViewError::NotFound);
            }
            Err(e) => {
                tracing::error!(identifier, user_id = %user_id, error = %e, "Error loading shared collection");
                return Err(SharedViewError::LoadFailed);
            }
        };

        collection::sort_by_name(&mut dinos);
        Ok(SharedCollection {
            identifier: identifier.to_string(),
            user_id,
            dinos,
        })
    }

    /// User id behind `identifier`. Falls back to the identifier itself when
    /// no alias matches or the alias lookup fails.
    async fn resolve(&self, identifier: &str) -> String {
        match self.aliases.resolve_alias(identifier).await {
            Ok(Some(user_id)) => {
                tracing::debug!(identifier, user_id = %user_id, "Alias resolved");
                user_id
            }
            Ok(None) => identifier.to_string(),
            Err(e) => {
                tracing::warn!(identifier, error = %e, "Alias lookup failed, using identifier as user id");
                identifier.to_string()
            }
        }
    }
}

/// Another user's collection, sorted by name.
#[derive(Debug, Clone)]
pub struct SharedCollection {
    identifier: String,
    user_id: String,
    dinos: Vec<Dino>,
}

impl SharedCollection {
    /// The identifier as it appeared in the link.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn dinos(&self) -> &[Dino] {
        &self.dinos
    }

    pub fn search(&self, query: &str) -> Vec<&Dino> {
        collection::search_by_name(&self.dinos, query)
    }

    pub fn total_colors(&self) -> usize {
        collection::total_colors(&self.dinos)
    }

    pub fn dino(&self, dino_id: &str) -> Option<&Dino> {
        self.dinos.iter().find(|d| d.id == dino_id)
    }

    /// Derived view of one category, filtering by color substring.
    pub fn category_view(&self, dino_id: &str, category_id: &str) -> Option<CategoryView<'_>> {
        self.dinos
            .iter()
            .filter(|d| d.id == dino_id)
            .find_map(|d| d.category(category_id))
            .map(|c| CategoryView::new(c, FilterMode::Contains))
    }

    /// First dino and its first category, the initial selection of a viewer.
    pub fn default_selection(&self) -> Option<(&Dino, Option<&Category>)> {
        let dino = self.dinos.first()?;
        Some((dino, dino.categories.first()))
    }
}
