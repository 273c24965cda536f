//! Collection document model.
//!
//! A user's whole collection is one ordered list of [`Dino`] entries stored
//! as a single JSON value. Field names are camelCase on the wire so the
//! stored document keeps the shape shared with every other client of the
//! same table.

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::new_entity_id;
use crate::master_list::MasterEntry;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// One tracked creature in a user's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dino {
    /// Master list id (not unique within a collection).
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub added_at: Timestamp,
}

/// A named group of color variant images belonging to one [`Dino`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<DinoImage>,
    #[serde(default)]
    pub created_at: Timestamp,
}

/// An uploaded reference image tagged with a color identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DinoImage {
    pub id: String,
    /// Public URL of the blob in the storage bucket.
    pub url: String,
    /// Free-form color tag, conventionally `0..=254`.
    #[serde(deserialize_with = "deserialize_color")]
    pub color: String,
}

impl Dino {
    /// Create a collection entry from a master list entry.
    ///
    /// The categories list always starts empty.
    pub fn from_master(entry: &MasterEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            categories: Vec::new(),
            added_at: chrono::Utc::now(),
        }
    }

    pub fn category(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    pub fn category_mut(&mut self, category_id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id == category_id)
    }

    /// Every image across every category of this dino.
    pub fn images(&self) -> impl Iterator<Item = &DinoImage> {
        self.categories.iter().flat_map(|c| c.images.iter())
    }
}

impl Category {
    /// Create an empty category with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_entity_id(),
            name: name.into(),
            images: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }

    pub fn image(&self, image_id: &str) -> Option<&DinoImage> {
        self.images.iter().find(|i| i.id == image_id)
    }
}

impl DinoImage {
    /// Create an image record for an already uploaded blob.
    pub fn new(url: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: new_entity_id(),
            url: url.into(),
            color: color.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Legacy color values
// ---------------------------------------------------------------------------

/// Older documents stored numeric colors; accept both and keep a string.
fn deserialize_color<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawColor {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawColor::deserialize(deserializer)? {
        RawColor::Text(s) => s,
        RawColor::Int(n) => n.to_string(),
        RawColor::Float(f) => f.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Collection-wide helpers
// ---------------------------------------------------------------------------

/// Total number of images across the whole collection.
pub fn total_colors(dinos: &[Dino]) -> usize {
    dinos
        .iter()
        .flat_map(|d| d.categories.iter())
        .map(|c| c.images.len())
        .sum()
}

/// Sort dinos alphabetically by name (case-insensitive, stable).
pub fn sort_by_name(dinos: &mut [Dino]) {
    dinos.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Dinos whose name contains `query`, ignoring case. An empty query matches all.
pub fn search_by_name<'a>(dinos: &'a [Dino], query: &str) -> Vec<&'a Dino> {
    let needle = query.trim().to_lowercase();
    dinos
        .iter()
        .filter(|d| needle.is_empty() || d.name.to_lowercase().contains(&needle))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
