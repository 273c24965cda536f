//! Collaborator traits for the hosted backend.
//!
//! The state managers only ever talk to these traits, so the HTTP client and
//! the in-memory backend are interchangeable.

use async_trait::async_trait;
use dinodex_core::collection::Dino;
use dinodex_core::types::{AuthUser, Timestamp};
use dinodex_events::SessionEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::RemoteError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<Timestamp>,
    pub user: AuthUser,
}

/// One entry returned by a bucket listing. `name` is relative to the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Managed authentication.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// The current session, if any.
    async fn current_session(&self) -> Option<Session>;

    async fn current_user(&self) -> Option<AuthUser> {
        self.current_session().await.map(|s| s.user)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, RemoteError>;

    /// Register a new account. Returns a session when the backend signs the
    /// user in immediately, `None` when it requires confirmation first.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, RemoteError>;

    async fn refresh_session(&self) -> Result<Session, RemoteError>;

    /// End the session. The local session is cleared even when the remote
    /// call fails.
    async fn sign_out(&self) -> Result<(), RemoteError>;

    /// Receive every subsequent session change.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Row store holding one collection document per user, keyed by user id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The stored document, or `None` when the user has none yet.
    async fn fetch_collection(&self, user_id: &str) -> Result<Option<Vec<Dino>>, RemoteError>;

    /// Replace the user's whole document (upsert on `user_id`).
    async fn upsert_collection(&self, user_id: &str, dinos: &[Dino]) -> Result<(), RemoteError>;
}

/// Share alias table: unique `domain` values, at most one per user.
#[async_trait]
pub trait AliasStore: Send + Sync {
    async fn resolve_alias(&self, domain: &str) -> Result<Option<String>, RemoteError>;

    async fn alias_for_user(&self, user_id: &str) -> Result<Option<String>, RemoteError>;

    /// Whether `domain` already belongs to a user other than `user_id`.
    async fn alias_taken_by_other(&self, domain: &str, user_id: &str)
        -> Result<bool, RemoteError>;

    /// Set the user's alias (upsert on `user_id`). A domain held by another
    /// user yields [`RemoteError::Conflict`].
    async fn upsert_alias(&self, user_id: &str, domain: &str) -> Result<(), RemoteError>;
}

/// Blob storage bucket.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `bytes` at `path` and return the stored path.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, RemoteError>;

    /// Public URL of a stored path.
    fn public_url(&self, path: &str) -> String;

    /// Inverse of [`public_url`](Self::public_url).
    fn object_path(&self, url: &str) -> Option<String>;

    async fn remove(&self, paths: &[String]) -> Result<(), RemoteError>;

    /// Objects directly under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, RemoteError>;
}
