//! In-process implementation of every backend collaborator.
//!
//! [`MemoryBackend`] keeps accounts, collection documents, aliases and blobs
//! in `RwLock`-guarded maps. Documents are stored as serialized JSON so a
//! load goes through the same decoding as a real fetch. Failure switches let
//! callers simulate an unreachable backend for individual operations.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dinodex_core::collection::Dino;
use dinodex_core::types::{AuthUser, UserId};
use dinodex_events::{EventBus, SessionEvent};
use tokio::sync::{broadcast, RwLock};

use crate::backend::{AliasStore, AuthBackend, BlobStorage, DocumentStore, Session, StoredObject};
use crate::error::RemoteError;
use crate::urls::{object_path_from_url, public_object_url};

/// Base URL used for public object URLs.
pub const MEMORY_BASE_URL: &str = "http://localhost:54321";

/// Bucket name used for public object URLs.
pub const MEMORY_BUCKET: &str = "dino-images";

/// A blob held by the in-memory bucket.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
struct FailureSwitches {
    fetches: AtomicBool,
    upserts: AtomicBool,
    uploads: AtomicBool,
    removals: AtomicBool,
    alias_lookups: AtomicBool,
}

/// In-memory backend.
pub struct MemoryBackend {
    session: RwLock<Option<Session>>,
    accounts: RwLock<HashMap<String, (String, AuthUser)>>,
    documents: RwLock<HashMap<UserId, serde_json::Value>>,
    aliases: RwLock<HashMap<UserId, String>>,
    objects: RwLock<BTreeMap<String, StoredBlob>>,
    events: Arc<EventBus>,
    fail: FailureSwitches,
    upserts: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_events(Arc::new(EventBus::default()))
    }

    /// Publish session changes on a shared bus.
    pub fn with_events(events: Arc<EventBus>) -> Self {
        Self {
            session: RwLock::new(None),
            accounts: RwLock::new(HashMap::new()),
            documents: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
            objects: RwLock::new(BTreeMap::new()),
            events,
            fail: FailureSwitches::default(),
            upserts: AtomicUsize::new(0),
        }
    }

    pub fn events(&self) -> Arc<EventBus> {
        Arc::clone(&self.events)
    }

    // ---- seeding and inspection ----

    /// Register an account usable with [`AuthBackend::sign_in_with_password`].
    pub async fn register(&self, email: &str, password: &str, user: AuthUser) {
        self.accounts
            .write()
            .await
            .insert(email.to_string(), (password.to_string(), user));
    }

    /// Start a session for `user` without credentials.
    pub async fn sign_in_as(&self, user: AuthUser) -> Session {
        let session = Self::session_for(user);
        *self.session.write().await = Some(session.clone());
        self.events.publish(SessionEvent::signed_in(session.user.clone()));
        session
    }

    /// Store a document directly, bypassing the upsert counter.
    pub async fn put_document(&self, user_id: &str, dinos: &[Dino]) {
        let value = serde_json::to_value(dinos).unwrap_or(serde_json::Value::Null);
        self.documents.write().await.insert(user_id.to_string(), value);
    }

    /// Decode the stored document for `user_id`, if any.
    pub async fn stored_document(&self, user_id: &str) -> Option<Vec<Dino>> {
        let value = self.documents.read().await.get(user_id).cloned()?;
        serde_json::from_value(value).ok()
    }

    pub async fn put_alias(&self, user_id: &str, domain: &str) {
        self.aliases
            .write()
            .await
            .insert(user_id.to_string(), domain.to_string());
    }

    /// Paths of every stored object, sorted.
    pub async fn object_paths(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn object(&self, path: &str) -> Option<StoredBlob> {
        self.objects.read().await.get(path).cloned()
    }

    /// Number of successful document upserts so far.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    // ---- failure switches ----

    pub fn fail_fetches(&self, fail: bool) {
        self.fail.fetches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail.upserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail.uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removals(&self, fail: bool) {
        self.fail.removals.store(fail, Ordering::SeqCst);
    }

    pub fn fail_alias_lookups(&self, fail: bool) {
        self.fail.alias_lookups.store(fail, Ordering::SeqCst);
    }

    // ---- private helpers ----

    fn check(switch: &AtomicBool, operation: &str) -> Result<(), RemoteError> {
        if switch.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable(format!("{operation} disabled")));
        }
        Ok(())
    }

    fn session_for(user: AuthUser) -> Session {
        Session {
            access_token: format!("access-{}", user.id),
            refresh_token: format!("refresh-{}", user.id),
            expires_at: None,
            user,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// AuthBackend
// ---------------------------------------------------------------------------

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, RemoteError> {
        let user = match self.accounts.read().await.get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => return Err(RemoteError::InvalidCredentials),
        };
        Ok(self.sign_in_as(user).await)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, RemoteError> {
        if self.accounts.read().await.contains_key(email) {
            return Err(RemoteError::Conflict(format!("{email} is already registered")));
        }
        let user = AuthUser::new(dinodex_core::ids::new_entity_id()).with_email(email);
        self.register(email, password, user.clone()).await;
        Ok(Some(self.sign_in_as(user).await))
    }

    async fn refresh_session(&self) -> Result<Session, RemoteError> {
        let user = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.user.clone())
            .ok_or(RemoteError::NotSignedIn)?;
        let session = Self::session_for(user);
        *self.session.write().await = Some(session.clone());
        self.events
            .publish(SessionEvent::token_refreshed(session.user.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        *self.session.write().await = None;
        self.events.publish(SessionEvent::signed_out());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn fetch_collection(&self, user_id: &str) -> Result<Option<Vec<Dino>>, RemoteError> {
        Self::check(&self.fail.fetches, "fetch")?;
        match self.documents.read().await.get(user_id) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    async fn upsert_collection(&self, user_id: &str, dinos: &[Dino]) -> Result<(), RemoteError> {
        Self::check(&self.fail.upserts, "upsert")?;
        let value = serde_json::to_value(dinos)?;
        self.documents.write().await.insert(user_id.to_string(), value);
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AliasStore
// ---------------------------------------------------------------------------

#[async_trait]
impl AliasStore for MemoryBackend {
    async fn resolve_alias(&self, domain: &str) -> Result<Option<String>, RemoteError> {
        Self::check(&self.fail.alias_lookups, "alias lookup")?;
        Ok(self
            .aliases
            .read()
            .await
            .iter()
            .find(|(_, d)| d.as_str() == domain)
            .map(|(user_id, _)| user_id.clone()))
    }

    async fn alias_for_user(&self, user_id: &str) -> Result<Option<String>, RemoteError> {
        Self::check(&self.fail.alias_lookups, "alias lookup")?;
        Ok(self.aliases.read().await.get(user_id).cloned())
    }

    async fn alias_taken_by_other(&self, domain: &str, user_id: &str) -> Result<bool, RemoteError> {
        Self::check(&self.fail.alias_lookups, "alias lookup")?;
        Ok(self
            .aliases
            .read()
            .await
            .iter()
            .any(|(owner, d)| d.as_str() == domain && owner.as_str() != user_id))
    }

    async fn upsert_alias(&self, user_id: &str, domain: &str) -> Result<(), RemoteError> {
        let mut aliases = self.aliases.write().await;
        if aliases
            .iter()
            .any(|(owner, d)| d.as_str() == domain && owner.as_str() != user_id)
        {
            return Err(RemoteError::Conflict(format!(
                "domain '{domain}' is already taken"
            )));
        }
        aliases.insert(user_id.to_string(), domain.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BlobStorage
// ---------------------------------------------------------------------------

#[async_trait]
impl BlobStorage for MemoryBackend {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RemoteError> {
        Self::check(&self.fail.uploads, "upload")?;
        let mut objects = self.objects.write().await;
        if objects.contains_key(path) {
            return Err(RemoteError::Conflict(format!("object '{path}' already exists")));
        }
        objects.insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        public_object_url(MEMORY_BASE_URL, MEMORY_BUCKET, path)
    }

    fn object_path(&self, url: &str) -> Option<String> {
        object_path_from_url(url, MEMORY_BUCKET)
    }

    async fn remove(&self, paths: &[String]) -> Result<(), RemoteError> {
        Self::check(&self.fail.removals, "remove")?;
        let mut objects = self.objects.write().await;
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, RemoteError> {
        let dir = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter_map(|path| path.strip_prefix(&dir))
            .filter(|rest| !rest.contains('/'))
            .map(|name| StoredObject {
                name: name.to_string(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use dinodex_events::SessionEventKind;

    use super::*;

    #[tokio::test]
    async fn password_sign_in_publishes_event() {
        let backend = MemoryBackend::new();
        backend
            .register("a@b.c", "hunter2", AuthUser::new("u-1"))
            .await;
        let mut rx = backend.subscribe();

        let session = backend.sign_in_with_password("a@b.c", "hunter2").await.unwrap();
        assert_eq!(session.user.id, "u-1");
        assert_eq!(rx.recv().await.unwrap().kind, SessionEventKind::SignedIn);
        assert_eq!(backend.current_user().await.unwrap().id, "u-1");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let backend = MemoryBackend::new();
        backend.register("a@b.c", "hunter2", AuthUser::new("u-1")).await;
        assert_matches!(
            backend.sign_in_with_password("a@b.c", "nope").await,
            Err(RemoteError::InvalidCredentials)
        );
        assert!(backend.current_session().await.is_none());
    }

    #[tokio::test]
    async fn refresh_requires_session() {
        let backend = MemoryBackend::new();
        assert_matches!(backend.refresh_session().await, Err(RemoteError::NotSignedIn));
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let backend = MemoryBackend::new();
        assert!(backend.fetch_collection("u-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn alias_domains_are_unique() {
        let backend = MemoryBackend::new();
        backend.upsert_alias("u-1", "rexes").await.unwrap();
        assert_matches!(
            backend.upsert_alias("u-2", "rexes").await,
            Err(RemoteError::Conflict(_))
        );
        // Same user may re-save or rename.
        backend.upsert_alias("u-1", "rexes").await.unwrap();
        backend.upsert_alias("u-1", "raptors").await.unwrap();
        assert_eq!(backend.resolve_alias("raptors").await.unwrap().as_deref(), Some("u-1"));
        assert!(backend.resolve_alias("rexes").await.unwrap().is_none());
        assert!(!backend.alias_taken_by_other("raptors", "u-1").await.unwrap());
        assert!(backend.alias_taken_by_other("raptors", "u-2").await.unwrap());
    }

    #[tokio::test]
    async fn list_returns_names_under_prefix_only() {
        let backend = MemoryBackend::new();
        backend.upload("u-1/a.png", vec![1], "image/png").await.unwrap();
        backend.upload("u-1/b.jpg", vec![2], "image/jpeg").await.unwrap();
        backend.upload("u-10/c.png", vec![3], "image/png").await.unwrap();

        let names: Vec<String> = backend
            .list("u-1")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["a.png", "b.jpg"]);
    }

    #[tokio::test]
    async fn public_url_maps_back_to_path() {
        let backend = MemoryBackend::new();
        let url = backend.public_url("u-1/a.png");
        assert_eq!(backend.object_path(&url).as_deref(), Some("u-1/a.png"));
    }

    #[tokio::test]
    async fn failure_switches_take_effect() {
        let backend = MemoryBackend::new();
        backend.fail_upserts(true);
        assert_matches!(
            backend.upsert_collection("u-1", &[]).await,
            Err(RemoteError::Unavailable(_))
        );
        backend.fail_upserts(false);
        backend.upsert_collection("u-1", &[]).await.unwrap();
        assert_eq!(backend.upsert_count(), 1);
    }
}
