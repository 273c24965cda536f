//! Signed-in identity tracking.
//!
//! [`AuthManager`] mirrors the auth backend's session into local state and
//! drives the [`CollectionManager`] it was constructed with: a new user
//! triggers a full collection load, sign-out resets the collection.

use std::sync::Arc;

use dinodex_core::alias::normalize_alias;
use dinodex_core::error::CoreError;
use dinodex_core::share::{share_identifier, share_url};
use dinodex_core::types::AuthUser;
use dinodex_events::{SessionEvent, SessionEventKind};
use dinodex_remote::{AliasStore, AuthBackend, RemoteError};
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::collection::CollectionManager;
use crate::error::{ClientError, ClientResult};

const DOMAIN_TAKEN: &str = "This domain is already taken";

/// Tracks the signed-in user and their share alias.
pub struct AuthManager {
    auth: Arc<dyn AuthBackend>,
    aliases: Arc<dyn AliasStore>,
    collection: Arc<CollectionManager>,
    user: RwLock<Option<AuthUser>>,
    custom_domain: RwLock<Option<String>>,
    /// Serializes sign-in and sign-out transitions so a user only counts as
    /// current once their collection has loaded.
    transition: Mutex<()>,
}

impl AuthManager {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        aliases: Arc<dyn AliasStore>,
        collection: Arc<CollectionManager>,
    ) -> Self {
        Self {
            auth,
            aliases,
            collection,
            user: RwLock::new(None),
            custom_domain: RwLock::new(None),
            transition: Mutex::new(()),
        }
    }

    pub async fn user(&self) -> Option<AuthUser> {
        self.user.read().await.clone()
    }

    pub async fn custom_domain(&self) -> Option<String> {
        self.custom_domain.read().await.clone()
    }

    pub fn collection(&self) -> &Arc<CollectionManager> {
        &self.collection
    }

    /// Adopt a session that already exists when the process starts.
    pub async fn initialize(&self) {
        match self.auth.current_user().await {
            Some(user) => self.adopt(user).await,
            None => tracing::debug!("No existing session"),
        }
    }

    /// Apply one session change.
    pub async fn handle_event(&self, event: SessionEvent) {
        match (event.kind, event.user) {
            (SessionEventKind::SignedIn | SessionEventKind::TokenRefreshed, Some(user)) => {
                self.adopt(user).await;
            }
            (SessionEventKind::SignedOut, _) => self.reset().await,
            (kind, None) => {
                tracing::warn!(?kind, "Session event without a user, ignoring");
            }
        }
    }

    /// Session listener loop.
    ///
    /// Applies every event from `receiver` until the bus is dropped. A lagged
    /// receiver resynchronizes from the backend's current session.
    pub async fn run(self: Arc<Self>, mut receiver: broadcast::Receiver<SessionEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.handle_event(event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Session listener lagged, resynchronizing");
                    match self.auth.current_user().await {
                        Some(user) => self.adopt(user).await,
                        None => self.reset().await,
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Session bus closed, listener shutting down");
                    break;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Credentials
    // -----------------------------------------------------------------------

    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthUser> {
        let session = self.auth.sign_in_with_password(email.trim(), password).await?;
        self.adopt(session.user.clone()).await;
        Ok(session.user)
    }

    /// Register a new account. Returns `None` when the backend asks for
    /// email confirmation before the first sign-in.
    pub async fn sign_up(&self, email: &str, password: &str) -> ClientResult<Option<AuthUser>> {
        let Some(session) = self.auth.sign_up(email.trim(), password).await? else {
            tracing::info!("Sign-up pending email confirmation");
            return Ok(None);
        };
        self.adopt(session.user.clone()).await;
        Ok(Some(session.user))
    }

    /// End the session. Local state is reset even if the backend call fails.
    pub async fn sign_out(&self) -> ClientResult<()> {
        let result = self.auth.sign_out().await;
        self.reset().await;
        result.map_err(ClientError::from)
    }

    // -----------------------------------------------------------------------
    // Share alias
    // -----------------------------------------------------------------------

    /// Normalize and save a share alias for the signed-in user.
    ///
    /// Returns the stored form. A domain held by another user is rejected
    /// without writing.
    pub async fn set_custom_domain(&self, raw: &str) -> ClientResult<String> {
        let domain = normalize_alias(raw)?;
        let user = self.user().await.ok_or(ClientError::NotSignedIn)?;

        if self.aliases.alias_taken_by_other(&domain, &user.id).await? {
            return Err(CoreError::Conflict(DOMAIN_TAKEN.to_string()).into());
        }

        match self.aliases.upsert_alias(&user.id, &domain).await {
            Ok(()) => {}
            Err(RemoteError::Conflict(_)) => {
                return Err(CoreError::Conflict(DOMAIN_TAKEN.to_string()).into());
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, domain = %domain, "Custom domain saved");
        *self.custom_domain.write().await = Some(domain.clone());
        Ok(domain)
    }

    /// Public link to the signed-in user's collection, preferring the alias.
    pub async fn share_url(&self, origin: &str) -> Option<String> {
        let user = self.user().await?;
        let domain = self.custom_domain().await;
        Some(share_url(origin, share_identifier(&user.id, domain.as_deref())))
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Record `user` as signed in. Loads their collection and alias unless
    /// that user is already the current one.
    ///
    /// The user is recorded only after the load, and concurrent callers wait
    /// on `transition`, so every caller returns with the collection loaded.
    async fn adopt(&self, user: AuthUser) {
        let _transition = self.transition.lock().await;
        {
            let mut current = self.user.write().await;
            if current.as_ref().is_some_and(|u| u.id == user.id) {
                *current = Some(user);
                return;
            }
        }

        tracing::info!(user_id = %user.id, "User signed in");
        self.collection.load_collection().await;
        self.load_custom_domain(&user.id).await;
        *self.user.write().await = Some(user);
    }

    async fn load_custom_domain(&self, user_id: &str) {
        match self.aliases.alias_for_user(user_id).await {
            Ok(domain) => *self.custom_domain.write().await = domain,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load custom domain");
                *self.custom_domain.write().await = None;
            }
        }
    }

    async fn reset(&self) {
        let _transition = self.transition.lock().await;
        let previous = self.user.write().await.take();
        *self.custom_domain.write().await = None;
        self.collection.clear().await;
        if let Some(user) = previous {
            tracing::info!(user_id = %user.id, "User signed out");
        }
    }
}
