//! Integration tests for `AuthManager`: session tracking, the collection
//! load/clear it drives, and the share alias flow.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use dinodex_client::{AuthManager, ClientError, CollectionManager, ImageTransfer};
use dinodex_core::collection::Dino;
use dinodex_core::error::CoreError;
use dinodex_core::master_list::find_master_entry;
use dinodex_core::types::AuthUser;
use dinodex_events::SessionEvent;
use dinodex_remote::{AuthBackend, DocumentStore, MemoryBackend, RemoteError};

use common::{harness, signed_in_harness, EMAIL, PASSWORD, USER_ID};

fn dino(id: &str) -> Dino {
    Dino::from_master(find_master_entry(id).expect("id is in the master list"))
}

/// Poll `check` until it holds or a second has passed.
async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// ---------------------------------------------------------------------------
// Test: sign-in loads the user's document and alias
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_in_loads_collection_and_domain() {
    let h = harness();
    h.backend
        .register(EMAIL, PASSWORD, AuthUser::new(USER_ID))
        .await;
    h.backend.put_document(USER_ID, &[dino("106")]).await;
    h.backend.put_alias(USER_ID, "rexes").await;

    let user = h.auth.sign_in(EMAIL, PASSWORD).await.unwrap();

    assert_eq!(user.id, USER_ID);
    assert_eq!(h.collection.collection().await.len(), 1);
    assert_eq!(h.auth.custom_domain().await.as_deref(), Some("rexes"));
}

#[tokio::test]
async fn wrong_password_is_reported() {
    let h = harness();
    h.backend
        .register(EMAIL, PASSWORD, AuthUser::new(USER_ID))
        .await;

    let err = h.auth.sign_in(EMAIL, "wrong").await.unwrap_err();

    assert_matches!(err, ClientError::Remote(RemoteError::InvalidCredentials));
    assert_eq!(err.user_message(), "Invalid login credentials");
    assert!(h.auth.user().await.is_none());
}

#[tokio::test]
async fn sign_up_signs_in_immediately() {
    let h = harness();

    let user = h.auth.sign_up("new@example.com", PASSWORD).await.unwrap();

    let user = user.expect("memory backend signs in on sign-up");
    assert_eq!(h.auth.user().await.unwrap().id, user.id);
    assert!(h.collection.collection().await.is_empty());
}

// ---------------------------------------------------------------------------
// Test: sign-out resets local state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_out_clears_collection_and_domain() {
    let h = signed_in_harness().await;
    h.collection.add_to_collection(dino("106")).await;
    h.auth.set_custom_domain("rexes").await.unwrap();

    h.auth.sign_out().await.unwrap();

    assert!(h.auth.user().await.is_none());
    assert!(h.auth.custom_domain().await.is_none());
    assert!(h.collection.collection().await.is_empty());
    assert!(h.backend.current_session().await.is_none());
    // The remote document is untouched.
    assert_eq!(h.backend.stored_document(USER_ID).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: existing sessions and session events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_adopts_existing_session() {
    let h = harness();
    h.backend.put_document(USER_ID, &[dino("1"), dino("2")]).await;
    h.backend.sign_in_as(AuthUser::new(USER_ID)).await;

    h.auth.initialize().await;

    assert_eq!(h.auth.user().await.unwrap().id, USER_ID);
    assert_eq!(h.collection.collection().await.len(), 2);
}

#[tokio::test]
async fn initialize_without_session_is_noop() {
    let h = harness();
    h.auth.initialize().await;
    assert!(h.auth.user().await.is_none());
}

#[tokio::test]
async fn token_refresh_for_same_user_does_not_reload() {
    let h = signed_in_harness().await;
    h.collection.add_to_collection(dino("106")).await;
    h.backend.put_document(USER_ID, &[]).await;

    h.auth
        .handle_event(SessionEvent::token_refreshed(AuthUser::new(USER_ID)))
        .await;

    assert_eq!(h.collection.collection().await.len(), 1);
}

#[tokio::test]
async fn switching_user_reloads_collection() {
    let h = signed_in_harness().await;
    h.collection.add_to_collection(dino("106")).await;
    h.backend.put_document("user-2", &[dino("1"), dino("2")]).await;

    let session = h.backend.sign_in_as(AuthUser::new("user-2")).await;
    h.auth
        .handle_event(SessionEvent::signed_in(session.user))
        .await;

    assert_eq!(h.auth.user().await.unwrap().id, "user-2");
    assert_eq!(h.collection.collection().await.len(), 2);
}

#[tokio::test]
async fn listener_follows_backend_sessions() {
    let h = harness();
    h.backend.put_document(USER_ID, &[dino("106")]).await;

    let listener = tokio::spawn(Arc::clone(&h.auth).run(h.backend.subscribe()));

    h.backend.sign_in_as(AuthUser::new(USER_ID)).await;
    let collection = Arc::clone(&h.collection);
    assert!(eventually(|| {
        let collection = Arc::clone(&collection);
        async move { collection.collection().await.len() == 1 }
    })
    .await);

    h.backend.sign_out().await.unwrap();
    let auth = Arc::clone(&h.auth);
    assert!(eventually(|| {
        let auth = Arc::clone(&auth);
        async move { auth.user().await.is_none() }
    })
    .await);
    assert!(h.collection.collection().await.is_empty());

    listener.abort();
}

// ---------------------------------------------------------------------------
// Test: sign-in racing the session listener
// ---------------------------------------------------------------------------

/// Document store whose fetches take a while, so a sign-in and the session
/// listener overlap.
struct SlowDocuments {
    inner: Arc<MemoryBackend>,
    delay: Duration,
}

#[async_trait]
impl DocumentStore for SlowDocuments {
    async fn fetch_collection(&self, user_id: &str) -> Result<Option<Vec<Dino>>, RemoteError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_collection(user_id).await
    }

    async fn upsert_collection(&self, user_id: &str, dinos: &[Dino]) -> Result<(), RemoteError> {
        self.inner.upsert_collection(user_id, dinos).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sign_in_returns_after_collection_loaded_while_listener_runs() {
    for _ in 0..10 {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .register(EMAIL, PASSWORD, AuthUser::new(USER_ID))
            .await;
        backend.put_document(USER_ID, &[dino("106")]).await;

        let documents = Arc::new(SlowDocuments {
            inner: Arc::clone(&backend),
            delay: Duration::from_millis(50),
        });
        let collection = Arc::new(CollectionManager::new(
            backend.clone(),
            documents,
            ImageTransfer::new(backend.clone()),
        ));
        let auth = Arc::new(AuthManager::new(
            backend.clone(),
            backend.clone(),
            Arc::clone(&collection),
        ));
        let listener = tokio::spawn(Arc::clone(&auth).run(backend.subscribe()));

        auth.sign_in(EMAIL, PASSWORD).await.unwrap();

        assert_eq!(collection.collection().await.len(), 1);
        assert_eq!(auth.user().await.unwrap().id, USER_ID);
        listener.abort();
    }
}

// ---------------------------------------------------------------------------
// Test: custom domain
// ---------------------------------------------------------------------------

#[tokio::test]
async fn custom_domain_is_normalized_and_saved() {
    let h = signed_in_harness().await;

    let stored = h.auth.set_custom_domain("  My Dinos! ").await.unwrap();

    assert_eq!(stored, "mydinos");
    assert_eq!(h.auth.custom_domain().await.as_deref(), Some("mydinos"));
    assert_eq!(
        h.auth.share_url("https://dinodex.app").await.as_deref(),
        Some("https://dinodex.app/share/mydinos")
    );
}

#[tokio::test]
async fn custom_domain_taken_by_other_user_is_rejected() {
    let h = signed_in_harness().await;
    h.backend.put_alias("someone-else", "rexes").await;

    let err = h.auth.set_custom_domain("Rexes").await.unwrap_err();

    assert_matches!(err, ClientError::Core(CoreError::Conflict(_)));
    assert_eq!(err.user_message(), "This domain is already taken");
    assert!(h.auth.custom_domain().await.is_none());
}

#[tokio::test]
async fn custom_domain_can_be_renamed() {
    let h = signed_in_harness().await;

    h.auth.set_custom_domain("rexes").await.unwrap();
    h.auth.set_custom_domain("raptors").await.unwrap();

    assert_eq!(h.auth.custom_domain().await.as_deref(), Some("raptors"));
}

#[tokio::test]
async fn blank_custom_domain_is_invalid() {
    let h = signed_in_harness().await;

    let err = h.auth.set_custom_domain(" !!! ").await.unwrap_err();

    assert_matches!(err, ClientError::Core(CoreError::Validation(_)));
    assert_eq!(err.user_message(), "Please enter a valid domain name");
}

#[tokio::test]
async fn custom_domain_requires_sign_in() {
    let h = harness();
    assert_matches!(
        h.auth.set_custom_domain("rexes").await,
        Err(ClientError::NotSignedIn)
    );
}

#[tokio::test]
async fn share_url_falls_back_to_user_id() {
    let h = signed_in_harness().await;
    assert_eq!(
        h.auth.share_url("http://localhost:5173/").await.as_deref(),
        Some("http://localhost:5173/share/user-1")
    );

    h.auth.sign_out().await.unwrap();
    assert!(h.auth.share_url("http://localhost:5173").await.is_none());
}
