#![allow(dead_code)]

use std::sync::Arc;

use dinodex_client::{AuthManager, CollectionManager, ImageTransfer, SharedViewLoader};
use dinodex_core::types::AuthUser;
use dinodex_core::upload::{TaggedUpload, UploadFile, MIME_JPEG, MIME_PNG};
use dinodex_remote::MemoryBackend;

pub const USER_ID: &str = "user-1";
pub const EMAIL: &str = "rex@example.com";
pub const PASSWORD: &str = "hunter2";

/// Managers wired over one in-memory backend, the same way `main.rs` wires
/// them over the HTTP client.
pub struct TestHarness {
    pub backend: Arc<MemoryBackend>,
    pub collection: Arc<CollectionManager>,
    pub auth: Arc<AuthManager>,
    pub shared: SharedViewLoader,
}

pub fn harness() -> TestHarness {
    let backend = Arc::new(MemoryBackend::new());
    let collection = Arc::new(CollectionManager::new(
        backend.clone(),
        backend.clone(),
        ImageTransfer::new(backend.clone()),
    ));
    let auth = Arc::new(AuthManager::new(
        backend.clone(),
        backend.clone(),
        Arc::clone(&collection),
    ));
    let shared = SharedViewLoader::new(backend.clone(), backend.clone());

    TestHarness {
        backend,
        collection,
        auth,
        shared,
    }
}

/// A harness with [`USER_ID`] registered and signed in.
pub async fn signed_in_harness() -> TestHarness {
    let h = harness();
    h.backend
        .register(EMAIL, PASSWORD, AuthUser::new(USER_ID).with_email(EMAIL))
        .await;
    h.auth
        .sign_in(EMAIL, PASSWORD)
        .await
        .expect("sign in should succeed");
    h
}

pub fn png(name: &str, size: usize) -> UploadFile {
    UploadFile::new(name, MIME_PNG, vec![0u8; size])
}

pub fn jpeg(name: &str, size: usize) -> UploadFile {
    UploadFile::new(name, MIME_JPEG, vec![0u8; size])
}

pub fn tagged(file: UploadFile, color: &str) -> TaggedUpload {
    TaggedUpload::new(file, color)
}
