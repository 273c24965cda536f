//! Remote store client for the hosted backend.
//!
//! The backend offers three resources: managed auth, a row store holding
//! one collection document per user (plus the alias table), and a blob
//! storage bucket for images. Each is modelled as a collaborator trait in
//! [`backend`]. [`SupabaseClient`] implements all of them over HTTP and
//! [`MemoryBackend`] implements them in process.

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod supabase;
pub mod urls;

pub use backend::{AliasStore, AuthBackend, BlobStorage, DocumentStore, Session, StoredObject};
pub use config::BackendConfig;
pub use error::RemoteError;
pub use memory::MemoryBackend;
pub use supabase::SupabaseClient;
