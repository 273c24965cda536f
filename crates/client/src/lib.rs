//! Client-side state for the dino color collection tracker.
//!
//! - [`ImageTransfer`] uploads and deletes image blobs.
//! - [`CollectionManager`] owns the signed-in user's in-memory collection
//!   and persists it as one remote document after every mutation.
//! - [`AuthManager`] tracks the signed-in identity and drives the collection
//!   manager on sign-in and sign-out.
//! - [`SharedViewLoader`] loads another user's collection read-only.

pub mod auth;
pub mod collection;
pub mod error;
pub mod images;
pub mod shared;

pub use auth::AuthManager;
pub use collection::CollectionManager;
pub use error::{ClientError, ClientResult};
pub use images::ImageTransfer;
pub use shared::{SharedCollection, SharedViewError, SharedViewLoader};
