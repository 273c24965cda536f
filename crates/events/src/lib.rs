//! Session event bus.
//!
//! The auth collaborator publishes a [`SessionEvent`] whenever the signed-in
//! identity changes; the auth state manager subscribes to react to sign-in
//! and sign-out.

pub mod bus;

pub use bus::{EventBus, SessionEvent, SessionEventKind};
