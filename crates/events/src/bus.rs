//! In-process session event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans every published [`SessionEvent`] out to all current
//! subscribers. It is designed to be shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use dinodex_core::types::AuthUser;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// What happened to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A change of the signed-in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,

    /// The user after the change; `None` once signed out.
    pub user: Option<AuthUser>,

    /// When the change was observed (UTC).
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent {
    pub fn signed_in(user: AuthUser) -> Self {
        Self::new(SessionEventKind::SignedIn, Some(user))
    }

    pub fn signed_out() -> Self {
        Self::new(SessionEventKind::SignedOut, None)
    }

    pub fn token_refreshed(user: AuthUser) -> Self {
        Self::new(SessionEventKind::TokenRefreshed, Some(user))
    }

    fn new(kind: SessionEventKind, user: Option<AuthUser>) -> Self {
        Self {
            kind,
            user,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use dinodex_core::types::AuthUser;
/// use dinodex_events::bus::{EventBus, SessionEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(SessionEvent::signed_in(AuthUser::new("user-1")));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers that fall more than `capacity` events behind observe
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: SessionEvent) {
        tracing::debug!(kind = ?event.kind, "Publishing session event");
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(SessionEvent::signed_in(
            AuthUser::new("user-1").with_email("a@b.c"),
        ));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.kind, SessionEventKind::SignedIn);
        let user = received.user.expect("signed-in event carries the user");
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(SessionEvent::signed_out());

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.kind, SessionEventKind::SignedOut);
        assert_eq!(e2.kind, SessionEventKind::SignedOut);
        assert!(e1.user.is_none());
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(SessionEvent::signed_out());
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::default();
        bus.publish(SessionEvent::signed_out());
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
