//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the engine and the API.
//! Live subscribers (push channels, the event log) receive every
//! [`VibeEvent`] published after they subscribed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use vibe_core::types::{SessionId, UserId};

/// Dot-separated event names published by the engine.
pub mod event_types {
    pub const VIBE_CREATED: &str = "vibe.created";
    pub const VIBE_MATCHED: &str = "vibe.matched";
    pub const VIBE_STARTED: &str = "vibe.started";
    pub const VIBE_ARRIVAL: &str = "vibe.arrival";
    pub const VIBE_COMPLETED: &str = "vibe.completed";
    pub const VIBE_REPORTED: &str = "vibe.reported";
    pub const VIBE_ABORTED: &str = "vibe.aborted";
    pub const VIBE_DELETED: &str = "vibe.deleted";
    pub const NOTIFICATION_CREATED: &str = "notification.created";
    pub const SAFETY_ALERT: &str = "safety.alert";
}

// ---------------------------------------------------------------------------
// VibeEvent
// ---------------------------------------------------------------------------

/// A lifecycle event.
///
/// Constructed via [`VibeEvent::new`] and enriched with
/// [`with_session`](VibeEvent::with_session),
/// [`with_actor`](VibeEvent::with_actor),
/// [`with_recipient`](VibeEvent::with_recipient) and
/// [`with_payload`](VibeEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibeEvent {
    /// Dot-separated event name, e.g. `"vibe.matched"`.
    pub event_type: String,

    pub session_id: Option<SessionId>,

    /// User whose action produced the event.
    pub actor_id: Option<UserId>,

    /// User the event is addressed to, for per-user push channels.
    pub recipient_id: Option<UserId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl VibeEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            session_id: None,
            actor_id: None,
            recipient_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_actor(mut self, user_id: UserId) -> Self {
        self.actor_id = Some(user_id);
        self
    }

    pub fn with_recipient(mut self, user_id: UserId) -> Self {
        self.recipient_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use vibe_events::bus::{EventBus, VibeEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(VibeEvent::new("vibe.created"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<VibeEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently if there are none.
    pub fn publish(&self, event: VibeEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VibeEvent> {
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
