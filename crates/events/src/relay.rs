//! Fire-and-forget notification delivery.
//!
//! Callers hand a [`NotificationDraft`] to [`NotificationRelay::emit`] and
//! carry on. The relay persists the notification on a spawned task and then
//! publishes `notification.created` on the bus for live push channels.
//! Delivery failures are logged and never reach the caller.

use std::sync::Arc;

use tokio::task::JoinHandle;
use vibe_core::clock::Clock;
use vibe_core::notification::{Notification, NotificationDraft};
use vibe_core::store::{NotificationStore, StoreResult};

use crate::bus::{event_types, EventBus, VibeEvent};

#[derive(Clone)]
pub struct NotificationRelay {
    store: Arc<dyn NotificationStore>,
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    ttl_hours: i64,
}

impl NotificationRelay {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        ttl_hours: i64,
    ) -> Self {
        Self {
            store,
            bus,
            clock,
            ttl_hours,
        }
    }

    /// Deliver in the background. The returned handle is only useful to
    /// tests that need to wait for delivery; it never carries an error.
    pub fn emit(&self, draft: NotificationDraft) -> JoinHandle<()> {
        let relay = self.clone();
        tokio::spawn(async move {
            let recipient = draft.recipient_id;
            let kind = draft.kind;
            if let Err(e) = relay.deliver(draft).await {
                tracing::warn!(
                    error = %e,
                    recipient_id = %recipient,
                    kind = %kind,
                    "Notification delivery failed"
                );
            }
        })
    }

    /// Persist and announce one notification, returning the stored record.
    pub async fn deliver(&self, draft: NotificationDraft) -> StoreResult<Notification> {
        let notification = Notification::from_draft(draft, self.clock.now(), self.ttl_hours);
        self.store.insert(&notification).await?;

        let mut event = VibeEvent::new(event_types::NOTIFICATION_CREATED)
            .with_recipient(notification.recipient_id)
            .with_payload(serde_json::json!({
                "id": notification.id,
                "title": notification.title,
                "body": notification.body,
                "kind": notification.kind,
            }));
        if let Some(session_id) = notification.session_id {
            event = event.with_session(session_id);
        }
        self.bus.publish(event);

        tracing::debug!(
            notification_id = %notification.id,
            recipient_id = %notification.recipient_id,
            "Notification delivered"
        );
        Ok(notification)
    }
}
