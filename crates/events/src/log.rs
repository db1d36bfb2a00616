//! Background subscriber that mirrors bus traffic into the tracing log.

use tokio::sync::broadcast;

use crate::bus::VibeEvent;

/// Writes one structured log line per published event.
pub struct EventLog;

impl EventLog {
    /// Run until the bus is dropped.
    pub async fn run(mut receiver: broadcast::Receiver<VibeEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        event_type = %event.event_type,
                        session_id = ?event.session_id,
                        actor_id = ?event.actor_id,
                        recipient_id = ?event.recipient_id,
                        "Vibe event"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event log lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event log shutting down");
                    break;
                }
            }
        }
    }
}
