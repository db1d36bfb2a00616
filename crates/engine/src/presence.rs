//! Who is currently in the room, and the dual-presence handshake.

use std::sync::Arc;

use vibe_core::error::CoreError;
use vibe_core::session::{LeaveOutcome, PresenceOutcome, Session};
use vibe_core::types::{SessionId, UserId};
use vibe_events::{event_types, VibeEvent};

use crate::context::EngineContext;

#[derive(Debug, Clone)]
pub struct PresenceResult {
    pub session: Session,
    pub outcome: PresenceOutcome,
}

#[derive(Clone)]
pub struct PresenceTracker {
    ctx: Arc<EngineContext>,
}

impl PresenceTracker {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Mark `user_id` present or absent.
    ///
    /// Both parties racing to enter commit through the same version check,
    /// so the second writer re-reads a set that already contains the first
    /// and exactly one of them performs the handshake.
    pub async fn set_present(
        &self,
        session_id: SessionId,
        user_id: UserId,
        present: bool,
    ) -> Result<PresenceResult, CoreError> {
        let committed = self
            .ctx
            .mutate_session(session_id, |session, now| {
                session.set_presence(user_id, present, now)
            })
            .await?;

        if committed.outcome.handshake {
            let session = &committed.session;
            tracing::info!(
                session_id = %session.id,
                user_id = %user_id,
                expires_at = %session.expires_at,
                "Vibe started"
            );
            self.ctx.publish(
                VibeEvent::new(event_types::VIBE_STARTED)
                    .with_session(session.id)
                    .with_actor(user_id)
                    .with_payload(serde_json::json!({
                        "started_at": session.started_at,
                        "expires_at": session.expires_at,
                    })),
            );
        }

        Ok(PresenceResult {
            session: committed.session,
            outcome: committed.outcome,
        })
    }

    /// Stop viewing a session. Once a finished session has no viewers left
    /// it is deleted together with its notifications.
    ///
    /// The delete is pinned to the version the leave committed, so a viewer
    /// who re-entered in between keeps the session alive and the leave is
    /// re-evaluated against their presence.
    ///
    /// Returns `true` if the session was reclaimed.
    pub async fn leave(&self, session_id: SessionId, user_id: UserId) -> Result<bool, CoreError> {
        let retries = self.ctx.config.max_conflict_retries;
        for attempt in 0..=retries {
            let committed = self
                .ctx
                .mutate_session(session_id, |session, _| session.leave(user_id))
                .await?;

            if committed.outcome != LeaveOutcome::Reclaim {
                return Ok(false);
            }

            if self
                .ctx
                .sessions
                .delete_if_version(session_id, committed.session.version)
                .await?
            {
                self.ctx.purge_session_notifications(session_id).await;
                tracing::info!(session_id = %session_id, user_id = %user_id, "Finished vibe reclaimed");
                self.ctx.publish(
                    VibeEvent::new(event_types::VIBE_DELETED)
                        .with_session(session_id)
                        .with_actor(user_id),
                );
                return Ok(true);
            }

            tracing::debug!(session_id = %session_id, attempt, "Session moved before reclaim, re-checking viewers");
            tokio::task::yield_now().await;
        }

        tracing::warn!(session_id = %session_id, retries, "Reclaim abandoned after repeated conflicts");
        Err(CoreError::ActionFailed("contention".into()))
    }
}
