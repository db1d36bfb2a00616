//! Opportunistic cleanup of expired sessions, notifications and alerts.
//!
//! There is no background daemon. A sweep runs on behalf of one user (the
//! creator of a new session) and only touches that user's records.

use std::sync::Arc;

use vibe_core::error::CoreError;
use vibe_core::types::UserId;
use vibe_events::{event_types, VibeEvent};

use crate::context::EngineContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions_removed: usize,
    pub notifications_removed: u64,
    pub alerts_removed: u64,
}

#[derive(Clone)]
pub struct Janitor {
    ctx: Arc<EngineContext>,
}

impl Janitor {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Delete `owner`'s expired sessions, the notifications raised for them,
    /// `owner`'s own expired notifications and any lapsed alerts they sent.
    pub async fn sweep_for(&self, owner: UserId) -> Result<SweepReport, CoreError> {
        let now = self.ctx.now();
        let expired = self.ctx.sessions.delete_expired_for_owner(owner, now).await?;

        let mut report = SweepReport {
            sessions_removed: expired.len(),
            notifications_removed: 0,
            alerts_removed: 0,
        };

        for session_id in &expired {
            match self.ctx.notifications.delete_by_session(*session_id).await {
                Ok(n) => report.notifications_removed += n,
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Failed to purge expired session notifications");
                }
            }
            self.ctx.publish(VibeEvent::new(event_types::VIBE_DELETED).with_session(*session_id));
        }

        report.notifications_removed += self
            .ctx
            .notifications
            .delete_expired_for_recipient(owner, now)
            .await?;
        report.alerts_removed = self.ctx.alerts.delete_expired_for_sender(owner, now).await?;

        if report != SweepReport::default() {
            tracing::info!(
                user_id = %owner,
                sessions = report.sessions_removed,
                notifications = report.notifications_removed,
                alerts = report.alerts_removed,
                "Janitor sweep"
            );
        }
        Ok(report)
    }
}
