//! Block list, location sync and emergency broadcasts.

use std::sync::Arc;

use serde::Serialize;
use vibe_core::alert::SafetyAlert;
use vibe_core::error::CoreError;
use vibe_core::geo::{self, Coordinates};
use vibe_core::notification::{titles, NotificationDraft, NotificationKind};
use vibe_core::session::Session;
use vibe_core::types::{SessionId, UserId};
use vibe_events::{event_types, VibeEvent};

use crate::context::EngineContext;
use crate::matchmaking::MatchmakingEngine;

/// A stored alert and how many neighbours were told about it.
#[derive(Debug, Clone, Serialize)]
pub struct SosResult {
    pub alert: SafetyAlert,
    pub notified: usize,
}

#[derive(Clone)]
pub struct SafetyService {
    ctx: Arc<EngineContext>,
}

impl SafetyService {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Add `target` to `user_id`'s block list. Blocking twice is a no-op.
    ///
    /// Returns `true` if the list changed.
    pub async fn block(&self, user_id: UserId, target: UserId) -> Result<bool, CoreError> {
        if user_id == target {
            return Err(CoreError::Validation("You cannot block yourself".into()));
        }
        self.ctx.require_profile(user_id).await?;

        let added = self.ctx.profiles.add_blocked(user_id, target).await?;
        if added {
            tracing::info!(user_id = %user_id, blocked_id = %target, "User blocked");
        }
        Ok(added)
    }

    /// Abort a session, then block its counterparty. Nobody is blocked
    /// when the abort fails.
    pub async fn abort_and_block(&self, user_id: UserId, session_id: SessionId) -> Result<Session, CoreError> {
        let aborted = MatchmakingEngine::new(self.ctx.clone())
            .abort(user_id, session_id)
            .await?;
        if let Some(peer) = aborted.counterparty(user_id) {
            self.block(user_id, peer).await?;
        }
        Ok(aborted)
    }

    /// Store a fresh location sample and the profile's spatial key.
    pub async fn update_location(&self, user_id: UserId, coords: Coordinates) -> Result<String, CoreError> {
        coords.validate().map_err(CoreError::Validation)?;
        let key = geo::encode(coords.lat, coords.lng, self.ctx.config.policy.profile_key_precision);

        let updated = self
            .ctx
            .profiles
            .update_location(user_id, coords, &key, self.ctx.now())
            .await?;
        if !updated {
            return Err(CoreError::ProfileNotFound);
        }
        tracing::debug!(user_id = %user_id, spatial_key = %key, "Location updated");
        Ok(key)
    }

    /// Raise an emergency alert at `coords` and tell everyone whose last
    /// known position falls in the surrounding buckets.
    ///
    /// Blocks and incognito mode do not apply. Delivery is best effort: the
    /// alert is stored even when the neighbour lookup fails.
    pub async fn trigger_sos(&self, user_id: UserId, coords: Coordinates) -> Result<SosResult, CoreError> {
        coords.validate().map_err(CoreError::Validation)?;
        let sender = self.ctx.require_profile(user_id).await?;
        let policy = &self.ctx.config.policy;

        let alert = SafetyAlert::new(user_id, &sender.display_name, coords, self.ctx.now(), policy.sos_ttl_mins);
        self.ctx.alerts.insert(&alert).await?;
        tracing::warn!(alert_id = %alert.id, user_id = %user_id, "SOS raised");

        let buckets = geo::search_buckets(&coords, policy.search_precision);
        let neighbours = match self
            .ctx
            .profiles
            .find_by_key_prefixes(&buckets, policy.sos_scan_limit)
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(alert_id = %alert.id, error = %e, "SOS neighbour lookup failed");
                Vec::new()
            }
        };

        let mut notified = 0;
        for neighbour in neighbours.iter().filter(|p| p.id != user_id) {
            self.ctx.relay.emit(NotificationDraft::new(
                neighbour.id,
                titles::SOS,
                "A peer nearby needs help.",
                NotificationKind::Safety,
            ));
            notified += 1;
        }

        self.ctx.publish(
            VibeEvent::new(event_types::SAFETY_ALERT)
                .with_actor(user_id)
                .with_payload(serde_json::json!({
                    "alert_id": alert.id,
                    "notified": notified,
                })),
        );
        Ok(SosResult { alert, notified })
    }
}
