//! Shared handles every service works against, and the optimistic write loop.

use std::sync::Arc;

use vibe_core::clock::Clock;
use vibe_core::error::CoreError;
use vibe_core::profile::Profile;
use vibe_core::session::Session;
use vibe_core::store::{NotificationStore, ProfileStore, SafetyAlertStore, SessionStore};
use vibe_core::types::{SessionId, Timestamp, UserId};
use vibe_events::{EventBus, NotificationRelay, VibeEvent};

use crate::config::EngineConfig;

/// Result of a committed (or no-op) session transition.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    /// The session as it now stands in the store.
    pub session: Session,
    /// Whatever the transition reported.
    pub outcome: T,
    /// False when the transition left the session untouched and no write
    /// was issued.
    pub changed: bool,
}

pub struct EngineContext {
    pub sessions: Arc<dyn SessionStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub alerts: Arc<dyn SafetyAlertStore>,
    pub bus: Arc<EventBus>,
    pub relay: NotificationRelay,
    pub clock: Arc<dyn Clock>,
    pub config: EngineConfig,
}

impl EngineContext {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        notifications: Arc<dyn NotificationStore>,
        profiles: Arc<dyn ProfileStore>,
        alerts: Arc<dyn SafetyAlertStore>,
        bus: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let relay = NotificationRelay::new(
            notifications.clone(),
            bus.clone(),
            clock.clone(),
            config.policy.notification_ttl_hours,
        );
        Self {
            sessions,
            notifications,
            profiles,
            alerts,
            bus,
            relay,
            clock,
            config,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Load a profile that must exist for the operation to proceed.
    pub async fn require_profile(&self, user_id: UserId) -> Result<Profile, CoreError> {
        self.profiles
            .get(user_id)
            .await?
            .ok_or(CoreError::ProfileNotFound)
    }

    /// Load a profile that must exist and be approved.
    pub async fn require_approved(&self, user_id: UserId) -> Result<Profile, CoreError> {
        let profile = self.require_profile(user_id).await?;
        if !profile.is_approved {
            return Err(CoreError::Unauthorized);
        }
        Ok(profile)
    }

    pub async fn require_session(&self, id: SessionId) -> Result<Session, CoreError> {
        self.sessions.get(id).await?.ok_or(CoreError::NotFound)
    }

    /// Apply `transition` to the latest stored copy of a session and commit
    /// it with a version check.
    ///
    /// The transition runs against a fresh read on every attempt, so its
    /// preconditions always see the state being replaced. An `Err` from the
    /// transition aborts without writing. A lost compare-and-swap re-reads
    /// and re-applies, up to `max_conflict_retries` times.
    pub async fn mutate_session<T, F>(
        &self,
        id: SessionId,
        mut transition: F,
    ) -> Result<Committed<T>, CoreError>
    where
        F: FnMut(&mut Session, Timestamp) -> Result<T, CoreError>,
    {
        let retries = self.config.max_conflict_retries;
        for attempt in 0..=retries {
            let current = self.require_session(id).await?;
            let mut next = current.clone();
            let outcome = transition(&mut next, self.now())?;

            if next == current {
                return Ok(Committed {
                    session: current,
                    outcome,
                    changed: false,
                });
            }

            if self.sessions.replace(&next, current.version).await? {
                next.version = current.version + 1;
                return Ok(Committed {
                    session: next,
                    outcome,
                    changed: true,
                });
            }

            tracing::debug!(session_id = %id, attempt, "Session write conflict, retrying");
            tokio::task::yield_now().await;
        }

        tracing::warn!(session_id = %id, retries, "Session write abandoned after repeated conflicts");
        Err(CoreError::ActionFailed("contention".into()))
    }

    /// Remove every notification raised for a session. Failures are logged;
    /// leftovers expire on their own and are swept by the janitor.
    pub async fn purge_session_notifications(&self, session_id: SessionId) {
        if let Err(e) = self.notifications.delete_by_session(session_id).await {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "Failed to cascade-delete session notifications"
            );
        }
    }

    /// Add `delta` trust points. Failures are logged and reported as `None`.
    pub async fn adjust_trust(&self, user_id: UserId, delta: i64) -> Option<i64> {
        match self.profiles.adjust_trust_points(user_id, delta).await {
            Ok(Some(points)) => Some(points),
            Ok(None) => {
                tracing::warn!(user_id = %user_id, delta, "Trust adjustment for unknown profile");
                None
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, delta, error = %e, "Trust adjustment failed");
                None
            }
        }
    }

    pub fn publish(&self, event: VibeEvent) {
        self.bus.publish(event);
    }
}
