//! Session creation, nearby signalling, atomic join, abort and delete.

use std::sync::Arc;

use serde::Deserialize;
use tokio::task::JoinHandle;
use vibe_core::error::CoreError;
use vibe_core::geo::{self, Coordinates};
use vibe_core::notification::{titles, NotificationDraft, NotificationKind};
use vibe_core::policy::{DEFAULT_ACTIVITY_TYPE, DEFAULT_LOCATION_NAME, MAX_TEXT_LEN};
use vibe_core::profile::Profile;
use vibe_core::secure_key::generate_secure_key;
use vibe_core::session::{JoinOutcome, NewSession, Session, SessionStatus};
use vibe_core::types::{SessionId, UserId};
use vibe_events::{event_types, VibeEvent};

use crate::context::EngineContext;
use crate::janitor::Janitor;

/// What the creator asks for.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateVibe {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub duration_mins: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct JoinResult {
    pub session: Session,
    pub outcome: JoinOutcome,
}

#[derive(Clone)]
pub struct MatchmakingEngine {
    ctx: Arc<EngineContext>,
}

impl MatchmakingEngine {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Open a new session at `location`.
    ///
    /// After the insert commits, the creator's location is refreshed, the
    /// creator's expired records are swept, and nearby users are signalled
    /// in the background. None of those side effects can fail the call.
    pub async fn create(
        &self,
        caller: Option<UserId>,
        request: CreateVibe,
        location: Option<Coordinates>,
    ) -> Result<Session, CoreError> {
        let creator_id = caller.ok_or(CoreError::Unauthorized)?;
        let coords = location.ok_or(CoreError::LocationRequired)?;
        coords.validate().map_err(CoreError::Validation)?;

        let creator = self.ctx.require_approved(creator_id).await?;
        let policy = &self.ctx.config.policy;
        let duration_mins = policy
            .resolve_duration(request.duration_mins)
            .map_err(CoreError::Validation)?;

        let text = request.text.unwrap_or_default().trim().to_string();
        if text.chars().count() > MAX_TEXT_LEN {
            return Err(CoreError::Validation(format!(
                "Description must be at most {MAX_TEXT_LEN} characters"
            )));
        }

        let now = self.ctx.now();
        let session = Session::open(
            uuid::Uuid::now_v7(),
            NewSession {
                creator_id,
                creator_name: creator.display_name.clone(),
                coords,
                bucket: geo::encode(coords.lat, coords.lng, policy.search_precision),
                text,
                location_name: non_blank_or(request.location_name, DEFAULT_LOCATION_NAME),
                activity_type: non_blank_or(request.activity_type, DEFAULT_ACTIVITY_TYPE),
                duration_mins,
                secure_key: generate_secure_key(),
                creator_trust_score: creator.trust_points,
            },
            now,
        );
        self.ctx.sessions.insert(&session).await?;

        tracing::info!(
            session_id = %session.id,
            user_id = %creator_id,
            bucket = %session.bucket,
            duration_mins,
            "Vibe created"
        );
        self.ctx.publish(
            VibeEvent::new(event_types::VIBE_CREATED)
                .with_session(session.id)
                .with_actor(creator_id)
                .with_payload(serde_json::json!({
                    "bucket": session.bucket,
                    "activity_type": session.activity_type,
                    "expires_at": session.expires_at,
                })),
        );

        let key = geo::encode(coords.lat, coords.lng, policy.profile_key_precision);
        if let Err(e) = self
            .ctx
            .profiles
            .update_location(creator_id, coords, &key, now)
            .await
        {
            tracing::warn!(user_id = %creator_id, error = %e, "Failed to record creator location");
        }

        if let Err(e) = Janitor::new(self.ctx.clone()).sweep_for(creator_id).await {
            tracing::warn!(user_id = %creator_id, error = %e, "Janitor sweep failed");
        }

        self.spawn_nearby_signal(session.clone(), creator);
        Ok(session)
    }

    /// Run [`signal_nearby`](Self::signal_nearby) on a background task.
    pub fn spawn_nearby_signal(&self, session: Session, creator: Profile) -> JoinHandle<usize> {
        let engine = self.clone();
        tokio::spawn(async move { engine.signal_nearby(&session, &creator).await })
    }

    /// Send a nearby signal to every eligible user around the session.
    ///
    /// Candidates come from the session's bucket and its eight neighbours,
    /// then each one is confirmed by true distance. Returns how many signals
    /// were emitted.
    pub async fn signal_nearby(&self, session: &Session, creator: &Profile) -> usize {
        let policy = &self.ctx.config.policy;
        let buckets = geo::search_buckets(&session.coords, policy.search_precision);

        let candidates = match self
            .ctx
            .profiles
            .find_by_key_prefixes(&buckets, policy.nearby_scan_limit)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "Nearby candidate lookup failed");
                return 0;
            }
        };

        let body = format!("Buddy needed for {}!", session.activity_type);
        let mut sent = 0;
        for candidate in candidates
            .iter()
            .filter(|c| c.is_signal_candidate(creator, &session.coords, policy.join_radius_km))
        {
            self.ctx.relay.emit(
                NotificationDraft::new(candidate.id, titles::NEARBY_SIGNAL, &body, NotificationKind::Radar)
                    .for_session(session.id),
            );
            sent += 1;
        }

        tracing::debug!(session_id = %session.id, candidates = candidates.len(), sent, "Nearby signals emitted");
        sent
    }

    /// Take the open slot of a session.
    ///
    /// Every precondition is evaluated inside the version-checked write, so
    /// of two racing joiners exactly one commits and the other re-reads a
    /// matched session and gets `AlreadyFull`.
    pub async fn join(
        &self,
        caller: Option<UserId>,
        session_id: SessionId,
        location: Option<Coordinates>,
    ) -> Result<JoinResult, CoreError> {
        let joiner_id = caller.ok_or(CoreError::Unauthorized)?;
        let coords = location.ok_or(CoreError::LocationRequired)?;
        coords.validate().map_err(CoreError::Validation)?;

        let joiner = self.ctx.require_approved(joiner_id).await?;
        let radius_km = self.ctx.config.policy.join_radius_km;

        let committed = self
            .ctx
            .mutate_session(session_id, |session, now| {
                session.join(joiner_id, &joiner.display_name, &coords, radius_km, now)
            })
            .await?;

        if committed.changed && committed.outcome == JoinOutcome::Joined {
            let session = &committed.session;
            tracing::info!(session_id = %session.id, user_id = %joiner_id, "Vibe matched");
            self.ctx.publish(
                VibeEvent::new(event_types::VIBE_MATCHED)
                    .with_session(session.id)
                    .with_actor(joiner_id)
                    .with_recipient(session.creator_id),
            );
            self.ctx.relay.emit(
                NotificationDraft::new(
                    session.creator_id,
                    titles::CONNECTION_MADE,
                    "A peer has joined your vibe!",
                    NotificationKind::Match,
                )
                .for_session(session.id),
            );

            let key = geo::encode(coords.lat, coords.lng, self.ctx.config.policy.profile_key_precision);
            if let Err(e) = self
                .ctx
                .profiles
                .update_location(joiner_id, coords, &key, self.ctx.now())
                .await
            {
                tracing::warn!(user_id = %joiner_id, error = %e, "Failed to record joiner location");
            }
        }

        Ok(JoinResult {
            session: committed.session,
            outcome: committed.outcome,
        })
    }

    /// Fetch a session as `viewer` may see it.
    ///
    /// Parties get the full record. Anyone else only sees a discoverable
    /// session, with the handshake code withheld.
    pub async fn get(&self, viewer: UserId, session_id: SessionId) -> Result<Session, CoreError> {
        let session = self.ctx.require_session(session_id).await?;
        if session.is_party(viewer) {
            return Ok(session);
        }
        if session.is_discoverable(self.ctx.now()) {
            return Ok(session.redacted());
        }
        Err(CoreError::NotFound)
    }

    /// End a live session on behalf of either party.
    ///
    /// The record stays as an `aborted` tombstone until the last viewer
    /// leaves or the janitor reclaims it. Notifications tied to the session
    /// are removed and the counterparty is told.
    pub async fn abort(&self, caller: UserId, session_id: SessionId) -> Result<Session, CoreError> {
        let committed = self
            .ctx
            .mutate_session(session_id, |session, now| session.abort(caller, now))
            .await?;
        let session = committed.session;

        tracing::info!(session_id = %session.id, user_id = %caller, "Vibe aborted");
        self.ctx.purge_session_notifications(session.id).await;
        self.ctx.publish(
            VibeEvent::new(event_types::VIBE_ABORTED)
                .with_session(session.id)
                .with_actor(caller),
        );
        if let Some(peer) = session.counterparty(caller) {
            self.notify_ended(peer, session.id);
        }
        Ok(session)
    }

    /// Remove a session outright. Creator only.
    pub async fn delete(&self, caller: UserId, session_id: SessionId) -> Result<(), CoreError> {
        let session = self.ctx.require_session(session_id).await?;
        if session.creator_id != caller {
            return Err(CoreError::NotParticipant);
        }

        if !self.ctx.sessions.delete(session_id).await? {
            return Err(CoreError::NotFound);
        }
        tracing::info!(session_id = %session_id, user_id = %caller, "Vibe deleted");
        self.ctx.purge_session_notifications(session_id).await;
        self.ctx.publish(
            VibeEvent::new(event_types::VIBE_DELETED)
                .with_session(session_id)
                .with_actor(caller),
        );

        if session.status == SessionStatus::Matched {
            if let Some(peer) = session.participant_id {
                self.notify_ended(peer, session_id);
            }
        }
        Ok(())
    }

    /// Not linked to the session: the notice has to outlive the record,
    /// which may be reclaimed as soon as the other side walks away.
    fn notify_ended(&self, recipient: UserId, session_id: SessionId) {
        tracing::debug!(session_id = %session_id, user_id = %recipient, "Session end notice");
        self.ctx.relay.emit(NotificationDraft::new(
            recipient,
            titles::SESSION_ENDED,
            "Your peer ended the vibe.",
            NotificationKind::Abort,
        ));
    }
}

fn non_blank_or(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
