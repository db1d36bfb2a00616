//! Arrival confirmations, completion and no-show reports.

use std::sync::Arc;

use vibe_core::error::CoreError;
use vibe_core::session::{ArrivalOutcome, Session};
use vibe_core::types::{SessionId, UserId};
use vibe_events::{event_types, VibeEvent};

use crate::context::EngineContext;

#[derive(Debug, Clone)]
pub struct ArrivalResult {
    pub session: Session,
    pub outcome: ArrivalOutcome,
    /// The caller's trust score after the reward, when one was applied.
    pub trust_points: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct GhostReportResult {
    pub session: Session,
    /// The accused's trust score after the penalty.
    pub accused_trust_points: Option<i64>,
}

#[derive(Clone)]
pub struct ArrivalLedger {
    ctx: Arc<EngineContext>,
}

impl ArrivalLedger {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Confirm that `user_id` is physically at the meetup.
    ///
    /// The flag is committed through a version-checked write, so when both
    /// parties confirm at the same time the later writer re-reads the
    /// earlier flag and completes the session. The reward is applied once
    /// per party: a repeated confirmation is a no-op.
    pub async fn log_arrival(&self, session_id: SessionId, user_id: UserId) -> Result<ArrivalResult, CoreError> {
        let committed = self
            .ctx
            .mutate_session(session_id, |session, now| session.log_arrival(user_id, now))
            .await?;

        let completed = match committed.outcome {
            ArrivalOutcome::AlreadyLogged => {
                return Ok(ArrivalResult {
                    session: committed.session,
                    outcome: committed.outcome,
                    trust_points: None,
                });
            }
            ArrivalOutcome::Logged { completed } => completed,
        };

        let session = &committed.session;
        tracing::info!(session_id = %session.id, user_id = %user_id, completed, "Arrival logged");
        let trust_points = self
            .ctx
            .adjust_trust(user_id, self.ctx.config.policy.arrival_reward)
            .await;

        self.ctx.publish(
            VibeEvent::new(event_types::VIBE_ARRIVAL)
                .with_session(session.id)
                .with_actor(user_id),
        );
        if completed {
            self.ctx.publish(
                VibeEvent::new(event_types::VIBE_COMPLETED)
                    .with_session(session.id)
                    .with_actor(user_id),
            );
        }

        Ok(ArrivalResult {
            session: committed.session,
            outcome: committed.outcome,
            trust_points,
        })
    }

    /// Flag the counterparty as a no-show and apply the penalty.
    ///
    /// The status moves to `reported` in the same write that checks the
    /// preconditions, so a second report sees a terminal session and is
    /// rejected before any penalty is applied.
    pub async fn report_ghosting(
        &self,
        session_id: SessionId,
        accuser_id: UserId,
        accused_id: UserId,
    ) -> Result<GhostReportResult, CoreError> {
        let committed = self
            .ctx
            .mutate_session(session_id, |session, now| {
                session.report_ghosting(accuser_id, accused_id, now)
            })
            .await?;

        let session = committed.session;
        tracing::info!(
            session_id = %session.id,
            user_id = %accuser_id,
            accused_id = %accused_id,
            "No-show reported"
        );
        let penalty = self.ctx.config.policy.ghost_penalty;
        let accused_trust_points = self.ctx.adjust_trust(accused_id, -penalty).await;

        self.ctx.publish(
            VibeEvent::new(event_types::VIBE_REPORTED)
                .with_session(session.id)
                .with_actor(accuser_id)
                .with_recipient(accused_id),
        );

        Ok(GhostReportResult {
            session,
            accused_trust_points,
        })
    }
}
