//! `vibe_sessions` row model.

use std::collections::{BTreeMap, BTreeSet};

use sqlx::types::Json;
use sqlx::FromRow;
use vibe_core::geo::Coordinates;
use vibe_core::session::{Session, SessionStatus};
use vibe_core::store::StoreError;
use vibe_core::types::{SessionId, Timestamp, UserId};

/// A row from the `vibe_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: SessionId,
    pub creator_id: UserId,
    pub creator_name: String,
    pub participant_id: Option<UserId>,
    pub participant_name: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub bucket: String,
    pub text: String,
    pub location_name: String,
    pub activity_type: String,
    pub status: String,
    pub duration_mins: i64,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub session_started: bool,
    pub started_at: Option<Timestamp>,
    pub active_participants: Vec<UserId>,
    pub arrivals: Json<BTreeMap<UserId, bool>>,
    pub secure_key: String,
    pub creator_trust_score: i64,
    pub aborted_by: Option<UserId>,
    pub resolved_at: Option<Timestamp>,
    pub version: i64,
}

impl TryFrom<SessionRow> for Session {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let status: SessionStatus = row.status.parse().map_err(StoreError::Corrupt)?;
        Ok(Session {
            id: row.id,
            creator_id: row.creator_id,
            creator_name: row.creator_name,
            participant_id: row.participant_id,
            participant_name: row.participant_name,
            coords: Coordinates::new(row.lat, row.lng),
            bucket: row.bucket,
            text: row.text,
            location_name: row.location_name,
            activity_type: row.activity_type,
            status,
            duration_mins: row.duration_mins,
            created_at: row.created_at,
            expires_at: row.expires_at,
            session_started: row.session_started,
            started_at: row.started_at,
            active_participants: row.active_participants.into_iter().collect::<BTreeSet<_>>(),
            arrivals: row.arrivals.0,
            secure_key: row.secure_key,
            creator_trust_score: row.creator_trust_score,
            aborted_by: row.aborted_by,
            resolved_at: row.resolved_at,
            version: row.version,
        })
    }
}
