//! Repository for the `vibe_sessions` table.

use sqlx::types::Json;
use sqlx::PgPool;
use vibe_core::session::Session;
use vibe_core::types::{SessionId, Timestamp, UserId};

use crate::models::session::SessionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, creator_id, creator_name, participant_id, participant_name, \
                       lat, lng, bucket, text, location_name, activity_type, status, \
                       duration_mins, created_at, expires_at, session_started, started_at, \
                       active_participants, arrivals, secure_key, creator_trust_score, \
                       aborted_by, resolved_at, version";

/// Provides CRUD and compare-and-swap operations for vibe sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session.
    pub async fn insert(pool: &PgPool, s: &Session) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO vibe_sessions ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)"
        );
        sqlx::query(&query)
            .bind(s.id)
            .bind(s.creator_id)
            .bind(&s.creator_name)
            .bind(s.participant_id)
            .bind(&s.participant_name)
            .bind(s.coords.lat)
            .bind(s.coords.lng)
            .bind(&s.bucket)
            .bind(&s.text)
            .bind(&s.location_name)
            .bind(&s.activity_type)
            .bind(s.status.as_str())
            .bind(s.duration_mins)
            .bind(s.created_at)
            .bind(s.expires_at)
            .bind(s.session_started)
            .bind(s.started_at)
            .bind(s.active_participants.iter().copied().collect::<Vec<UserId>>())
            .bind(Json(&s.arrivals))
            .bind(&s.secure_key)
            .bind(s.creator_trust_score)
            .bind(s.aborted_by)
            .bind(s.resolved_at)
            .bind(s.version)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Find a session by ID.
    pub async fn find_by_id(pool: &PgPool, id: SessionId) -> Result<Option<SessionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vibe_sessions WHERE id = $1");
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the mutable columns if the stored version still matches.
    ///
    /// Returns `true` if the row was updated, `false` on a version conflict
    /// or a missing row.
    pub async fn replace(
        pool: &PgPool,
        s: &Session,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE vibe_sessions SET
                participant_id = $3,
                participant_name = $4,
                status = $5,
                expires_at = $6,
                session_started = $7,
                started_at = $8,
                active_participants = $9,
                arrivals = $10,
                aborted_by = $11,
                resolved_at = $12,
                version = version + 1
             WHERE id = $1 AND version = $2",
        )
        .bind(s.id)
        .bind(expected_version)
        .bind(s.participant_id)
        .bind(&s.participant_name)
        .bind(s.status.as_str())
        .bind(s.expires_at)
        .bind(s.session_started)
        .bind(s.started_at)
        .bind(s.active_participants.iter().copied().collect::<Vec<UserId>>())
        .bind(Json(&s.arrivals))
        .bind(s.aborted_by)
        .bind(s.resolved_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete a session. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: SessionId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vibe_sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete a session only if its version still matches.
    pub async fn delete_if_version(
        pool: &PgPool,
        id: SessionId,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vibe_sessions WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Discoverable sessions in any of `buckets`, newest first.
    pub async fn list_open_in_buckets(
        pool: &PgPool,
        buckets: &[String],
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<SessionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vibe_sessions
             WHERE bucket = ANY($1)
               AND status = 'open'
               AND participant_id IS NULL
               AND expires_at > $2
             ORDER BY created_at DESC
             LIMIT $3"
        );
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(buckets)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Sessions the user created or joined that are still live or unexpired.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: UserId,
        now: Timestamp,
    ) -> Result<Vec<SessionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vibe_sessions
             WHERE (creator_id = $1 OR participant_id = $1)
               AND (expires_at > $2 OR status IN ('open', 'matched'))
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Delete the owner's sessions whose expiry has passed, returning their IDs.
    pub async fn delete_expired_for_owner(
        pool: &PgPool,
        owner: UserId,
        now: Timestamp,
    ) -> Result<Vec<SessionId>, sqlx::Error> {
        sqlx::query_scalar(
            "DELETE FROM vibe_sessions
             WHERE creator_id = $1 AND expires_at <= $2
             RETURNING id",
        )
        .bind(owner)
        .bind(now)
        .fetch_all(pool)
        .await
    }
}
