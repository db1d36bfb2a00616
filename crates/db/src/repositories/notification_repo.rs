//! Repository for the `notifications` table.

use sqlx::PgPool;
use vibe_core::notification::{Notification, ReadStatus};
use vibe_core::types::{SessionId, Timestamp, UserId};

use crate::models::notification::NotificationRow;

/// Column list for `notifications` queries.
const COLUMNS: &str =
    "id, recipient_id, title, body, kind, status, created_at, expires_at, session_id";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Persist a notification.
    pub async fn insert(pool: &PgPool, n: &Notification) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&query)
            .bind(n.id)
            .bind(n.recipient_id)
            .bind(&n.title)
            .bind(&n.body)
            .bind(n.kind.as_str())
            .bind(n.status.as_str())
            .bind(n.created_at)
            .bind(n.expires_at)
            .bind(n.session_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// List live notifications for a recipient, newest first.
    ///
    /// When `unread_only` is `true`, only unread notifications are returned.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient: UserId,
        unread_only: bool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<NotificationRow>, sqlx::Error> {
        let filter = if unread_only {
            "AND status = 'unread'"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE recipient_id = $1 AND expires_at > $2 {filter}
             ORDER BY created_at DESC
             LIMIT $3"
        );
        sqlx::query_as::<_, NotificationRow>(&query)
            .bind(recipient)
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Get the number of live unread notifications for a recipient.
    pub async fn unread_count(
        pool: &PgPool,
        recipient: UserId,
        now: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications
             WHERE recipient_id = $1 AND status = 'unread' AND expires_at > $2",
        )
        .bind(recipient)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(count.unwrap_or(0))
    }

    /// Mark all unread notifications as read. Returns the number updated.
    pub async fn mark_all_read(pool: &PgPool, recipient: UserId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET status = $2
             WHERE recipient_id = $1 AND status = 'unread'",
        )
        .bind(recipient)
        .bind(ReadStatus::Read.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every notification for a recipient.
    pub async fn delete_for_recipient(pool: &PgPool, recipient: UserId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
            .bind(recipient)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every notification raised for a session.
    pub async fn delete_by_session(pool: &PgPool, session_id: SessionId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE session_id = $1")
            .bind(session_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete a recipient's notifications whose time-to-live has passed.
    pub async fn delete_expired_for_recipient(
        pool: &PgPool,
        recipient: UserId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE recipient_id = $1 AND expires_at <= $2",
        )
        .bind(recipient)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
