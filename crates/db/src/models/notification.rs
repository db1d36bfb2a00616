//! `notifications` row model.

use sqlx::FromRow;
use vibe_core::notification::Notification;
use vibe_core::store::StoreError;
use vibe_core::types::{NotificationId, SessionId, Timestamp, UserId};

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub status: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub session_id: Option<SessionId>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            title: row.title,
            body: row.body,
            kind: row.kind.parse().map_err(StoreError::Corrupt)?,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            created_at: row.created_at,
            expires_at: row.expires_at,
            session_id: row.session_id,
        })
    }
}
