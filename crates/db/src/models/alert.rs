//! `safety_alerts` row model.

use sqlx::FromRow;
use vibe_core::alert::SafetyAlert;
use vibe_core::geo::Coordinates;
use vibe_core::types::{AlertId, Timestamp, UserId};

/// A row from the `safety_alerts` table.
#[derive(Debug, Clone, FromRow)]
pub struct SafetyAlertRow {
    pub id: AlertId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub lat: f64,
    pub lng: f64,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<SafetyAlertRow> for SafetyAlert {
    fn from(row: SafetyAlertRow) -> Self {
        SafetyAlert {
            id: row.id,
            sender_id: row.sender_id,
            sender_name: row.sender_name,
            coords: Coordinates::new(row.lat, row.lng),
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}
