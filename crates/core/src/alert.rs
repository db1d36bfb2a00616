//! Emergency alerts broadcast to nearby users.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::types::{AlertId, Timestamp, UserId};

/// A live SOS raised by one user at one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAlert {
    pub id: AlertId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub coords: Coordinates,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl SafetyAlert {
    pub fn new(
        sender_id: UserId,
        sender_name: impl Into<String>,
        coords: Coordinates,
        now: Timestamp,
        ttl_mins: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            sender_id,
            sender_name: sender_name.into(),
            coords,
            created_at: now,
            expires_at: now + chrono::Duration::minutes(ttl_mins),
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}
