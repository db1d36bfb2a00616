//! `profiles` row model.

use sqlx::FromRow;
use vibe_core::geo::Coordinates;
use vibe_core::profile::Profile;
use vibe_core::types::{Timestamp, UserId};

/// A row from the `profiles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: UserId,
    pub display_name: String,
    pub trust_points: i64,
    pub blocked_users: Vec<UserId>,
    pub is_incognito: bool,
    pub is_approved: bool,
    pub last_lat: Option<f64>,
    pub last_lng: Option<f64>,
    pub spatial_key: Option<String>,
    pub last_seen_at: Option<Timestamp>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        let last_coords = match (row.last_lat, row.last_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        };
        Profile {
            id: row.id,
            display_name: row.display_name,
            trust_points: row.trust_points,
            blocked_users: row.blocked_users.into_iter().collect(),
            is_incognito: row.is_incognito,
            is_approved: row.is_approved,
            last_coords,
            spatial_key: row.spatial_key,
            last_seen_at: row.last_seen_at,
        }
    }
}
