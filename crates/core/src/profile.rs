//! User profile fields the core reads and writes.
//!
//! Profiles are owned by the identity provider. The core only touches
//! location, trust points and the block list.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::types::{Timestamp, UserId};

/// A user as seen by the matching core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub display_name: String,
    /// Reputation counter; may go negative.
    pub trust_points: i64,
    pub blocked_users: BTreeSet<UserId>,
    pub is_incognito: bool,
    /// Set by the approval workflow; only approved profiles may create or join.
    pub is_approved: bool,
    pub last_coords: Option<Coordinates>,
    /// Geohash of `last_coords` at profile precision.
    pub spatial_key: Option<String>,
    pub last_seen_at: Option<Timestamp>,
}

impl Profile {
    /// A fresh approved profile with no location and zero trust.
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            trust_points: 0,
            blocked_users: BTreeSet::new(),
            is_incognito: false,
            is_approved: true,
            last_coords: None,
            spatial_key: None,
            last_seen_at: None,
        }
    }

    pub fn has_blocked(&self, other: UserId) -> bool {
        self.blocked_users.contains(&other)
    }

    /// True if either side has blocked the other.
    pub fn is_blocked_with(&self, other: &Profile) -> bool {
        self.has_blocked(other.id) || other.has_blocked(self.id)
    }

    /// Whether this user should receive a nearby signal for a session
    /// created by `creator` at `origin`.
    ///
    /// Excludes the creator, incognito users, mutually blocked pairs, users
    /// without a known location, and anyone farther than `radius_km`.
    pub fn is_signal_candidate(&self, creator: &Profile, origin: &Coordinates, radius_km: f64) -> bool {
        if self.id == creator.id || self.is_incognito || self.is_blocked_with(creator) {
            return false;
        }
        match &self.last_coords {
            Some(coords) => coords.distance_km(origin) <= radius_km,
            None => false,
        }
    }
}
