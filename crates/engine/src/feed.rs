//! Discovery listing: the viewer's own sessions plus open vibes nearby.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use vibe_core::error::CoreError;
use vibe_core::geo::{self, Coordinates};
use vibe_core::profile::Profile;
use vibe_core::session::Session;
use vibe_core::types::{Timestamp, UserId};

use crate::context::EngineContext;

/// Wildcard activity filter accepted from clients.
pub const ALL_ACTIVITIES: &str = "All";

/// One row of the feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    #[serde(flatten)]
    pub session: Session,
    /// True when the viewer is the creator or the participant.
    pub is_mine: bool,
    pub distance_km: Option<f64>,
    pub distance_label: Option<String>,
    pub remaining_mins: i64,
}

#[derive(Clone)]
pub struct FeedService {
    ctx: Arc<EngineContext>,
}

impl FeedService {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Build the feed for `viewer`, newest first.
    ///
    /// Strangers' sessions are only listed when they are open, unjoined and
    /// unexpired, lie within the join radius, carry a non-negative creator
    /// trust snapshot, match `activity` and involve no block in either
    /// direction. A viewer with a negative score, or without a location,
    /// sees only their own sessions.
    pub async fn list(
        &self,
        viewer: UserId,
        location: Option<Coordinates>,
        activity: Option<&str>,
    ) -> Result<Vec<FeedEntry>, CoreError> {
        let viewer_profile = self.ctx.require_profile(viewer).await?;
        let now = self.ctx.now();
        let policy = &self.ctx.config.policy;

        let mut entries: Vec<FeedEntry> = self
            .ctx
            .sessions
            .list_for_user(viewer, now)
            .await?
            .into_iter()
            .filter(|s| !s.is_expired(now))
            .map(|s| entry(s, true, location.as_ref(), now))
            .collect();

        let origin = match location {
            Some(origin) if viewer_profile.trust_points >= 0 => origin,
            _ => return Ok(entries),
        };

        let activity = activity
            .map(str::trim)
            .filter(|a| !a.is_empty() && *a != ALL_ACTIVITIES);
        let buckets = geo::search_buckets(&origin, policy.search_precision);
        let seen: HashSet<_> = entries.iter().map(|e| e.session.id).collect();

        let candidates: Vec<Session> = self
            .ctx
            .sessions
            .list_open_in_buckets(&buckets, now, policy.feed_scan_limit)
            .await?
            .into_iter()
            .filter(|s| !seen.contains(&s.id) && !s.is_party(viewer))
            .filter(|s| s.creator_trust_score >= 0)
            .filter(|s| activity.map_or(true, |a| s.activity_type == a))
            .filter(|s| origin.distance_km(&s.coords) <= policy.join_radius_km)
            .filter(|s| !viewer_profile.has_blocked(s.creator_id))
            .collect();

        let creators = self.load_creators(&candidates).await?;
        entries.extend(
            candidates
                .into_iter()
                .filter(|s| {
                    creators
                        .get(&s.creator_id)
                        .map_or(true, |creator| !creator.has_blocked(viewer))
                })
                .map(|s| entry(s.redacted(), false, Some(&origin), now)),
        );

        entries.sort_by(|a, b| b.session.created_at.cmp(&a.session.created_at));
        Ok(entries)
    }

    async fn load_creators(&self, sessions: &[Session]) -> Result<HashMap<UserId, Profile>, CoreError> {
        let mut creators = HashMap::new();
        for creator_id in sessions.iter().map(|s| s.creator_id) {
            if creators.contains_key(&creator_id) {
                continue;
            }
            if let Some(profile) = self.ctx.profiles.get(creator_id).await? {
                creators.insert(creator_id, profile);
            }
        }
        Ok(creators)
    }
}

fn entry(session: Session, is_mine: bool, origin: Option<&Coordinates>, now: Timestamp) -> FeedEntry {
    let distance_km = origin.map(|o| o.distance_km(&session.coords));
    FeedEntry {
        is_mine,
        distance_km,
        distance_label: distance_km.map(geo::distance_label),
        remaining_mins: session.remaining_mins(now),
        session,
    }
}
