//! Matching policy: radii, durations, reputation deltas.
//!
//! This module lives in `core` so the engine, the storage layer and the HTTP
//! surface all agree on the same limits. `vibe-engine` overrides the defaults
//! from the environment.

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Maximum distance between a joiner (or signal recipient) and the session.
pub const DEFAULT_JOIN_RADIUS_KM: f64 = 0.5;

/// Geohash precision of discovery buckets (~1.2km x 0.6km cells).
pub const DEFAULT_SEARCH_PRECISION: usize = 6;

/// Geohash precision stored on user profiles.
pub const DEFAULT_PROFILE_KEY_PRECISION: usize = 9;

/// Session lifetime when the request does not specify one.
pub const DEFAULT_DURATION_MINS: i64 = 15;

/// Shortest allowed session lifetime.
pub const MIN_DURATION_MINS: i64 = 1;

/// Longest allowed session lifetime (4 hours).
pub const DEFAULT_MAX_DURATION_MINS: i64 = 240;

/// Hard ceiling for any configured session lifetime (one week).
pub const DURATION_CEILING_MINS: i64 = 7 * 24 * 60;

/// Trust points awarded for a confirmed arrival.
pub const DEFAULT_ARRIVAL_REWARD: i64 = 1;

/// Trust points removed for a confirmed no-show.
pub const DEFAULT_GHOST_PENALTY: i64 = 2;

/// Notification lifetime.
pub const DEFAULT_NOTIFICATION_TTL_HOURS: i64 = 24;

/// Hard ceiling for the configured notification lifetime (one year).
pub const NOTIFICATION_TTL_CEILING_HOURS: i64 = 365 * 24;

/// How long an emergency alert stays live.
pub const DEFAULT_SOS_TTL_MINS: i64 = 30;

/// Candidate profiles scanned per emergency broadcast.
pub const DEFAULT_SOS_SCAN_LIMIT: i64 = 100;

/// Candidate profiles scanned per nearby-signal broadcast.
pub const DEFAULT_NEARBY_SCAN_LIMIT: i64 = 50;

/// Sessions fetched per feed query before distance filtering.
pub const DEFAULT_FEED_SCAN_LIMIT: i64 = 200;

/// Shown when the creator gives no place name.
pub const DEFAULT_LOCATION_NAME: &str = "Campus Spot";

/// Shown when the creator gives no activity.
pub const DEFAULT_ACTIVITY_TYPE: &str = "Other";

/// Longest accepted free-text description.
pub const MAX_TEXT_LEN: usize = 280;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tunable limits applied by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPolicy {
    pub join_radius_km: f64,
    pub search_precision: usize,
    pub profile_key_precision: usize,
    pub default_duration_mins: i64,
    pub max_duration_mins: i64,
    pub arrival_reward: i64,
    pub ghost_penalty: i64,
    pub notification_ttl_hours: i64,
    pub nearby_scan_limit: i64,
    pub feed_scan_limit: i64,
    pub sos_ttl_mins: i64,
    pub sos_scan_limit: i64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            join_radius_km: DEFAULT_JOIN_RADIUS_KM,
            search_precision: DEFAULT_SEARCH_PRECISION,
            profile_key_precision: DEFAULT_PROFILE_KEY_PRECISION,
            default_duration_mins: DEFAULT_DURATION_MINS,
            max_duration_mins: DEFAULT_MAX_DURATION_MINS,
            arrival_reward: DEFAULT_ARRIVAL_REWARD,
            ghost_penalty: DEFAULT_GHOST_PENALTY,
            notification_ttl_hours: DEFAULT_NOTIFICATION_TTL_HOURS,
            nearby_scan_limit: DEFAULT_NEARBY_SCAN_LIMIT,
            feed_scan_limit: DEFAULT_FEED_SCAN_LIMIT,
            sos_ttl_mins: DEFAULT_SOS_TTL_MINS,
            sos_scan_limit: DEFAULT_SOS_SCAN_LIMIT,
        }
    }
}

impl MatchPolicy {
    /// Resolve a requested duration, applying the default when absent.
    pub fn resolve_duration(&self, requested: Option<i64>) -> Result<i64, String> {
        let minutes = requested.unwrap_or(self.default_duration_mins);
        if minutes < MIN_DURATION_MINS {
            return Err(format!(
                "Duration must be at least {MIN_DURATION_MINS} minute(s), got {minutes}"
            ));
        }
        if minutes > self.max_duration_mins {
            return Err(format!(
                "Duration must be at most {} minutes, got {minutes}",
                self.max_duration_mins
            ));
        }
        Ok(minutes)
    }

    /// Check the policy itself is usable. Called once at startup.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.join_radius_km.is_finite() && self.join_radius_km > 0.0) {
            return Err("join radius must be a positive number of kilometres".into());
        }
        if !(1..=crate::geo::MAX_PRECISION).contains(&self.search_precision) {
            return Err("search precision out of range".into());
        }
        if self.profile_key_precision < self.search_precision
            || self.profile_key_precision > crate::geo::MAX_PRECISION
        {
            return Err("profile key precision must be >= search precision".into());
        }
        if !(MIN_DURATION_MINS..=DURATION_CEILING_MINS).contains(&self.max_duration_mins) {
            return Err(format!(
                "max duration must be between {MIN_DURATION_MINS} and {DURATION_CEILING_MINS} minutes"
            ));
        }
        if self.default_duration_mins < MIN_DURATION_MINS
            || self.default_duration_mins > self.max_duration_mins
        {
            return Err("default duration must lie within the allowed range".into());
        }
        if !(1..=NOTIFICATION_TTL_CEILING_HOURS).contains(&self.notification_ttl_hours) {
            return Err(format!(
                "notification ttl must be between 1 and {NOTIFICATION_TTL_CEILING_HOURS} hours"
            ));
        }
        if !(1..=DURATION_CEILING_MINS).contains(&self.sos_ttl_mins) {
            return Err("sos ttl out of range".into());
        }
        if self.arrival_reward < 0 || self.ghost_penalty < 0 {
            return Err("reputation deltas are magnitudes and must not be negative".into());
        }
        if self.nearby_scan_limit < 1 || self.feed_scan_limit < 1 || self.sos_scan_limit < 1 {
            return Err("scan limits must be positive".into());
        }
        Ok(())
    }
}
