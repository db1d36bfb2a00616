//! Engine configuration loaded from the environment.

use vibe_core::policy::MatchPolicy;

/// Default optimistic-write retry budget per operation.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error("invalid match policy: {0}")]
    Policy(String),
}

/// Limits and tuning for every engine operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub policy: MatchPolicy,
    /// Re-read and re-apply attempts after a lost compare-and-swap.
    pub max_conflict_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `VIBE_JOIN_RADIUS_KM`         | `0.5`   |
    /// | `VIBE_SEARCH_PRECISION`       | `6`     |
    /// | `VIBE_PROFILE_KEY_PRECISION`  | `9`     |
    /// | `VIBE_DEFAULT_DURATION_MINS`  | `15`    |
    /// | `VIBE_MAX_DURATION_MINS`      | `240`   |
    /// | `VIBE_ARRIVAL_REWARD`         | `1`     |
    /// | `VIBE_GHOST_PENALTY`          | `2`     |
    /// | `VIBE_NOTIFICATION_TTL_HOURS` | `24`    |
    /// | `VIBE_NEARBY_SCAN_LIMIT`      | `50`    |
    /// | `VIBE_SOS_TTL_MINS`           | `30`    |
    /// | `VIBE_SOS_SCAN_LIMIT`         | `100`   |
    /// | `VIBE_MAX_CONFLICT_RETRIES`   | `8`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MatchPolicy::default();
        let policy = MatchPolicy {
            join_radius_km: parse(&lookup, "VIBE_JOIN_RADIUS_KM", defaults.join_radius_km)?,
            search_precision: parse(&lookup, "VIBE_SEARCH_PRECISION", defaults.search_precision)?,
            profile_key_precision: parse(
                &lookup,
                "VIBE_PROFILE_KEY_PRECISION",
                defaults.profile_key_precision,
            )?,
            default_duration_mins: parse(
                &lookup,
                "VIBE_DEFAULT_DURATION_MINS",
                defaults.default_duration_mins,
            )?,
            max_duration_mins: parse(&lookup, "VIBE_MAX_DURATION_MINS", defaults.max_duration_mins)?,
            arrival_reward: parse(&lookup, "VIBE_ARRIVAL_REWARD", defaults.arrival_reward)?,
            ghost_penalty: parse(&lookup, "VIBE_GHOST_PENALTY", defaults.ghost_penalty)?,
            notification_ttl_hours: parse(
                &lookup,
                "VIBE_NOTIFICATION_TTL_HOURS",
                defaults.notification_ttl_hours,
            )?,
            nearby_scan_limit: parse(&lookup, "VIBE_NEARBY_SCAN_LIMIT", defaults.nearby_scan_limit)?,
            feed_scan_limit: defaults.feed_scan_limit,
            sos_ttl_mins: parse(&lookup, "VIBE_SOS_TTL_MINS", defaults.sos_ttl_mins)?,
            sos_scan_limit: parse(&lookup, "VIBE_SOS_SCAN_LIMIT", defaults.sos_scan_limit)?,
        };
        policy.validate().map_err(ConfigError::Policy)?;

        let max_conflict_retries = parse(
            &lookup,
            "VIBE_MAX_CONFLICT_RETRIES",
            DEFAULT_MAX_CONFLICT_RETRIES,
        )?;

        Ok(Self {
            policy,
            max_conflict_retries,
        })
    }
}

fn parse<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}
