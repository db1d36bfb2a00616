//! Repository for the `profiles` table.

use sqlx::PgPool;
use vibe_core::geo::Coordinates;
use vibe_core::profile::Profile;
use vibe_core::types::{Timestamp, UserId};

use crate::models::profile::ProfileRow;

const COLUMNS: &str = "id, display_name, trust_points, blocked_users, is_incognito, \
                       is_approved, last_lat, last_lng, spatial_key, last_seen_at";

/// Provides the profile reads and writes the matching core needs.
pub struct ProfileRepo;

impl ProfileRepo {
    pub async fn find_by_id(pool: &PgPool, id: UserId) -> Result<Option<ProfileRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, ProfileRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or fully overwrite a profile.
    pub async fn upsert(pool: &PgPool, p: &Profile) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                trust_points = EXCLUDED.trust_points,
                blocked_users = EXCLUDED.blocked_users,
                is_incognito = EXCLUDED.is_incognito,
                is_approved = EXCLUDED.is_approved,
                last_lat = EXCLUDED.last_lat,
                last_lng = EXCLUDED.last_lng,
                spatial_key = EXCLUDED.spatial_key,
                last_seen_at = EXCLUDED.last_seen_at,
                updated_at = NOW()"
        );
        sqlx::query(&query)
            .bind(p.id)
            .bind(&p.display_name)
            .bind(p.trust_points)
            .bind(p.blocked_users.iter().copied().collect::<Vec<UserId>>())
            .bind(p.is_incognito)
            .bind(p.is_approved)
            .bind(p.last_coords.map(|c| c.lat))
            .bind(p.last_coords.map(|c| c.lng))
            .bind(&p.spatial_key)
            .bind(p.last_seen_at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a location sample. Returns `true` if the profile exists.
    pub async fn update_location(
        pool: &PgPool,
        id: UserId,
        coords: Coordinates,
        spatial_key: &str,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE profiles
             SET last_lat = $2, last_lng = $3, spatial_key = $4, last_seen_at = $5, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(coords.lat)
        .bind(coords.lng)
        .bind(spatial_key)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add `delta` to the trust counter in a single statement.
    pub async fn adjust_trust_points(
        pool: &PgPool,
        id: UserId,
        delta: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE profiles SET trust_points = trust_points + $2, updated_at = NOW()
             WHERE id = $1
             RETURNING trust_points",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(pool)
        .await
    }

    /// Append to the block list unless already present.
    pub async fn add_blocked(pool: &PgPool, id: UserId, blocked: UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE profiles
             SET blocked_users = array_append(blocked_users, $2), updated_at = NOW()
             WHERE id = $1 AND NOT ($2 = ANY(blocked_users))",
        )
        .bind(id)
        .bind(blocked)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Profiles whose spatial key starts with any of `prefixes`.
    pub async fn find_by_key_prefixes(
        pool: &PgPool,
        prefixes: &[String],
        limit: i64,
    ) -> Result<Vec<ProfileRow>, sqlx::Error> {
        let patterns: Vec<String> = prefixes.iter().map(|p| format!("{p}%")).collect();
        let query = format!(
            "SELECT {COLUMNS} FROM profiles
             WHERE spatial_key LIKE ANY($1)
             ORDER BY last_seen_at DESC NULLS LAST
             LIMIT $2"
        );
        sqlx::query_as::<_, ProfileRow>(&query)
            .bind(patterns)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
