//! Repository for the `safety_alerts` table.

use sqlx::PgPool;
use vibe_core::alert::SafetyAlert;
use vibe_core::types::{Timestamp, UserId};

use crate::models::alert::SafetyAlertRow;

const COLUMNS: &str = "id, sender_id, sender_name, lat, lng, created_at, expires_at";

pub struct AlertRepo;

impl AlertRepo {
    pub async fn insert(pool: &PgPool, a: &SafetyAlert) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO safety_alerts ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        );
        sqlx::query(&query)
            .bind(a.id)
            .bind(a.sender_id)
            .bind(&a.sender_name)
            .bind(a.coords.lat)
            .bind(a.coords.lng)
            .bind(a.created_at)
            .bind(a.expires_at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Unexpired alerts raised by `sender`, newest first.
    pub async fn list_active_for_sender(
        pool: &PgPool,
        sender: UserId,
        now: Timestamp,
    ) -> Result<Vec<SafetyAlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM safety_alerts
             WHERE sender_id = $1 AND expires_at > $2
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, SafetyAlertRow>(&query)
            .bind(sender)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    pub async fn delete_expired_for_sender(
        pool: &PgPool,
        sender: UserId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM safety_alerts WHERE sender_id = $1 AND expires_at <= $2")
            .bind(sender)
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
