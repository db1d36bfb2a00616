//! Postgres-backed implementation of the core storage traits.

use async_trait::async_trait;
use vibe_core::alert::SafetyAlert;
use vibe_core::geo::Coordinates;
use vibe_core::notification::Notification;
use vibe_core::profile::Profile;
use vibe_core::session::Session;
use vibe_core::store::{
    NotificationStore, ProfileStore, SafetyAlertStore, SessionStore, StoreError, StoreResult,
};
use vibe_core::types::{SessionId, Timestamp, UserId};

use crate::repositories::{AlertRepo, NotificationRepo, ProfileRepo, SessionRepo};
use crate::DbPool;

/// Map a driver error into the storage error type.
fn db_err(err: sqlx::Error) -> StoreError {
    if matches!(err, sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut) {
        tracing::warn!(error = %err, "Database pool unavailable");
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::backend(err)
    }
}

/// Every store over one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert(&self, session: &Session) -> StoreResult<()> {
        SessionRepo::insert(&self.pool, session).await.map_err(db_err)
    }

    async fn get(&self, id: SessionId) -> StoreResult<Option<Session>> {
        SessionRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_err)?
            .map(Session::try_from)
            .transpose()
    }

    async fn replace(&self, session: &Session, expected_version: i64) -> StoreResult<bool> {
        SessionRepo::replace(&self.pool, session, expected_version)
            .await
            .map_err(db_err)
    }

    async fn delete(&self, id: SessionId) -> StoreResult<bool> {
        SessionRepo::delete(&self.pool, id).await.map_err(db_err)
    }

    async fn delete_if_version(&self, id: SessionId, expected_version: i64) -> StoreResult<bool> {
        SessionRepo::delete_if_version(&self.pool, id, expected_version)
            .await
            .map_err(db_err)
    }

    async fn list_open_in_buckets(
        &self,
        buckets: &[String],
        now: Timestamp,
        limit: i64,
    ) -> StoreResult<Vec<Session>> {
        SessionRepo::list_open_in_buckets(&self.pool, buckets, now, limit)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Session::try_from)
            .collect()
    }

    async fn list_for_user(&self, user_id: UserId, now: Timestamp) -> StoreResult<Vec<Session>> {
        SessionRepo::list_for_user(&self.pool, user_id, now)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Session::try_from)
            .collect()
    }

    async fn delete_expired_for_owner(
        &self,
        owner: UserId,
        now: Timestamp,
    ) -> StoreResult<Vec<SessionId>> {
        SessionRepo::delete_expired_for_owner(&self.pool, owner, now)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert(&self, notification: &Notification) -> StoreResult<()> {
        NotificationRepo::insert(&self.pool, notification)
            .await
            .map_err(db_err)
    }

    async fn list_for_recipient(
        &self,
        recipient: UserId,
        unread_only: bool,
        now: Timestamp,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        NotificationRepo::list_for_recipient(&self.pool, recipient, unread_only, now, limit)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    async fn unread_count(&self, recipient: UserId, now: Timestamp) -> StoreResult<i64> {
        NotificationRepo::unread_count(&self.pool, recipient, now)
            .await
            .map_err(db_err)
    }

    async fn mark_all_read(&self, recipient: UserId) -> StoreResult<u64> {
        NotificationRepo::mark_all_read(&self.pool, recipient)
            .await
            .map_err(db_err)
    }

    async fn delete_for_recipient(&self, recipient: UserId) -> StoreResult<u64> {
        NotificationRepo::delete_for_recipient(&self.pool, recipient)
            .await
            .map_err(db_err)
    }

    async fn delete_by_session(&self, session_id: SessionId) -> StoreResult<u64> {
        NotificationRepo::delete_by_session(&self.pool, session_id)
            .await
            .map_err(db_err)
    }

    async fn delete_expired_for_recipient(&self, recipient: UserId, now: Timestamp) -> StoreResult<u64> {
        NotificationRepo::delete_expired_for_recipient(&self.pool, recipient, now)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn get(&self, id: UserId) -> StoreResult<Option<Profile>> {
        Ok(ProfileRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_err)?
            .map(Profile::from))
    }

    async fn upsert(&self, profile: &Profile) -> StoreResult<()> {
        ProfileRepo::upsert(&self.pool, profile).await.map_err(db_err)
    }

    async fn update_location(
        &self,
        id: UserId,
        coords: Coordinates,
        spatial_key: &str,
        now: Timestamp,
    ) -> StoreResult<bool> {
        ProfileRepo::update_location(&self.pool, id, coords, spatial_key, now)
            .await
            .map_err(db_err)
    }

    async fn adjust_trust_points(&self, id: UserId, delta: i64) -> StoreResult<Option<i64>> {
        ProfileRepo::adjust_trust_points(&self.pool, id, delta)
            .await
            .map_err(db_err)
    }

    async fn add_blocked(&self, id: UserId, blocked: UserId) -> StoreResult<bool> {
        ProfileRepo::add_blocked(&self.pool, id, blocked)
            .await
            .map_err(db_err)
    }

    async fn find_by_key_prefixes(&self, prefixes: &[String], limit: i64) -> StoreResult<Vec<Profile>> {
        Ok(ProfileRepo::find_by_key_prefixes(&self.pool, prefixes, limit)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(Profile::from)
            .collect())
    }
}

#[async_trait]
impl SafetyAlertStore for PgStore {
    async fn insert(&self, alert: &SafetyAlert) -> StoreResult<()> {
        AlertRepo::insert(&self.pool, alert).await.map_err(db_err)
    }

    async fn list_active_for_sender(&self, sender: UserId, now: Timestamp) -> StoreResult<Vec<SafetyAlert>> {
        Ok(AlertRepo::list_active_for_sender(&self.pool, sender, now)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(SafetyAlert::from)
            .collect())
    }

    async fn delete_expired_for_sender(&self, sender: UserId, now: Timestamp) -> StoreResult<u64> {
        AlertRepo::delete_expired_for_sender(&self.pool, sender, now)
            .await
            .map_err(db_err)
    }
}
