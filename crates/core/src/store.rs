//! Storage contracts the engine is written against.
//!
//! `vibe-db` provides a Postgres implementation and an in-memory one with
//! identical semantics. Session writes are optimistic: `replace` succeeds only
//! when the stored version still equals the version the caller read.

use async_trait::async_trait;

use crate::alert::SafetyAlert;
use crate::geo::Coordinates;
use crate::notification::Notification;
use crate::profile::Profile;
use crate::session::Session;
use crate::types::{SessionId, Timestamp, UserId};

/// Failure reaching or talking to the backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store refused the operation (closed pool, injected outage).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A persisted row could not be mapped back to a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a brand new session. The stored version starts at the
    /// session's `version`.
    async fn insert(&self, session: &Session) -> StoreResult<()>;

    async fn get(&self, id: SessionId) -> StoreResult<Option<Session>>;

    /// Compare-and-swap: write `session` with `version = expected_version + 1`
    /// only if the stored version is still `expected_version`. Returns false
    /// when the row is missing or another writer got there first.
    async fn replace(&self, session: &Session, expected_version: i64) -> StoreResult<bool>;

    async fn delete(&self, id: SessionId) -> StoreResult<bool>;

    /// Delete only if the stored version is still `expected_version`.
    /// Returns false when the row is missing or has moved on.
    async fn delete_if_version(&self, id: SessionId, expected_version: i64) -> StoreResult<bool>;

    /// Open, unexpired, unjoined sessions in any of the given buckets,
    /// newest first.
    async fn list_open_in_buckets(
        &self,
        buckets: &[String],
        now: Timestamp,
        limit: i64,
    ) -> StoreResult<Vec<Session>>;

    /// Sessions the user created or joined that are not yet expired or that
    /// are still live (open/matched), newest first.
    async fn list_for_user(&self, user_id: UserId, now: Timestamp) -> StoreResult<Vec<Session>>;

    /// Remove sessions created by `owner` whose `expires_at` has passed.
    async fn delete_expired_for_owner(
        &self,
        owner: UserId,
        now: Timestamp,
    ) -> StoreResult<Vec<SessionId>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &Notification) -> StoreResult<()>;

    /// Newest first; expired rows are excluded.
    async fn list_for_recipient(
        &self,
        recipient: UserId,
        unread_only: bool,
        now: Timestamp,
        limit: i64,
    ) -> StoreResult<Vec<Notification>>;

    async fn unread_count(&self, recipient: UserId, now: Timestamp) -> StoreResult<i64>;

    async fn mark_all_read(&self, recipient: UserId) -> StoreResult<u64>;

    async fn delete_for_recipient(&self, recipient: UserId) -> StoreResult<u64>;

    /// Cascade for a deleted or aborted session.
    async fn delete_by_session(&self, session_id: SessionId) -> StoreResult<u64>;

    async fn delete_expired_for_recipient(&self, recipient: UserId, now: Timestamp) -> StoreResult<u64>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, id: UserId) -> StoreResult<Option<Profile>>;

    async fn upsert(&self, profile: &Profile) -> StoreResult<()>;

    /// Record the latest location sample. Returns false if the profile is
    /// unknown.
    async fn update_location(
        &self,
        id: UserId,
        coords: Coordinates,
        spatial_key: &str,
        now: Timestamp,
    ) -> StoreResult<bool>;

    /// Atomically add `delta` to the trust counter and return the new value.
    async fn adjust_trust_points(&self, id: UserId, delta: i64) -> StoreResult<Option<i64>>;

    async fn add_blocked(&self, id: UserId, blocked: UserId) -> StoreResult<bool>;

    /// Profiles whose spatial key starts with any of `prefixes`.
    async fn find_by_key_prefixes(&self, prefixes: &[String], limit: i64) -> StoreResult<Vec<Profile>>;
}

#[async_trait]
pub trait SafetyAlertStore: Send + Sync {
    async fn insert(&self, alert: &SafetyAlert) -> StoreResult<()>;

    /// Live alerts raised by `sender`, newest first.
    async fn list_active_for_sender(&self, sender: UserId, now: Timestamp) -> StoreResult<Vec<SafetyAlert>>;

    /// Remove `sender`'s alerts whose expiry has passed.
    async fn delete_expired_for_sender(&self, sender: UserId, now: Timestamp) -> StoreResult<u64>;
}
