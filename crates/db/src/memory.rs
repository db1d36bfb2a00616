//! In-process implementation of the storage traits.
//!
//! Semantics mirror [`PgStore`](crate::PgStore): `replace` is a version
//! compare-and-swap under a write lock, trust adjustments are applied under
//! the same lock as the read, and listings are newest first.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use vibe_core::alert::SafetyAlert;
use vibe_core::geo::Coordinates;
use vibe_core::notification::{Notification, ReadStatus};
use vibe_core::profile::Profile;
use vibe_core::session::{Session, SessionStatus};
use vibe_core::store::{
    NotificationStore, ProfileStore, SafetyAlertStore, SessionStore, StoreError, StoreResult,
};
use vibe_core::types::{AlertId, NotificationId, SessionId, Timestamp, UserId};

#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    notifications: RwLock<HashMap<NotificationId, Notification>>,
    profiles: RwLock<HashMap<UserId, Profile>>,
    alerts: RwLock<HashMap<AlertId, SafetyAlert>>,
    notifications_down: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every notification operation fail with
    /// [`StoreError::Unavailable`] until switched back.
    pub fn set_notifications_unavailable(&self, down: bool) {
        self.notifications_down.store(down, Ordering::SeqCst);
    }

    fn check_notifications(&self) -> StoreResult<()> {
        if self.notifications_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("notification store offline".into()));
        }
        Ok(())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn notification_count(&self) -> usize {
        self.notifications.read().await.len()
    }
}

fn newest_first_sessions(sessions: &mut [Session]) {
    sessions.sort_by_key(|s| Reverse((s.created_at, s.id)));
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: &Session) -> StoreResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::Backend(
                format!("duplicate session id {}", session.id).into(),
            ));
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get(&self, id: SessionId) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn replace(&self, session: &Session, expected_version: i64) -> StoreResult<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(stored) if stored.version == expected_version => {
                let mut next = session.clone();
                next.version = expected_version + 1;
                *stored = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: SessionId) -> StoreResult<bool> {
        Ok(self.sessions.write().await.remove(&id).is_some())
    }

    async fn delete_if_version(&self, id: SessionId, expected_version: i64) -> StoreResult<bool> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&id) {
            Some(stored) if stored.version == expected_version => {
                sessions.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_open_in_buckets(
        &self,
        buckets: &[String],
        now: Timestamp,
        limit: i64,
    ) -> StoreResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<Session> = sessions
            .values()
            .filter(|s| buckets.iter().any(|b| *b == s.bucket) && s.is_discoverable(now))
            .cloned()
            .collect();
        newest_first_sessions(&mut found);
        found.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(found)
    }

    async fn list_for_user(&self, user_id: UserId, now: Timestamp) -> StoreResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<Session> = sessions
            .values()
            .filter(|s| s.is_party(user_id))
            .filter(|s| {
                !s.is_expired(now) || matches!(s.status, SessionStatus::Open | SessionStatus::Matched)
            })
            .cloned()
            .collect();
        newest_first_sessions(&mut found);
        Ok(found)
    }

    async fn delete_expired_for_owner(
        &self,
        owner: UserId,
        now: Timestamp,
    ) -> StoreResult<Vec<SessionId>> {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<SessionId> = sessions
            .values()
            .filter(|s| s.creator_id == owner && s.is_expired(now))
            .map(|s| s.id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        Ok(expired)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, notification: &Notification) -> StoreResult<()> {
        self.check_notifications()?;
        self.notifications
            .write()
            .await
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn list_for_recipient(
        &self,
        recipient: UserId,
        unread_only: bool,
        now: Timestamp,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        self.check_notifications()?;
        let notifications = self.notifications.read().await;
        let mut found: Vec<Notification> = notifications
            .values()
            .filter(|n| n.recipient_id == recipient && !n.is_expired(now))
            .filter(|n| !unread_only || n.status == ReadStatus::Unread)
            .cloned()
            .collect();
        found.sort_by_key(|n| Reverse((n.created_at, n.id)));
        found.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(found)
    }

    async fn unread_count(&self, recipient: UserId, now: Timestamp) -> StoreResult<i64> {
        self.check_notifications()?;
        let notifications = self.notifications.read().await;
        let count = notifications
            .values()
            .filter(|n| {
                n.recipient_id == recipient && n.status == ReadStatus::Unread && !n.is_expired(now)
            })
            .count();
        Ok(count as i64)
    }

    async fn mark_all_read(&self, recipient: UserId) -> StoreResult<u64> {
        self.check_notifications()?;
        let mut notifications = self.notifications.write().await;
        let mut updated = 0;
        for n in notifications.values_mut() {
            if n.recipient_id == recipient && n.status == ReadStatus::Unread {
                n.status = ReadStatus::Read;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_for_recipient(&self, recipient: UserId) -> StoreResult<u64> {
        self.check_notifications()?;
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|_, n| n.recipient_id != recipient);
        Ok((before - notifications.len()) as u64)
    }

    async fn delete_by_session(&self, session_id: SessionId) -> StoreResult<u64> {
        self.check_notifications()?;
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|_, n| n.session_id != Some(session_id));
        Ok((before - notifications.len()) as u64)
    }

    async fn delete_expired_for_recipient(&self, recipient: UserId, now: Timestamp) -> StoreResult<u64> {
        self.check_notifications()?;
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|_, n| !(n.recipient_id == recipient && n.is_expired(now)));
        Ok((before - notifications.len()) as u64)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get(&self, id: UserId) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn upsert(&self, profile: &Profile) -> StoreResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.id, profile.clone());
        Ok(())
    }

    async fn update_location(
        &self,
        id: UserId,
        coords: Coordinates,
        spatial_key: &str,
        now: Timestamp,
    ) -> StoreResult<bool> {
        let mut profiles = self.profiles.write().await;
        match profiles.get_mut(&id) {
            Some(p) => {
                p.last_coords = Some(coords);
                p.spatial_key = Some(spatial_key.to_string());
                p.last_seen_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn adjust_trust_points(&self, id: UserId, delta: i64) -> StoreResult<Option<i64>> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles.get_mut(&id).map(|p| {
            p.trust_points += delta;
            p.trust_points
        }))
    }

    async fn add_blocked(&self, id: UserId, blocked: UserId) -> StoreResult<bool> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles
            .get_mut(&id)
            .is_some_and(|p| p.blocked_users.insert(blocked)))
    }

    async fn find_by_key_prefixes(&self, prefixes: &[String], limit: i64) -> StoreResult<Vec<Profile>> {
        let profiles = self.profiles.read().await;
        let mut found: Vec<Profile> = profiles
            .values()
            .filter(|p| {
                p.spatial_key
                    .as_deref()
                    .is_some_and(|key| prefixes.iter().any(|prefix| key.starts_with(prefix.as_str())))
            })
            .cloned()
            .collect();
        found.sort_by_key(|p| Reverse(p.last_seen_at));
        found.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(found)
    }
}

#[async_trait]
impl SafetyAlertStore for MemoryStore {
    async fn insert(&self, alert: &SafetyAlert) -> StoreResult<()> {
        self.alerts.write().await.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn list_active_for_sender(&self, sender: UserId, now: Timestamp) -> StoreResult<Vec<SafetyAlert>> {
        let alerts = self.alerts.read().await;
        let mut found: Vec<SafetyAlert> = alerts
            .values()
            .filter(|a| a.sender_id == sender && !a.is_expired(now))
            .cloned()
            .collect();
        found.sort_by_key(|a| Reverse((a.created_at, a.id)));
        Ok(found)
    }

    async fn delete_expired_for_sender(&self, sender: UserId, now: Timestamp) -> StoreResult<u64> {
        let mut alerts = self.alerts.write().await;
        let before = alerts.len();
        alerts.retain(|_, a| !(a.sender_id == sender && a.is_expired(now)));
        Ok((before - alerts.len()) as u64)
    }
}
