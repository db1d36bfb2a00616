//! Per-user notification inbox.

use std::sync::Arc;

use vibe_core::error::CoreError;
use vibe_core::notification::Notification;
use vibe_core::types::UserId;

use crate::context::EngineContext;

/// Default page size for inbox listings.
pub const DEFAULT_INBOX_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct InboxService {
    ctx: Arc<EngineContext>,
}

impl InboxService {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    pub async fn list(&self, user_id: UserId, unread_only: bool, limit: i64) -> Result<Vec<Notification>, CoreError> {
        let limit = limit.clamp(1, 200);
        Ok(self
            .ctx
            .notifications
            .list_for_recipient(user_id, unread_only, self.ctx.now(), limit)
            .await?)
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, CoreError> {
        Ok(self.ctx.notifications.unread_count(user_id, self.ctx.now()).await?)
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, CoreError> {
        Ok(self.ctx.notifications.mark_all_read(user_id).await?)
    }

    /// Delete every notification in the inbox.
    pub async fn purge(&self, user_id: UserId) -> Result<u64, CoreError> {
        let removed = self.ctx.notifications.delete_for_recipient(user_id).await?;
        tracing::debug!(user_id = %user_id, removed, "Inbox purged");
        Ok(removed)
    }
}
