//! Notification domain types.
//!
//! Notifications are a fire-and-forget side channel. A notification may
//! reference the session it was raised for so that deleting the session can
//! cascade to it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{NotificationId, SessionId, Timestamp, UserId};

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

/// Fixed titles for core-emitted notifications.
pub mod titles {
    pub const NEARBY_SIGNAL: &str = "NEARBY SIGNAL";
    pub const CONNECTION_MADE: &str = "CONNECTION MADE";
    pub const SESSION_ENDED: &str = "SESSION ENDED";
    pub const SOS: &str = "SOS";
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What raised the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new session opened nearby.
    Radar,
    /// Someone joined the recipient's session.
    Match,
    /// The counterparty ended the session.
    Abort,
    /// A nearby user raised an emergency alert.
    Safety,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Radar => "radar",
            Self::Match => "match",
            Self::Abort => "abort",
            Self::Safety => "safety",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "radar" => Ok(Self::Radar),
            "match" => Ok(Self::Match),
            "abort" => Ok(Self::Abort),
            "safety" => Ok(Self::Safety),
            other => Err(format!("unknown notification kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStatus {
    Unread,
    Read,
}

impl ReadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
        }
    }
}

impl FromStr for ReadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            other => Err(format!("unknown read status '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// What a caller asks the relay to send.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub recipient_id: UserId,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub session_id: Option<SessionId>,
}

impl NotificationDraft {
    pub fn new(
        recipient_id: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
        kind: NotificationKind,
    ) -> Self {
        Self {
            recipient_id,
            title: title.into(),
            body: body.into(),
            kind,
            session_id: None,
        }
    }

    /// Attach the originating session for cascade deletion.
    pub fn for_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub status: ReadStatus,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub session_id: Option<SessionId>,
}

impl Notification {
    /// Materialise a draft as an unread notification expiring after `ttl_hours`.
    pub fn from_draft(draft: NotificationDraft, now: Timestamp, ttl_hours: i64) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            recipient_id: draft.recipient_id,
            title: draft.title,
            body: draft.body,
            kind: draft.kind,
            status: ReadStatus::Unread,
            created_at: now,
            expires_at: now + chrono::Duration::hours(ttl_hours),
            session_id: draft.session_id,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}
