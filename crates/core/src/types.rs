/// Opaque identifier of a vibe session (UUIDv7, minted at creation).
pub type SessionId = uuid::Uuid;

/// Identifier of a user, owned by the identity provider.
pub type UserId = uuid::Uuid;

/// Identifier of a notification row.
pub type NotificationId = uuid::Uuid;

/// Identifier of an emergency alert.
pub type AlertId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
