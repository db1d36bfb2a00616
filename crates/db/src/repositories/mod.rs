//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument and return raw rows.

pub mod alert_repo;
pub mod notification_repo;
pub mod profile_repo;
pub mod session_repo;

pub use alert_repo::AlertRepo;
pub use notification_repo::NotificationRepo;
pub use profile_repo::ProfileRepo;
pub use session_repo::SessionRepo;
