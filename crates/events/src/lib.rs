//! Vibe event bus and notification relay.
//!
//! - [`EventBus`] is the in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`VibeEvent`] is the lifecycle event envelope.
//! - [`NotificationRelay`] persists notifications off the request path and
//!   announces them on the bus.
//! - [`EventLog`] is a background subscriber that writes every event to the
//!   tracing log.

pub mod bus;
pub mod log;
pub mod relay;

pub use bus::{event_types, EventBus, VibeEvent};
pub use log::EventLog;
pub use relay::NotificationRelay;
