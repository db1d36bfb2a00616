//! Vibe domain core.
//!
//! Pure business logic for proximity meetups: no database, no network. The
//! storage traits in [`store`] are the only seam to the outside world; the
//! `vibe-db` crate implements them and `vibe-engine` drives them.

pub mod alert;
pub mod clock;
pub mod error;
pub mod geo;
pub mod notification;
pub mod policy;
pub mod profile;
pub mod secure_key;
pub mod session;
pub mod store;
pub mod types;
