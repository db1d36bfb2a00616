//! Row structs for the vibe tables.
//!
//! Each submodule contains a `FromRow` struct matching the table layout and
//! a conversion into the matching `vibe-core` domain type. Conversions fail
//! with [`StoreError::Corrupt`](vibe_core::store::StoreError::Corrupt) when a
//! text column holds a value the domain enum does not know.

pub mod alert;
pub mod notification;
pub mod profile;
pub mod session;
