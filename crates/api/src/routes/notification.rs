//! Route definitions for the `/notifications` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                -> list_notifications
/// DELETE /                -> purge
/// GET    /unread-count    -> unread_count
/// POST   /read-all        -> mark_all_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(notification::list_notifications).delete(notification::purge),
        )
        .route("/unread-count", get(notification::unread_count))
        .route("/read-all", post(notification::mark_all_read))
}
