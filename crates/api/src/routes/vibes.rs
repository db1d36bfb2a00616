//! Route definitions for the `/vibes` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::vibes;
use crate::state::AppState;

/// Routes mounted at `/vibes`.
///
/// ```text
/// POST   /                 -> create_vibe
/// GET    /feed             -> feed
/// GET    /{id}             -> get_vibe
/// DELETE /{id}             -> delete_vibe
/// POST   /{id}/join        -> join_vibe
/// POST   /{id}/presence    -> set_presence
/// POST   /{id}/leave       -> leave_vibe
/// POST   /{id}/arrival     -> log_arrival
/// POST   /{id}/ghost       -> report_ghosting
/// POST   /{id}/abort       -> abort_vibe
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(vibes::create_vibe))
        .route("/feed", get(vibes::feed))
        .route("/{id}", get(vibes::get_vibe).delete(vibes::delete_vibe))
        .route("/{id}/join", post(vibes::join_vibe))
        .route("/{id}/presence", post(vibes::set_presence))
        .route("/{id}/leave", post(vibes::leave_vibe))
        .route("/{id}/arrival", post(vibes::log_arrival))
        .route("/{id}/ghost", post(vibes::report_ghosting))
        .route("/{id}/abort", post(vibes::abort_vibe))
}
