pub mod health;
pub mod me;
pub mod notification;
pub mod vibes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /vibes                         create
/// /vibes/feed                    discovery listing
/// /vibes/{id}                    fetch, creator delete
/// /vibes/{id}/join               join
/// /vibes/{id}/presence           enter / step away
/// /vibes/{id}/leave              leave (reclaims finished sessions)
/// /vibes/{id}/arrival            confirm arrival
/// /vibes/{id}/ghost              report a no-show
/// /vibes/{id}/abort              abort, optionally blocking the peer
///
/// /me/location                   location sync
/// /me/blocks                     block a user
///
/// /notifications                 inbox, purge
/// /notifications/unread-count    unread badge
/// /notifications/read-all        mark everything read
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/vibes", vibes::router())
        .nest("/me", me::router())
        .nest("/notifications", notification::router())
}
