use axum::routing::{post, put};
use axum::Router;

use crate::handlers::me;
use crate::state::AppState;

/// Routes mounted at `/me`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/location", put(me::update_location))
        .route("/blocks", post(me::block_user))
        .route("/sos", post(me::trigger_sos))
}
