//! Handlers for the caller's own profile: location sync, block list and SOS.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use vibe_core::error::CoreError;
use vibe_core::types::UserId;
use vibe_engine::SosResult;

use crate::error::AppResult;
use crate::handlers::location;
use crate::handlers::vibes::LocationBody;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BlockBody {
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub spatial_key: String,
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub blocked_id: UserId,
    /// False when the user was already blocked.
    pub added: bool,
}

/// PUT /api/v1/me/location
pub async fn update_location(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<LocationBody>,
) -> AppResult<Json<DataResponse<LocationResponse>>> {
    let coords = location(body.lat, body.lng)?.ok_or(CoreError::LocationRequired)?;
    let spatial_key = state
        .engine
        .safety
        .update_location(auth.user_id, coords)
        .await?;
    Ok(Json(DataResponse {
        data: LocationResponse { spatial_key },
    }))
}

/// POST /api/v1/me/blocks
pub async fn block_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<BlockBody>,
) -> AppResult<Json<DataResponse<BlockResponse>>> {
    let added = state.engine.safety.block(auth.user_id, body.user_id).await?;
    Ok(Json(DataResponse {
        data: BlockResponse {
            blocked_id: body.user_id,
            added,
        },
    }))
}

/// POST /api/v1/me/sos
///
/// Returns 201 with the stored alert and the number of neighbours told.
pub async fn trigger_sos(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<LocationBody>,
) -> AppResult<(StatusCode, Json<DataResponse<SosResult>>)> {
    let coords = location(body.lat, body.lng)?.ok_or(CoreError::LocationRequired)?;
    let result = state.engine.safety.trigger_sos(auth.user_id, coords).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: result })))
}
