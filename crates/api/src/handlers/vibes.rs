//! Handlers for the `/vibes` resource.
//!
//! All endpoints require authentication via [`AuthUser`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use vibe_core::session::{ArrivalOutcome, JoinOutcome, Session};
use vibe_core::types::{SessionId, UserId};
use vibe_engine::{CreateVibe, FeedEntry};

use crate::error::AppResult;
use crate::handlers::location;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /vibes`.
#[derive(Debug, Deserialize)]
pub struct CreateVibeRequest {
    #[serde(flatten)]
    pub vibe: CreateVibe,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Query parameters for `GET /vibes/feed`.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Activity filter; `All` or absent means no filter.
    pub activity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocationBody {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PresenceBody {
    pub present: bool,
}

#[derive(Debug, Deserialize)]
pub struct GhostReportBody {
    pub accused_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct AbortBody {
    /// Also block the counterparty.
    #[serde(default)]
    pub block: bool,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    #[serde(flatten)]
    pub session: Session,
    pub already_joined: bool,
}

#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    #[serde(flatten)]
    pub session: Session,
    /// True only for the update that started the meetup timer.
    pub handshake: bool,
}

#[derive(Debug, Serialize)]
pub struct ArrivalResponse {
    #[serde(flatten)]
    pub session: Session,
    pub completed: bool,
    pub already_logged: bool,
    pub trust_points: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GhostReportResponse {
    #[serde(flatten)]
    pub session: Session,
    pub accused_trust_points: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    /// The session was terminal and this was the last viewer, so it was removed.
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/vibes
pub async fn create_vibe(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateVibeRequest>,
) -> AppResult<impl IntoResponse> {
    let at = location(input.lat, input.lng)?;
    let session = state
        .engine
        .matchmaking
        .create(Some(auth.user_id), input.vibe, at)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: session })))
}

/// GET /api/v1/vibes/feed
pub async fn feed(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<FeedQuery>,
) -> AppResult<Json<DataResponse<Vec<FeedEntry>>>> {
    let at = location(params.lat, params.lng)?;
    let entries = state
        .engine
        .feed
        .list(auth.user_id, at, params.activity.as_deref())
        .await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/vibes/{id}
pub async fn get_vibe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<Json<DataResponse<Session>>> {
    let session = state.engine.matchmaking.get(auth.user_id, id).await?;
    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/vibes/{id}/join
pub async fn join_vibe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(body): Json<LocationBody>,
) -> AppResult<Json<DataResponse<JoinResponse>>> {
    let at = location(body.lat, body.lng)?;
    let result = state
        .engine
        .matchmaking
        .join(Some(auth.user_id), id, at)
        .await?;
    Ok(Json(DataResponse {
        data: JoinResponse {
            session: result.session,
            already_joined: result.outcome == JoinOutcome::AlreadyJoined,
        },
    }))
}

/// POST /api/v1/vibes/{id}/presence
pub async fn set_presence(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(body): Json<PresenceBody>,
) -> AppResult<Json<DataResponse<PresenceResponse>>> {
    let result = state
        .engine
        .presence
        .set_present(id, auth.user_id, body.present)
        .await?;
    Ok(Json(DataResponse {
        data: PresenceResponse {
            session: result.session,
            handshake: result.outcome.handshake,
        },
    }))
}

/// POST /api/v1/vibes/{id}/leave
pub async fn leave_vibe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<Json<DataResponse<LeaveResponse>>> {
    let deleted = state.engine.presence.leave(id, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: LeaveResponse { deleted },
    }))
}

/// POST /api/v1/vibes/{id}/arrival
pub async fn log_arrival(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<Json<DataResponse<ArrivalResponse>>> {
    let result = state.engine.arrivals.log_arrival(id, auth.user_id).await?;
    let (completed, already_logged) = match result.outcome {
        ArrivalOutcome::Logged { completed } => (completed, false),
        ArrivalOutcome::AlreadyLogged => (false, true),
    };
    Ok(Json(DataResponse {
        data: ArrivalResponse {
            session: result.session,
            completed,
            already_logged,
            trust_points: result.trust_points,
        },
    }))
}

/// POST /api/v1/vibes/{id}/ghost
pub async fn report_ghosting(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(body): Json<GhostReportBody>,
) -> AppResult<Json<DataResponse<GhostReportResponse>>> {
    let result = state
        .engine
        .arrivals
        .report_ghosting(id, auth.user_id, body.accused_id)
        .await?;
    Ok(Json(DataResponse {
        data: GhostReportResponse {
            session: result.session,
            accused_trust_points: result.accused_trust_points,
        },
    }))
}

/// POST /api/v1/vibes/{id}/abort
///
/// The body is optional; without one nobody is blocked.
pub async fn abort_vibe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    body: Option<Json<AbortBody>>,
) -> AppResult<Json<DataResponse<Session>>> {
    let block = body.is_some_and(|Json(body)| body.block);
    let session = if block {
        state.engine.safety.abort_and_block(auth.user_id, id).await?
    } else {
        state.engine.matchmaking.abort(auth.user_id, id).await?
    };
    Ok(Json(DataResponse { data: session }))
}

/// DELETE /api/v1/vibes/{id}
///
/// Creator-only hard delete. Returns 204 No Content.
pub async fn delete_vibe(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<StatusCode> {
    state.engine.matchmaking.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
