use crate::store::StoreError;

/// Domain error taxonomy for every vibe operation.
///
/// Precondition failures raised inside an atomic session update abort that
/// update and surface here unchanged; callers show a message and do not
/// retry `AlreadyFull`, `TooFar` or `SelfJoinForbidden`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No authenticated caller")]
    Unauthorized,

    #[error("A location sample is required")]
    LocationRequired,

    #[error("Session not found")]
    NotFound,

    #[error("Too far away ({distance_km:.3} km, limit {limit_km} km)")]
    TooFar { distance_km: f64, limit_km: f64 },

    #[error("This vibe has already been filled")]
    AlreadyFull,

    #[error("You cannot join your own vibe")]
    SelfJoinForbidden,

    #[error("User profile not found")]
    ProfileNotFound,

    #[error("Caller is not a party to this session")]
    NotParticipant,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Ghost report not allowed: {0}")]
    GhostReportNotAllowed(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::ActionFailed(err.to_string())
    }
}
