pub mod me;
pub mod notification;
pub mod vibes;

use vibe_core::geo::Coordinates;

use crate::error::{AppError, AppResult};

/// Combine optional `lat`/`lng` request fields into one location sample.
///
/// Both absent means "no location" (the engine decides whether that is an
/// error); only one of them present is a malformed request.
pub(crate) fn location(lat: Option<f64>, lng: Option<f64>) -> AppResult<Option<Coordinates>> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(Some(Coordinates::new(lat, lng))),
        (None, None) => Ok(None),
        _ => Err(AppError::BadRequest("lat and lng must be given together".into())),
    }
}
