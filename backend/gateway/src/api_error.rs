//! Mapping of domain errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use tripforge_core::TripError;

/// Shown to clients whenever the model could not produce a usable plan.
pub const GENERATION_FAILED_MESSAGE: &str = "something went wrong, please try again";

/// Handler error. Wraps [`TripError`] so it can be returned from axum handlers.
#[derive(Debug)]
pub struct ApiError(pub TripError);

impl From<TripError> for ApiError {
    fn from(err: TripError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TripError::SessionNotFound(_)
            | TripError::NoItinerary
            | TripError::VersionNotFound(_) => StatusCode::NOT_FOUND,
            TripError::FormLocked | TripError::VersionConflict { .. } => StatusCode::CONFLICT,
            TripError::InvalidForm(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TripError::GenerationFailed(_) | TripError::LlmError { .. } => StatusCode::BAD_GATEWAY,
            TripError::ConfigError(_) | TripError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Value {
        match &self.0 {
            TripError::InvalidForm(errors) => json!({
                "error": "invalid form",
                "errors": errors,
            }),
            TripError::GenerationFailed(_) | TripError::LlmError { .. } => json!({
                "error": GENERATION_FAILED_MESSAGE,
            }),
            TripError::ConfigError(_) | TripError::Other(_) => json!({
                "error": "internal server error",
            }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
