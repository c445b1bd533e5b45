//! Itinerary read endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use tripforge_core::Itinerary;

use crate::api_error::ApiError;
use crate::server::GatewayState;

/// Handler for `GET /api/itinerary/:session_id`
pub async fn get_itinerary(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let itinerary = state.controller.current_itinerary(&session_id).await?;
    let total_versions = itinerary.version;
    Ok(Json(json!({
        "itinerary": itinerary,
        "total_versions": total_versions,
    })))
}

/// Handler for `GET /api/itinerary/:session_id/versions`
pub async fn list_versions(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let versions = state.controller.versions(&session_id).await?;
    Ok(Json(json!({ "versions": versions })))
}

/// Handler for `GET /api/itinerary/:session_id/versions/:version`
pub async fn get_version(
    State(state): State<GatewayState>,
    Path((session_id, version)): Path<(String, u32)>,
) -> Result<Json<Itinerary>, ApiError> {
    let itinerary = state
        .controller
        .itinerary_version(&session_id, version)
        .await?;
    Ok(Json(itinerary))
}

/// Handler for `GET /api/itinerary/:session_id/report`
pub async fn get_report(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let report = state.controller.report(&session_id).await?;
    Ok(Json(json!({
        "clean": report.is_clean(),
        "report": report,
    })))
}
