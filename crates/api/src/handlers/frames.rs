//! Read-side handlers for viewers and the map client.

use std::path::Path;

use axum::extract::State;
use axum::Json;
use roadscan_core::error::CoreError;
use roadscan_core::types::Timestamp;
use roadscan_db::models::frame::Frame;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::ingest::latest::empty_snapshot_json;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Public URL prefix under which stored frame images are served.
pub const FRAMES_URL_PREFIX: &str = "/storage/frames";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A geotagged frame as shown on the route map.
#[derive(Debug, Serialize)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: Timestamp,
    pub is_pothole: bool,
    pub pothole_area_percent: f64,
    /// Public URL of the frame image.
    pub file_path: String,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub points: Vec<RoutePoint>,
}

impl RoutePoint {
    /// Build a point from a row; `None` if the row lacks a coordinate.
    fn from_frame(frame: Frame) -> Option<Self> {
        let (lat, lon) = (frame.lat?, frame.lon?);
        let file_name = Path::new(&frame.file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some(Self {
            lat,
            lon,
            timestamp: frame.captured_at,
            is_pothole: frame.is_pothole,
            pothole_area_percent: frame.pothole_area_percent,
            file_path: format!("{FRAMES_URL_PREFIX}/{file_name}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /frame
///
/// The latest-frame snapshot, or the all-null body before the first frame.
pub async fn get_latest_frame(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let body = match state.latest.latest().await {
        Some(snapshot) => serde_json::to_value(&*snapshot)
            .map_err(|e| AppError::Core(CoreError::Internal(e.to_string())))?,
        None => empty_snapshot_json(),
    };
    Ok(Json(body))
}

/// GET /route
///
/// Every frame with both coordinates, for the map view.
pub async fn get_route(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<RouteResponse>> {
    let frames = state.store.list_with_coordinates().await?;
    tracing::debug!(subject = %user.subject, count = frames.len(), "Serving route");

    let points = frames.into_iter().filter_map(RoutePoint::from_frame).collect();
    Ok(Json(RouteResponse { points }))
}
