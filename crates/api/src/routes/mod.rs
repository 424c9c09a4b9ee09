pub mod health;

use std::path::Path;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;

use crate::handlers::frames::{self, FRAMES_URL_PREFIX};
use crate::ingest;
use crate::state::AppState;

/// Build the application route tree.
///
/// Paths are unversioned because deployed mobile and viewer clients
/// already call them.
///
/// ```text
/// /ws                     frame stream (token query param)
/// /frame                  latest-frame snapshot (public)
/// /route                  geotagged frames (requires auth)
/// /storage/frames/{file}  stored frame images
/// ```
pub fn app_routes(storage_dir: &Path) -> Router<AppState> {
    Router::new()
        .route("/ws", get(ingest::stream_ws_handler))
        .route("/frame", get(frames::get_latest_frame))
        .route("/route", get(frames::get_route))
        .nest_service(FRAMES_URL_PREFIX, ServeDir::new(storage_dir))
}
