//! Shared application router builder.
//!
//! [`build_app_router`] is used by `main.rs` and by the integration tests,
//! so both run behind the same middleware.

use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Request-id header set on the way in and echoed on the way out.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// How long browsers may cache a preflight response.
const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Build the application [`Router`] with its middleware.
///
/// Outermost first: CORS, request id, tracing, request-id echo, timeout,
/// panic recovery. The timeout bounds the upgrade handshake of `/ws`, not
/// the stream that follows it.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::app_routes(&config.storage_dir))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(viewer_cors(&config.cors_origins))
        .with_state(state)
}

/// CORS for the browser viewers.
///
/// Every browser-facing endpoint is a read, and `/route` authenticates
/// with a Bearer header rather than cookies, so only `GET` and the
/// `Authorization` header are allowed and credentials are not.
///
/// Panics at startup if a configured origin is not a valid header value.
fn viewer_cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<_> = origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers([AUTHORIZATION])
        .max_age(CORS_MAX_AGE)
}
