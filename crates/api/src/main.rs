use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use roadscan_core::blob::BlobStore;
use roadscan_db::{FrameStore, PgFrameStore};
use roadscan_detector::{Detector, DetectorClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roadscan_api::config::ServerConfig;
use roadscan_api::engine::EnrichmentDispatcher;
use roadscan_api::ingest::{FrameIngestor, LatestFrameCache};
use roadscan_api::router::build_app_router;
use roadscan_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roadscan_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = roadscan_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    roadscan_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    roadscan_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let store: Arc<dyn FrameStore> = Arc::new(PgFrameStore::new(pool));

    // --- Blob storage ---
    let blobs = BlobStore::new(config.storage_dir.clone());
    blobs
        .ensure_root()
        .await
        .expect("Failed to create frame storage directory");
    tracing::info!(storage_dir = %config.storage_dir.display(), "Frame storage ready");

    // --- Detector + enrichment ---
    let detector: Arc<dyn Detector> = Arc::new(
        DetectorClient::new(
            config.detector.url.clone(),
            Duration::from_secs(config.detector.timeout_secs),
        )
        .expect("Failed to build detector HTTP client"),
    );
    let enrichment = EnrichmentDispatcher::new(
        Arc::clone(&store),
        detector,
        config.detector.max_in_flight,
    );
    tracing::info!(
        detector_url = %config.detector.url,
        max_in_flight = config.detector.max_in_flight,
        "Enrichment dispatcher ready",
    );

    // --- Ingest ---
    let latest = Arc::new(LatestFrameCache::new());
    let ingestor = Arc::new(FrameIngestor::new(
        blobs,
        Arc::clone(&store),
        Arc::clone(&latest),
        enrichment.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        latest,
        ingestor,
        enrichment: enrichment.clone(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!(
        in_flight = enrichment.in_flight(),
        "Server stopped accepting connections, draining enrichment",
    );

    let drained = enrichment
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    if drained {
        tracing::info!("Enrichment drained");
    } else {
        tracing::warn!(
            in_flight = enrichment.in_flight(),
            "Shutdown timeout reached with enrichment still in flight",
        );
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
