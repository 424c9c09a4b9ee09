use std::sync::Arc;

use roadscan_db::FrameStore;

use crate::config::ServerConfig;
use crate::engine::EnrichmentDispatcher;
use crate::ingest::{FrameIngestor, LatestFrameCache};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Durable frame store.
    pub store: Arc<dyn FrameStore>,
    /// Most recently accepted frame, for polling viewers.
    pub latest: Arc<LatestFrameCache>,
    /// Per-message ingest pipeline shared by every stream connection.
    pub ingestor: Arc<FrameIngestor>,
    /// Background enrichment; held here so shutdown can drain it.
    pub enrichment: EnrichmentDispatcher,
}
