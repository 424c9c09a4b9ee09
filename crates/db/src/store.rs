//! The durable frame store seam.
//!
//! The ingestion pipeline only ever talks to frames through [`FrameStore`],
//! so the pipeline can run against Postgres in production and an
//! in-memory store in tests.

use async_trait::async_trait;
use roadscan_core::types::FrameId;
use roadscan_core::verdict::Verdict;

use crate::models::frame::{CreateFrame, Frame};
use crate::repositories::FrameRepo;
use crate::DbPool;

/// Durable storage of frame rows.
///
/// Each call commits independently; concurrent calls for different frame
/// ids never conflict.
#[async_trait]
pub trait FrameStore: Send + Sync {
    /// Insert a newly ingested frame (verdict defaults to not detected).
    async fn insert(&self, frame: &CreateFrame) -> Result<Frame, sqlx::Error>;

    /// Overwrite the verdict of an existing frame.
    ///
    /// Returns `false` when no frame with `id` exists; that is a no-op,
    /// not an error. Applying the same verdict twice leaves the row as if
    /// it had been applied once.
    async fn update_verdict(&self, id: FrameId, verdict: Verdict) -> Result<bool, sqlx::Error>;

    /// Frames that carry both latitude and longitude.
    async fn list_with_coordinates(&self) -> Result<Vec<Frame>, sqlx::Error>;

    /// Confirm the backing store is reachable.
    async fn health_check(&self) -> Result<(), sqlx::Error>;
}

/// [`FrameStore`] backed by the Postgres `frames` table.
#[derive(Debug, Clone)]
pub struct PgFrameStore {
    pool: DbPool,
}

impl PgFrameStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FrameStore for PgFrameStore {
    async fn insert(&self, frame: &CreateFrame) -> Result<Frame, sqlx::Error> {
        FrameRepo::insert(&self.pool, frame).await
    }

    async fn update_verdict(&self, id: FrameId, verdict: Verdict) -> Result<bool, sqlx::Error> {
        let rows = FrameRepo::update_verdict(&self.pool, id, verdict).await?;
        if rows == 0 {
            tracing::debug!(frame_id = %id, "Verdict update matched no frame");
        }
        Ok(rows > 0)
    }

    async fn list_with_coordinates(&self) -> Result<Vec<Frame>, sqlx::Error> {
        FrameRepo::list_with_coordinates(&self.pool).await
    }

    async fn health_check(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }
}
