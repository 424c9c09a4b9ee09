//! Repository for the `frames` table.
//!
//! Rows are inserted once at ingest time and only their verdict columns are
//! ever updated afterwards.

use roadscan_core::types::FrameId;
use roadscan_core::verdict::Verdict;
use sqlx::PgPool;

use crate::models::frame::{CreateFrame, Frame};

/// Column list for `frames` SELECT queries.
const COLUMNS: &str = "\
    id, captured_at, lat, lon, file_path, \
    is_pothole, pothole_area_percent, created_at";

/// Provides query operations for frames.
pub struct FrameRepo;

impl FrameRepo {
    /// Insert a new frame with the default (not detected) verdict.
    pub async fn insert(pool: &PgPool, frame: &CreateFrame) -> Result<Frame, sqlx::Error> {
        let query = format!(
            "INSERT INTO frames (id, captured_at, lat, lon, file_path, is_pothole, pothole_area_percent) \
             VALUES ($1, $2, $3, $4, $5, FALSE, 0) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Frame>(&query)
            .bind(frame.id)
            .bind(frame.captured_at)
            .bind(frame.lat)
            .bind(frame.lon)
            .bind(&frame.file_path)
            .fetch_one(pool)
            .await
    }

    /// Overwrite the verdict for a frame.
    ///
    /// Returns the number of rows touched: `0` when the frame does not
    /// exist (yet), which callers treat as a no-op rather than an error.
    pub async fn update_verdict(
        pool: &PgPool,
        id: FrameId,
        verdict: Verdict,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE frames SET is_pothole = $2, pothole_area_percent = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(verdict.detected)
        .bind(verdict.area_percent)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// All frames that carry both coordinates, oldest capture first.
    pub async fn list_with_coordinates(pool: &PgPool) -> Result<Vec<Frame>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM frames \
             WHERE lat IS NOT NULL AND lon IS NOT NULL \
             ORDER BY captured_at ASC"
        );
        sqlx::query_as::<_, Frame>(&query).fetch_all(pool).await
    }
}
