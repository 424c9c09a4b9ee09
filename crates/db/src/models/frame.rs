//! Frame entity model and DTOs.

use roadscan_core::types::{FrameId, Timestamp};
use roadscan_core::verdict::Verdict;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `frames` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Frame {
    pub id: FrameId,
    pub captured_at: Timestamp,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub file_path: String,
    pub is_pothole: bool,
    pub pothole_area_percent: f64,
    pub created_at: Timestamp,
}

impl Frame {
    pub fn verdict(&self) -> Verdict {
        Verdict {
            detected: self.is_pothole,
            area_percent: self.pothole_area_percent,
        }
    }
}

/// DTO for inserting a freshly ingested frame.
///
/// New frames always start with the not-detected verdict.
#[derive(Debug, Clone)]
pub struct CreateFrame {
    pub id: FrameId,
    pub captured_at: Timestamp,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub file_path: String,
}
