//! Detection service response types and verdict derivation.

use roadscan_core::verdict::Verdict;
use serde::Deserialize;

/// One entry of the detection service's response list.
///
/// Only the area field is used; anything else the service sends is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
    /// Share of the image covered by the pothole, in percent.
    pub porthole_area_percentage: Option<f64>,
}

/// Derive a verdict from a detection list.
///
/// An empty list means nothing was found. A non-empty list is a positive
/// detection whose area comes from the first entry (0.0 when absent).
pub fn verdict_from(detections: &[Detection]) -> Verdict {
    match detections.first() {
        None => Verdict::NOT_DETECTED,
        Some(first) => Verdict::detected(first.porthole_area_percentage.unwrap_or(0.0)),
    }
}
