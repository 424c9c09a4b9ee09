//! Detection verdicts assigned to frames by enrichment.

use serde::Serialize;

/// The pair (detection flag, area metric) written back to a frame row.
///
/// `area_percent` is only meaningful when `detected` is true and is always
/// a finite, non-negative number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub detected: bool,
    pub area_percent: f64,
}

impl Verdict {
    /// The verdict every frame starts with.
    pub const NOT_DETECTED: Verdict = Verdict {
        detected: false,
        area_percent: 0.0,
    };

    /// A positive verdict. Negative or non-finite areas are clamped to `0.0`.
    pub fn detected(area_percent: f64) -> Self {
        let area_percent = if area_percent.is_finite() && area_percent > 0.0 {
            area_percent
        } else {
            0.0
        };
        Self {
            detected: true,
            area_percent,
        }
    }
}

impl Default for Verdict {
    fn default() -> Self {
        Self::NOT_DETECTED
    }
}
