//! Render configuration

use chrono::NaiveDate;
use serde::Serialize;

/// Fixed styling and derivation parameters for a render pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderConfig {
    /// Histogram bin count
    pub bins: usize,
    /// Evaluation points for density overlays
    pub kde_points: usize,
    /// Anchor for numeric Recency values in the monthly trend.
    /// Without it, day counts have no calendar position.
    pub recency_reference_date: Option<NaiveDate>,
    /// Marker size range for the value scatter, smallest to largest CLV
    pub scatter_size_range: (f64, f64),
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            bins: 30,
            kde_points: 200,
            recency_reference_date: None,
            scatter_size_range: (40.0, 400.0),
        }
    }
}
