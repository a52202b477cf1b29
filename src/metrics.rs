//! Headline summary metrics

use serde::Serialize;
use std::fmt;

use crate::filter::FilteredView;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Count, mean and max of Predicted_CLV over the filtered rows.
///
/// `avg_clv` and `max_clv` are `None` when no row has a finite prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub count: usize,
    pub avg_clv: Option<f64>,
    pub max_clv: Option<f64>,
}

impl SummaryMetrics {
    pub fn compute(view: &FilteredView) -> Self {
        let values = view.finite_values(|r| r.predicted_clv);

        let (avg_clv, max_clv) = if values.is_empty() {
            (None, None)
        } else {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (Some(round2(mean)), Some(round2(max)))
        };

        Self {
            count: view.len(),
            avg_clv,
            max_clv,
        }
    }
}

/// Metric value as shown to the user: two decimals, or `N/A`
pub struct MetricDisplay(pub Option<f64>);

impl fmt::Display for MetricDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{:.2}", value),
            None => f.write_str("N/A"),
        }
    }
}

impl fmt::Display for SummaryMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total Customers: {} | Avg Predicted CLV: {} | Max Predicted CLV: {}",
            self.count,
            MetricDisplay(self.avg_clv),
            MetricDisplay(self.max_clv)
        )
    }
}
