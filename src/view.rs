//! View model for one dashboard render pass
//!
//! `render` is a pure function of the loaded table, the segment selection and
//! the render configuration. Every view in a pass reads the same filtered rows.

use ndarray::Array2;
use serde::Serialize;

use crate::config::RenderConfig;
use crate::data::{CustomerRecord, CustomerTable, Recency};
use crate::filter::{filter_by_segment, FilteredView, SegmentSelection};
use crate::metrics::SummaryMetrics;
use crate::stats::{correlation_matrix, gaussian_kde, histogram, Histogram};
use crate::tier::{tier_counts, ClvTier};
use crate::trend::{monthly_segment_trend, MonthlyTrend};

/// Columns of the correlation heatmap, in display order
pub const CORRELATION_FIELDS: [&str; 4] = ["Recency", "Frequency", "AOV", "Predicted_CLV"];

/// Histogram with a density overlay scaled to the count axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramView {
    pub title: String,
    pub field: String,
    pub histogram: Option<Histogram>,
    pub kde: Vec<(f64, f64)>,
}

impl HistogramView {
    fn build(title: &str, field: &str, values: &[f64], config: &RenderConfig) -> Self {
        let histogram = histogram(values, config.bins);
        let kde = histogram
            .as_ref()
            .and_then(|hist| {
                let (lo, hi) = hist.range();
                let scale = values.len() as f64 * hist.bin_width();
                gaussian_kde(values, config.kde_points, lo, hi)
                    .map(|curve| curve.into_iter().map(|(x, d)| (x, d * scale)).collect())
            })
            .unwrap_or_default();

        Self {
            title: title.to_string(),
            field: field.to_string(),
            histogram,
            kde,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Bar chart of counts over a fixed category order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCountsView {
    pub title: String,
    pub categories: Vec<CategoryCount>,
}

impl CategoryCountsView {
    pub fn total(&self) -> usize {
        self.categories.iter().map(|c| c.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn max_count(&self) -> usize {
        self.categories.iter().map(|c| c.count).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationView {
    pub title: String,
    pub labels: Vec<String>,
    /// Row-major coefficients; `None` where undefined
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationView {
    pub fn is_empty(&self) -> bool {
        self.values.iter().flatten().all(Option::is_none)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub frequency: f64,
    pub aov: f64,
    pub predicted_clv: f64,
    /// Marker size mapped from Predicted_CLV
    pub size: f64,
    pub segment: String,
    /// Index of the segment in the full sorted segment list
    pub color_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterView {
    pub title: String,
    pub points: Vec<ScatterPoint>,
    /// Legend entries: every segment of the full table
    pub segments: Vec<String>,
}

impl ScatterView {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendView {
    pub title: String,
    pub trend: MonthlyTrend,
    /// X tick label rotation in degrees
    pub label_rotation: f64,
}

/// One row of the raw table, re-indexed from zero
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub index: usize,
    pub recency: Recency,
    pub frequency: f64,
    pub aov: f64,
    pub predicted_clv: f64,
    pub segment: String,
    pub clv_tier: ClvTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// Everything one dashboard pass shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub available_segments: Vec<String>,
    pub selected_segments: SegmentSelection,
    pub metrics: SummaryMetrics,
    pub recency_hist: HistogramView,
    pub frequency_hist: HistogramView,
    pub segment_counts: CategoryCountsView,
    pub scatter: ScatterView,
    pub aov_hist: HistogramView,
    pub clv_hist: HistogramView,
    pub correlation: CorrelationView,
    pub tier_counts: CategoryCountsView,
    pub trend: TrendView,
    pub table: TableView,
}

/// Build the view model for `selection` over `table`
pub fn render(
    table: &CustomerTable,
    selection: &SegmentSelection,
    config: &RenderConfig,
) -> ViewModel {
    let view = filter_by_segment(table, selection);
    let sorted_segments = table.sorted_segments();
    log::debug!("render pass: {} of {} rows selected", view.len(), table.len());

    let recency: Vec<f64> = view
        .rows()
        .iter()
        .filter_map(|r| r.recency.as_number())
        .collect();

    ViewModel {
        available_segments: table.segments().to_vec(),
        selected_segments: selection.clone(),
        metrics: SummaryMetrics::compute(&view),
        recency_hist: HistogramView::build("Distribution: Recency", "Recency", &recency, config),
        frequency_hist: HistogramView::build(
            "Distribution: Frequency",
            "Frequency",
            &view.finite_values(|r| r.frequency),
            config,
        ),
        segment_counts: segment_counts(&view, &sorted_segments),
        scatter: scatter(&view, &sorted_segments, config),
        aov_hist: HistogramView::build(
            "Distribution: AOV",
            "AOV",
            &view.finite_values(|r| r.aov),
            config,
        ),
        clv_hist: HistogramView::build(
            "Distribution: Predicted CLV",
            "Predicted_CLV",
            &view.finite_values(|r| r.predicted_clv),
            config,
        ),
        correlation: correlation(&view),
        tier_counts: CategoryCountsView {
            title: "Customers by Predicted CLV Tier".to_string(),
            categories: tier_counts(&view)
                .into_iter()
                .map(|(tier, count)| CategoryCount {
                    label: tier.label().to_string(),
                    count,
                })
                .collect(),
        },
        trend: TrendView {
            title: "Segment-wise CLV Trend Over Time".to_string(),
            trend: monthly_segment_trend(&view, config.recency_reference_date),
            label_rotation: 90.0,
        },
        table: table_view(&view),
    }
}

fn segment_counts(view: &FilteredView, sorted_segments: &[String]) -> CategoryCountsView {
    let categories = sorted_segments
        .iter()
        .map(|segment| CategoryCount {
            label: segment.clone(),
            count: view.rows().iter().filter(|r| &r.segment == segment).count(),
        })
        .collect();

    CategoryCountsView {
        title: "Customers by Segment".to_string(),
        categories,
    }
}

fn scatter(view: &FilteredView, sorted_segments: &[String], config: &RenderConfig) -> ScatterView {
    let plotted: Vec<&CustomerRecord> = view
        .rows()
        .iter()
        .copied()
        .filter(|r| r.frequency.is_finite() && r.aov.is_finite() && r.predicted_clv.is_finite())
        .collect();

    let clv_min = plotted.iter().map(|r| r.predicted_clv).fold(f64::INFINITY, f64::min);
    let clv_max = plotted.iter().map(|r| r.predicted_clv).fold(f64::NEG_INFINITY, f64::max);
    let (size_min, size_max) = config.scatter_size_range;

    let points = plotted
        .into_iter()
        .map(|r| {
            let size = if clv_max > clv_min {
                size_min + (r.predicted_clv - clv_min) / (clv_max - clv_min) * (size_max - size_min)
            } else {
                (size_min + size_max) / 2.0
            };
            ScatterPoint {
                frequency: r.frequency,
                aov: r.aov,
                predicted_clv: r.predicted_clv,
                size,
                segment: r.segment.clone(),
                color_index: sorted_segments
                    .iter()
                    .position(|s| s == &r.segment)
                    .unwrap_or(0),
            }
        })
        .collect();

    ScatterView {
        title: "Customer Value Segmentation".to_string(),
        points,
        segments: sorted_segments.to_vec(),
    }
}

fn correlation(view: &FilteredView) -> CorrelationView {
    let mut data = Array2::from_elem((view.len(), CORRELATION_FIELDS.len()), f64::NAN);
    for (i, record) in view.rows().iter().enumerate() {
        data[[i, 0]] = record.recency.as_number().unwrap_or(f64::NAN);
        data[[i, 1]] = record.frequency;
        data[[i, 2]] = record.aov;
        data[[i, 3]] = record.predicted_clv;
    }

    let corr = correlation_matrix(&data);
    let values = corr
        .outer_iter()
        .map(|row| {
            row.iter()
                .map(|&r| if r.is_finite() { Some(r) } else { None })
                .collect()
        })
        .collect();

    CorrelationView {
        title: "Correlation Matrix".to_string(),
        labels: CORRELATION_FIELDS.iter().map(|s| s.to_string()).collect(),
        values,
    }
}

fn table_view(view: &FilteredView) -> TableView {
    let rows = view
        .rows()
        .iter()
        .enumerate()
        .map(|(index, r)| TableRow {
            index,
            recency: r.recency.clone(),
            frequency: r.frequency,
            aov: r.aov,
            predicted_clv: r.predicted_clv,
            segment: r.segment.clone(),
            clv_tier: ClvTier::classify(r.predicted_clv),
        })
        .collect();

    TableView {
        columns: ["Recency", "Frequency", "AOV", "Predicted_CLV", "Segment", "CLV_Tier"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rows,
    }
}
