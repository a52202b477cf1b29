//! CLV Dashboard: customer lifetime value reporting over precomputed RFM features
//!
//! The table of Recency, Frequency, AOV, model-predicted CLV and segment labels
//! is produced upstream together with the trained model. This library loads
//! both once, filters the table by segment and derives every dashboard view
//! through the pure [`render`] function; [`viz`] draws the result.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod model;
pub mod stats;
pub mod tier;
pub mod trend;
pub mod view;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use config::RenderConfig;
pub use data::{load_customer_table, CustomerRecord, CustomerTable, DashboardData, Recency};
pub use error::LoadError;
pub use filter::{filter_by_segment, FilteredView, SegmentSelection};
pub use metrics::SummaryMetrics;
pub use model::{load_model, ModelHandle};
pub use tier::ClvTier;
pub use trend::{monthly_segment_trend, MonthlyTrend};
pub use view::{render, ViewModel};
pub use viz::draw_dashboard;

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
