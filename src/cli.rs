//! Command-line interface definitions and argument parsing

use chrono::NaiveDate;
use clap::Parser;

use crate::config::RenderConfig;

/// Customer lifetime value dashboard over precomputed RFM features
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the customer table (CSV with Recency, Frequency, AOV, Predicted_CLV, Segment)
    #[arg(short, long, default_value = "predicted_clv.csv")]
    pub data: String,

    /// Path to the trained CLV model artifact
    #[arg(short, long, default_value = "CLV_model.pkl")]
    pub model: String,

    /// Output path for the dashboard image
    #[arg(short, long, default_value = "clv_dashboard.png")]
    pub output: String,

    /// Segments to include, comma-separated; "*" or omitted selects all, "" selects none
    /// Example: --segments "Loyal,At Risk"
    #[arg(short, long)]
    pub segments: Option<String>,

    /// Number of histogram bins
    #[arg(long, default_value = "30")]
    pub bins: usize,

    /// Date that numeric Recency day counts are measured back from (YYYY-MM-DD),
    /// used to place them on the monthly trend
    #[arg(long)]
    pub recency_reference_date: Option<String>,

    /// Also write the rendered view model as JSON to this path
    #[arg(long)]
    pub json: Option<String>,

    /// Print the filtered customer table
    #[arg(long)]
    pub show_table: bool,

    /// Read segment selections from stdin and re-render after each line
    #[arg(short, long)]
    pub interactive: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the Recency reference date
    /// Expected format: "YYYY-MM-DD"
    pub fn parse_reference_date(&self) -> crate::Result<Option<NaiveDate>> {
        match self.recency_reference_date {
            Some(ref raw) => {
                let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                    anyhow::anyhow!("Invalid reference date '{}', expected YYYY-MM-DD", raw)
                })?;
                Ok(Some(date))
            }
            None => Ok(None),
        }
    }

    /// Build the render configuration from the flags
    pub fn render_config(&self) -> crate::Result<RenderConfig> {
        if self.bins == 0 {
            anyhow::bail!("Number of bins must be at least 1");
        }

        Ok(RenderConfig {
            bins: self.bins,
            recency_reference_date: self.parse_reference_date()?,
            ..RenderConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args::parse_from(["clv-dashboard"])
    }

    #[test]
    fn test_defaults() {
        let args = args();
        assert_eq!(args.data, "predicted_clv.csv");
        assert_eq!(args.model, "CLV_model.pkl");
        assert_eq!(args.segments, None);
        assert_eq!(args.render_config().unwrap(), RenderConfig::default());
    }

    #[test]
    fn test_parse_reference_date() {
        let mut args = args();
        args.recency_reference_date = Some("2011-12-09".to_string());
        assert_eq!(
            args.parse_reference_date().unwrap(),
            NaiveDate::from_ymd_opt(2011, 12, 9)
        );

        args.recency_reference_date = Some("09/12/2011".to_string());
        assert!(args.parse_reference_date().is_err());
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "clv-dashboard",
            "--segments",
            "Loyal,At Risk",
            "--bins",
            "10",
            "--show-table",
        ]);
        assert_eq!(args.segments.as_deref(), Some("Loyal,At Risk"));
        assert!(args.show_table);
        assert_eq!(args.render_config().unwrap().bins, 10);

        let mut args = args;
        args.bins = 0;
        assert!(args.render_config().is_err());
    }
}
