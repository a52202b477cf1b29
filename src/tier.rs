//! Predicted CLV tiers

use serde::Serialize;
use std::fmt;

use crate::filter::FilteredView;

/// Tier boundaries; bin `i` is `[CLV_TIER_BOUNDS[i], CLV_TIER_BOUNDS[i + 1])`
pub const CLV_TIER_BOUNDS: [f64; 6] = [0.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClvTier {
    #[serde(rename = "<500")]
    Under500,
    #[serde(rename = "500-1k")]
    From500To1k,
    #[serde(rename = "1k-2k")]
    From1kTo2k,
    #[serde(rename = "2k-5k")]
    From2kTo5k,
    #[serde(rename = "5k+")]
    Over5k,
    /// Negative, NaN, or at least the top boundary
    #[serde(rename = "unclassified")]
    Unclassified,
}

impl ClvTier {
    /// Display order for tier charts
    pub const ALL: [ClvTier; 6] = [
        ClvTier::Under500,
        ClvTier::From500To1k,
        ClvTier::From1kTo2k,
        ClvTier::From2kTo5k,
        ClvTier::Over5k,
        ClvTier::Unclassified,
    ];

    pub fn classify(value: f64) -> Self {
        CLV_TIER_BOUNDS
            .windows(2)
            .zip(Self::ALL)
            .find(|(bounds, _)| value >= bounds[0] && value < bounds[1])
            .map_or(ClvTier::Unclassified, |(_, tier)| tier)
    }

    pub fn label(self) -> &'static str {
        match self {
            ClvTier::Under500 => "<500",
            ClvTier::From500To1k => "500-1k",
            ClvTier::From1kTo2k => "1k-2k",
            ClvTier::From2kTo5k => "2k-5k",
            ClvTier::Over5k => "5k+",
            ClvTier::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ClvTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Customer count per tier, in `ClvTier::ALL` order
pub fn tier_counts(view: &FilteredView) -> Vec<(ClvTier, usize)> {
    let mut counts = [0usize; ClvTier::ALL.len()];
    for record in view.rows() {
        let tier = ClvTier::classify(record.predicted_clv);
        if let Some(slot) = ClvTier::ALL.iter().position(|t| *t == tier) {
            counts[slot] += 1;
        }
    }
    ClvTier::ALL.into_iter().zip(counts).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CustomerRecord, CustomerTable, Recency};
    use crate::filter::{filter_by_segment, SegmentSelection};

    #[test]
    fn test_boundaries() {
        assert_eq!(ClvTier::classify(0.0), ClvTier::Under500);
        assert_eq!(ClvTier::classify(499.99), ClvTier::Under500);
        assert_eq!(ClvTier::classify(500.0), ClvTier::From500To1k);
        assert_eq!(ClvTier::classify(1000.0), ClvTier::From1kTo2k);
        assert_eq!(ClvTier::classify(2000.0), ClvTier::From2kTo5k);
        assert_eq!(ClvTier::classify(5000.0), ClvTier::Over5k);
        assert_eq!(ClvTier::classify(9999.99), ClvTier::Over5k);
        assert_eq!(ClvTier::classify(10000.0), ClvTier::Unclassified);
        assert_eq!(ClvTier::classify(-1.0), ClvTier::Unclassified);
        assert_eq!(ClvTier::classify(f64::NAN), ClvTier::Unclassified);
    }

    #[test]
    fn test_labels_in_display_order() {
        let labels: Vec<&str> = ClvTier::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["<500", "500-1k", "1k-2k", "2k-5k", "5k+", "unclassified"]);
        assert_eq!(
            serde_json::to_string(&ClvTier::From2kTo5k).unwrap(),
            "\"2k-5k\""
        );
    }

    #[test]
    fn test_tier_counts_total() {
        let records = [300.0, 700.0, 750.0, 12000.0, f64::NAN]
            .into_iter()
            .map(|clv| CustomerRecord {
                recency: Recency::Missing,
                frequency: 1.0,
                aov: 1.0,
                predicted_clv: clv,
                segment: "A".to_string(),
            })
            .collect();
        let table = CustomerTable::from_records(records);
        let view = filter_by_segment(&table, &SegmentSelection::all(&table));

        let counts = tier_counts(&view);
        assert_eq!(counts.len(), 6);
        assert_eq!(counts[0], (ClvTier::Under500, 1));
        assert_eq!(counts[1], (ClvTier::From500To1k, 2));
        assert_eq!(counts[5], (ClvTier::Unclassified, 2));
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<usize>(), view.len());
    }
}
