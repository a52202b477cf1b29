//! Monthly CLV trend per segment

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::filter::FilteredView;

/// Mean Predicted_CLV for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Last day of the month
    pub month_end: NaiveDate,
    pub mean_clv: f64,
    pub customers: usize,
}

/// Time-ordered monthly means for one segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub segment: String,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// One series per segment, sorted by segment label
    pub series: Vec<TrendSeries>,
    /// Rows without a calendar Recency or a finite prediction
    pub excluded_rows: usize,
}

impl MonthlyTrend {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Last calendar day of the month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// Group rows by (month end, segment) and average Predicted_CLV.
///
/// Rows whose Recency has no calendar reading are left out of this derivation
/// only; `reference` anchors numeric day counts to a date.
pub fn monthly_segment_trend(view: &FilteredView, reference: Option<NaiveDate>) -> MonthlyTrend {
    let mut groups: BTreeMap<&str, BTreeMap<NaiveDate, (f64, usize)>> = BTreeMap::new();
    let mut excluded_rows = 0;

    for record in view.rows() {
        let date = match record.recency.calendar_date(reference) {
            Some(date) if record.predicted_clv.is_finite() => date,
            _ => {
                excluded_rows += 1;
                continue;
            }
        };

        let slot = groups
            .entry(record.segment.as_str())
            .or_default()
            .entry(month_end(date))
            .or_insert((0.0, 0));
        slot.0 += record.predicted_clv;
        slot.1 += 1;
    }

    if excluded_rows > 0 {
        log::debug!("monthly trend: excluded {} rows without a calendar Recency", excluded_rows);
    }

    let series = groups
        .into_iter()
        .map(|(segment, months)| TrendSeries {
            segment: segment.to_string(),
            points: months
                .into_iter()
                .map(|(month_end, (sum, customers))| TrendPoint {
                    month_end,
                    mean_clv: sum / customers as f64,
                    customers,
                })
                .collect(),
        })
        .collect();

    MonthlyTrend {
        series,
        excluded_rows,
    }
}
