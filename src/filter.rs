//! Segment multi-select filtering

use serde::Serialize;
use std::collections::BTreeSet;

use crate::data::{CustomerRecord, CustomerTable};

/// Set of selected segment labels. Ordering and duplicates in the input are irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SegmentSelection(BTreeSet<String>);

impl SegmentSelection {
    /// Default selection: every segment present in the table
    pub fn all(table: &CustomerTable) -> Self {
        Self::from_labels(table.segments())
    }

    /// Empty selection
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(labels.into_iter().map(|s| s.as_ref().trim().to_string()).collect())
    }

    /// Parse a comma-separated selection typed by the user.
    ///
    /// `*` selects every segment of `table`; blank input selects nothing.
    pub fn parse(input: &str, table: &CustomerTable) -> Self {
        let input = input.trim();
        if input == "*" {
            return Self::all(table);
        }
        Self::from_labels(input.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn contains(&self, segment: &str) -> bool {
        self.0.contains(segment)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Selected labels that do not occur in `table`
    pub fn unknown_labels<'a>(&'a self, table: &CustomerTable) -> Vec<&'a str> {
        self.labels()
            .filter(|label| !table.segments().iter().any(|s| s.as_str() == *label))
            .collect()
    }
}

/// Rows of the full table whose segment is selected, in source order.
///
/// Built fresh for every render pass; every view of one pass reads the same view.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    rows: Vec<&'a CustomerRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn rows(&self) -> &[&'a CustomerRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finite values of one numeric field
    pub fn finite_values(&self, field: impl Fn(&CustomerRecord) -> f64) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| field(r))
            .filter(|v| v.is_finite())
            .collect()
    }
}

/// Keep the rows whose segment is in `selection`
pub fn filter_by_segment<'a>(
    table: &'a CustomerTable,
    selection: &SegmentSelection,
) -> FilteredView<'a> {
    let rows = table
        .records()
        .iter()
        .filter(|record| selection.contains(&record.segment))
        .collect();
    FilteredView { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Recency;

    fn record(segment: &str, clv: f64) -> CustomerRecord {
        CustomerRecord {
            recency: Recency::Days(1.0),
            frequency: 1.0,
            aov: 10.0,
            predicted_clv: clv,
            segment: segment.to_string(),
        }
    }

    fn create_test_table() -> CustomerTable {
        CustomerTable::from_records(vec![
            record("B", 1.0),
            record("A", 2.0),
            record("C", 3.0),
            record("A", 4.0),
            record("B", 5.0),
        ])
    }

    fn clvs(view: &FilteredView) -> Vec<f64> {
        view.rows().iter().map(|r| r.predicted_clv).collect()
    }

    #[test]
    fn test_filter_keeps_source_order() {
        let table = create_test_table();
        let view = filter_by_segment(&table, &SegmentSelection::from_labels(["A", "B"]));
        assert_eq!(clvs(&view), vec![1.0, 2.0, 4.0, 5.0]);
        assert!(view.rows().iter().all(|r| r.segment != "C"));
    }

    #[test]
    fn test_filter_order_independent() {
        let table = create_test_table();
        let ab = filter_by_segment(&table, &SegmentSelection::from_labels(["A", "B"]));
        let ba = filter_by_segment(&table, &SegmentSelection::from_labels(["B", "A", "B"]));
        assert_eq!(clvs(&ab), clvs(&ba));
    }

    #[test]
    fn test_all_and_none() {
        let table = create_test_table();
        let all = filter_by_segment(&table, &SegmentSelection::all(&table));
        assert_eq!(all.len(), table.len());

        let none = filter_by_segment(&table, &SegmentSelection::none());
        assert!(none.is_empty());
    }

    #[test]
    fn test_parse_selection() {
        let table = create_test_table();
        assert_eq!(SegmentSelection::parse("*", &table), SegmentSelection::all(&table));
        assert_eq!(SegmentSelection::parse("  ", &table), SegmentSelection::none());
        assert_eq!(
            SegmentSelection::parse("B, A,,A", &table),
            SegmentSelection::from_labels(["A", "B"])
        );
    }

    #[test]
    fn test_unknown_labels() {
        let table = create_test_table();
        let selection = SegmentSelection::from_labels(["A", "Z"]);
        assert_eq!(selection.unknown_labels(&table), vec!["Z"]);
        assert_eq!(filter_by_segment(&table, &selection).len(), 2);
    }
}
