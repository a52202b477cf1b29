//! Customer table loading using Polars

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::error::LoadError;
use crate::model::{load_model, ModelHandle};

/// Columns every customer table must carry
pub const REQUIRED_COLUMNS: [&str; 5] = ["Recency", "Frequency", "AOV", "Predicted_CLV", "Segment"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Raw Recency cell.
///
/// Upstream tables carry either a day count or a last-purchase date under the
/// same column name, so both readings are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Recency {
    /// Numeric day count
    Days(f64),
    /// Calendar date (time of day dropped)
    Date(NaiveDate),
    /// Text that is neither a number nor a recognised date
    Unrecognized(String),
    /// Empty or non-finite cell
    Missing,
}

impl Recency {
    /// Classify a raw cell
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Recency::Missing;
        }

        if let Ok(days) = raw.parse::<f64>() {
            return if days.is_finite() {
                Recency::Days(days)
            } else {
                Recency::Missing
            };
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Recency::Date(dt.date_naive());
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Recency::Date(dt.date());
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return Recency::Date(date);
            }
        }

        Recency::Unrecognized(raw.to_string())
    }

    /// Numeric reading used by the histogram and correlation views.
    /// Dates map to days since the Unix epoch.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Recency::Days(days) => Some(*days),
            Recency::Date(date) => Some((*date - NaiveDate::default()).num_days() as f64),
            Recency::Unrecognized(_) | Recency::Missing => None,
        }
    }

    /// Calendar reading used by the monthly trend.
    ///
    /// Day counts only have a calendar position relative to `reference`.
    pub fn calendar_date(&self, reference: Option<NaiveDate>) -> Option<NaiveDate> {
        match self {
            Recency::Date(date) => Some(*date),
            Recency::Days(days) => {
                let reference = reference?;
                let delta = TimeDelta::try_days(days.round() as i64)?;
                reference.checked_sub_signed(delta)
            }
            Recency::Unrecognized(_) | Recency::Missing => None,
        }
    }
}

impl fmt::Display for Recency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recency::Days(days) => write!(f, "{}", days),
            Recency::Date(date) => write!(f, "{}", date),
            Recency::Unrecognized(raw) => f.write_str(raw),
            Recency::Missing => Ok(()),
        }
    }
}

/// One customer row, immutable after load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub recency: Recency,
    pub frequency: f64,
    pub aov: f64,
    pub predicted_clv: f64,
    pub segment: String,
}

/// Full customer table plus its distinct segment labels
#[derive(Debug, Clone)]
pub struct CustomerTable {
    records: Vec<CustomerRecord>,
    /// Distinct segments in first-appearance order
    segments: Vec<String>,
}

impl CustomerTable {
    pub fn from_records(records: Vec<CustomerRecord>) -> Self {
        let mut segments: Vec<String> = Vec::new();
        for record in &records {
            if !segments.contains(&record.segment) {
                segments.push(record.segment.clone());
            }
        }
        Self { records, segments }
    }

    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    /// Filter options, in the order they first appear in the file
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Stable category order for per-segment charts
    pub fn sorted_segments(&self) -> Vec<String> {
        let mut sorted = self.segments.clone();
        sorted.sort();
        sorted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Everything loaded at startup. Lives for the whole process.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub model: ModelHandle,
    pub customers: CustomerTable,
}

impl DashboardData {
    /// Load the model artifact and the customer table
    pub fn load(
        model_path: impl AsRef<Path>,
        data_path: impl AsRef<Path>,
    ) -> Result<Self, LoadError> {
        let model = load_model(model_path)?;
        let customers = load_customer_table(data_path)?;
        Ok(Self { model, customers })
    }
}

/// Load a customer table from a delimited file with a header row
///
/// All columns are read as text so Recency keeps its raw representation.
/// Extra columns are ignored. Empty numeric cells become NaN.
///
/// # Errors
/// * `LoadError::NotFound` / `LoadError::Io` if the file cannot be opened
/// * `LoadError::Csv` if the file is not valid delimited text
/// * `LoadError::MissingColumn` if a required column is absent
/// * `LoadError::InvalidValue` if a numeric column holds non-numeric text,
///   or a row has no Segment label
pub fn load_customer_table(file_path: impl AsRef<Path>) -> Result<CustomerTable, LoadError> {
    let file_path = file_path.as_ref();
    std::fs::metadata(file_path).map_err(|e| LoadError::from_io(file_path, e))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()?;

    for column in REQUIRED_COLUMNS {
        if df.get_column_index(column).is_none() {
            return Err(LoadError::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    let recency = text_cells(&df, "Recency")?;
    let frequency = numeric_cells(&df, "Frequency")?;
    let aov = numeric_cells(&df, "AOV")?;
    let predicted_clv = numeric_cells(&df, "Predicted_CLV")?;
    let segment = label_cells(&df, "Segment")?;

    let records: Vec<CustomerRecord> = (0..df.height())
        .map(|i| CustomerRecord {
            recency: recency[i].as_deref().map_or(Recency::Missing, Recency::parse),
            frequency: frequency[i],
            aov: aov[i],
            predicted_clv: predicted_clv[i],
            segment: segment[i].clone(),
        })
        .collect();

    let table = CustomerTable::from_records(records);
    log::info!(
        "loaded {} customers across {} segments from {}",
        table.len(),
        table.segments().len(),
        file_path.display()
    );

    Ok(table)
}

fn text_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, LoadError> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|cell| cell.map(str::to_owned))
        .collect())
}

/// Trimmed labels; a missing or blank cell is rejected
fn label_cells(df: &DataFrame, name: &str) -> Result<Vec<String>, LoadError> {
    text_cells(df, name)?
        .into_iter()
        .enumerate()
        .map(|(i, cell)| {
            let label = cell.as_deref().map(str::trim).unwrap_or_default();
            if label.is_empty() {
                return Err(LoadError::InvalidValue {
                    column: name.to_string(),
                    row: i + 1,
                    value: cell.unwrap_or_default(),
                });
            }
            Ok(label.to_string())
        })
        .collect()
}

fn numeric_cells(df: &DataFrame, name: &str) -> Result<Vec<f64>, LoadError> {
    text_cells(df, name)?
        .into_iter()
        .enumerate()
        .map(|(i, cell)| {
            let raw = cell.as_deref().map(str::trim).unwrap_or_default();
            if raw.is_empty() {
                return Ok(f64::NAN);
            }
            raw.parse::<f64>().map_err(|_| LoadError::InvalidValue {
                column: name.to_string(),
                row: i + 1,
                value: raw.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_load_customer_table() {
        let file = create_test_csv(
            "CustomerID,Recency,Frequency,AOV,Predicted_CLV,Segment\n\
             17850,10,2,50.0,300.0,Loyal\n\
             13047,2011-11-03,1,800,1200.5,At Risk\n\
             12345,,4,,5100,Loyal\n",
        );

        let table = load_customer_table(file.path()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.segments(), &["Loyal".to_string(), "At Risk".to_string()]);
        assert_eq!(table.sorted_segments(), vec!["At Risk".to_string(), "Loyal".to_string()]);

        let records = table.records();
        assert_eq!(records[0].recency, Recency::Days(10.0));
        assert_eq!(
            records[1].recency,
            Recency::Date(NaiveDate::from_ymd_opt(2011, 11, 3).unwrap())
        );
        assert_eq!(records[1].predicted_clv, 1200.5);
        assert_eq!(records[2].recency, Recency::Missing);
        assert!(records[2].aov.is_nan());
    }

    #[test]
    fn test_header_only_table() {
        let file = create_test_csv("Recency,Frequency,AOV,Predicted_CLV,Segment\n");
        let table = load_customer_table(file.path()).unwrap();
        assert!(table.is_empty());
        assert!(table.segments().is_empty());
    }

    #[test]
    fn test_missing_column() {
        let file = create_test_csv("Recency,Frequency,AOV,Segment\n10,2,50,A\n");
        let result = load_customer_table(file.path());
        match result {
            Err(LoadError::MissingColumn { column }) => assert_eq!(column, "Predicted_CLV"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_numeric_value() {
        let file = create_test_csv(
            "Recency,Frequency,AOV,Predicted_CLV,Segment\n10,2,50,300,A\n20,lots,80,900,B\n",
        );
        match load_customer_table(file.path()) {
            Err(LoadError::InvalidValue { column, row, value }) => {
                assert_eq!(column, "Frequency");
                assert_eq!(row, 2);
                assert_eq!(value, "lots");
            }
            other => panic!("expected invalid value, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_segment_rejected() {
        let file = create_test_csv(
            "Recency,Frequency,AOV,Predicted_CLV,Segment\n10,2,50,300,A\n20,1,800,900,  \n",
        );
        match load_customer_table(file.path()) {
            Err(LoadError::InvalidValue { column, row, .. }) => {
                assert_eq!(column, "Segment");
                assert_eq!(row, 2);
            }
            other => panic!("expected invalid segment, got {:?}", other),
        }
    }

    #[test]
    fn test_short_row_rejected() {
        let file = create_test_csv(
            "Recency,Frequency,AOV,Predicted_CLV,Segment\n10,2,50,300,A\n20,1,800\n",
        );
        match load_customer_table(file.path()) {
            Err(LoadError::InvalidValue { column, row, value }) => {
                assert_eq!(column, "Segment");
                assert_eq!(row, 2);
                assert_eq!(value, "");
            }
            other => panic!("expected invalid segment, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_csv() {
        let file = create_test_csv(
            "Recency,Frequency,AOV,Predicted_CLV,Segment\n10,2,50,300,A\n20,1,800,900,B,extra\n",
        );
        let result = load_customer_table(file.path());
        assert!(matches!(result, Err(LoadError::Csv(_))), "got {:?}", result);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_customer_table(dir.path().join("predicted_clv.csv"));
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[test]
    fn test_recency_parse() {
        assert_eq!(Recency::parse(" 42 "), Recency::Days(42.0));
        assert_eq!(Recency::parse(""), Recency::Missing);
        assert_eq!(Recency::parse("nan"), Recency::Missing);
        let date = NaiveDate::from_ymd_opt(2011, 12, 9).unwrap();
        assert_eq!(Recency::parse("2011-12-09"), Recency::Date(date));
        assert_eq!(Recency::parse("2011-12-09 08:26:00"), Recency::Date(date));
        assert_eq!(Recency::parse("2011-12-09T08:26:00Z"), Recency::Date(date));
        assert_eq!(
            Recency::parse("last tuesday"),
            Recency::Unrecognized("last tuesday".to_string())
        );
    }

    #[test]
    fn test_recency_readings() {
        let reference = NaiveDate::from_ymd_opt(2011, 12, 9).unwrap();

        let days = Recency::Days(9.0);
        assert_eq!(days.as_number(), Some(9.0));
        assert_eq!(days.calendar_date(None), None);
        assert_eq!(
            days.calendar_date(Some(reference)),
            NaiveDate::from_ymd_opt(2011, 11, 30)
        );

        let date = Recency::Date(NaiveDate::from_ymd_opt(1970, 1, 11).unwrap());
        assert_eq!(date.as_number(), Some(10.0));
        assert_eq!(date.calendar_date(None), NaiveDate::from_ymd_opt(1970, 1, 11));

        assert_eq!(Recency::Missing.as_number(), None);
        assert_eq!(Recency::Missing.calendar_date(Some(reference)), None);
    }
}
