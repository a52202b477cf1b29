//! Startup error taxonomy

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to load the model artifact or the customer table.
///
/// Every variant is fatal: the dashboard is never drawn from partial inputs.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] polars::prelude::PolarsError),

    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("invalid value {value:?} in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("model artifact {} is empty", path.display())]
    EmptyModel { path: PathBuf },
}

impl LoadError {
    pub(crate) fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_not_found() {
        let err = LoadError::from_io(
            Path::new("nowhere.csv"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(err.to_string(), "input file not found: nowhere.csv");

        let err = LoadError::from_io(
            Path::new("locked.csv"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
