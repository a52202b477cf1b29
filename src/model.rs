//! Opaque handle to the trained CLV model artifact
//!
//! The model is produced and serialized by the external training pipeline.
//! The dashboard only requires that it exists and can be read; predictions
//! are already materialized in the `Predicted_CLV` column.

use crate::error::LoadError;
use std::path::{Path, PathBuf};

/// Loaded model artifact bytes
#[derive(Debug, Clone)]
pub struct ModelHandle {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl ModelHandle {
    /// Path the artifact was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the serialized artifact in bytes
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Read the model artifact at `path`
///
/// # Errors
/// * `LoadError::NotFound` if the file does not exist
/// * `LoadError::Io` if it cannot be read
/// * `LoadError::EmptyModel` if it has no content
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelHandle, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| LoadError::from_io(path, e))?;

    if bytes.is_empty() {
        return Err(LoadError::EmptyModel {
            path: path.to_path_buf(),
        });
    }

    log::debug!("loaded model artifact {} ({} bytes)", path.display(), bytes.len());

    Ok(ModelHandle {
        path: path.to_path_buf(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_model() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\x80\x04opaque-model").unwrap();

        let model = load_model(file.path()).unwrap();
        assert_eq!(model.size_bytes(), 14);
        assert_eq!(model.path(), file.path());
    }

    #[test]
    fn test_empty_model_rejected() {
        let file = NamedTempFile::new().unwrap();
        let result = load_model(file.path());
        assert!(matches!(result, Err(LoadError::EmptyModel { .. })));
    }

    #[test]
    fn test_missing_model_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_model(dir.path().join("CLV_model.pkl"));
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }
}
