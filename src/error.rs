use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnapError>;

/// Fatal failures of an export run. Unreadable source files are not errors;
/// they end up in `ExportReport::skipped`.
#[derive(Error, Debug)]
pub enum SnapError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Snapshot root not found: {path}")]
    RootNotFound { path: PathBuf },
}

impl SnapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapError::Io {
            path: path.into(),
            source,
        }
    }
}
