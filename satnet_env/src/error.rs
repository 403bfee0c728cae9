//! Error types for the satnet data-source layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading constellation data.
#[derive(Debug, Error)]
pub enum EnvError {
    /// A snapshot file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    
    /// A snapshot file has the wrong number of rows or columns
    #[error("Malformed snapshot {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
    
    /// No data is available for the requested instant
    #[error("No snapshot for time {0}")]
    MissingSnapshot(u64),
}

impl EnvError {
    /// Creates an I/O error tagged with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
    
    /// Creates a malformed-file error.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
