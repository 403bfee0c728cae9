//! Error types for the simulator.

use satnet_core::CoreError;
use satnet_env::EnvError;
use std::path::PathBuf;
use thiserror::Error;

/// Problems with the configuration, detected before the run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    
    /// Config file is not valid JSON or misses a required key
    #[error("Invalid configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    
    /// A field has an unusable value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
    
    /// Observer file is missing
    #[error("Observer config file not found: {0}")]
    MissingObserverFile(PathBuf),
    
    /// Observer file header is unreadable
    #[error("Malformed observer file {path}: {reason}")]
    ObserverFile { path: PathBuf, reason: String },
    
    /// Algorithm id or domain partition rejected
    #[error(transparent)]
    Algorithm(#[from] CoreError),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    
    #[error("Data source error: {0}")]
    Env(#[from] EnvError),
    
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
    
    /// The data source returned the wrong number of satellites
    #[error("Snapshot at t={time} has {found} satellites, expected {expected}")]
    SnapshotSize {
        time: u64,
        found: usize,
        expected: usize,
    },
    
    /// Writing a report, RIB or frame failed
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    
    /// Frame serialization failed
    #[error("Failed to serialize frame: {0}")]
    Serialize(#[from] serde_json::Error),
    
    /// Worker pool could not be started
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl SimError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
