//! Error types for the scheduler.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The state file could not be read.
    #[error("failed to read schedule state from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but does not parse.
    #[error("schedule state at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The state file could not be written.
    #[error("failed to persist schedule state to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pending entries could not be serialized.
    #[error("failed to serialize schedule state: {0}")]
    Serialize(#[from] serde_json::Error),
}
