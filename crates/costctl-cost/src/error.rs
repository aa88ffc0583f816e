//! Error types for the ingestion and aggregation pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Ingestion and reporting errors.
///
/// Only [`CostError::AgentsDirUnreadable`] aborts a walk. The agent and
/// session variants are logged by the walker and the affected unit skipped.
#[derive(Error, Debug)]
pub enum CostError {
    /// The top-level `agents/` directory could not be listed
    #[error("reading agents dir {path}: {source}")]
    AgentsDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An agent's `sessions/` directory exists but could not be listed
    #[error("reading sessions dir {path}: {source}")]
    SessionsDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A session file could not be opened
    #[error("opening session file {path}: {source}")]
    SessionOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A session file failed while being read
    #[error("reading session file {path}: {source}")]
    SessionRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A parallel parse task could not complete
    #[error("session parse task failed: {0}")]
    Task(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Report formatting error
    #[error("formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

impl CostError {
    /// Returns true if this error aborts a whole run rather than a single unit.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, CostError::AgentsDirUnreadable { .. })
    }
}

/// Result type for cost pipeline operations.
pub type Result<T> = std::result::Result<T, CostError>;
