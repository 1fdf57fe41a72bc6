//! Daemon error types.

use inspect_domain::{ArtifactId, CorrelationId};
use inspect_exec::ActionError;
use inspect_store::StoreError;
use thiserror::Error;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Action error
    #[error("{0}")]
    Action(#[from] ActionError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Request body is not a valid event
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(CorrelationId),

    /// Stored metric run not found
    #[error("Metric run not found: {0}")]
    MetricRunNotFound(ArtifactId),

    /// A job with this id was already submitted
    #[error("Job already submitted: {0}")]
    DuplicateJob(CorrelationId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shutdown requested
    #[error("Shutdown requested")]
    Shutdown,
}

impl DaemonError {
    /// Stable name of the error, reported alongside its message.
    pub fn kind(&self) -> &'static str {
        match self {
            DaemonError::Action(e) => e.kind(),
            DaemonError::Store(_) => "PersistenceError",
            DaemonError::InvalidEvent(_) => "InvalidEvent",
            DaemonError::JobNotFound(_) => "JobNotFound",
            DaemonError::MetricRunNotFound(_) => "MetricRunNotFound",
            DaemonError::DuplicateJob(_) => "DuplicateJob",
            DaemonError::Config(_) => "ConfigError",
            DaemonError::Shutdown => "Shutdown",
        }
    }
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
