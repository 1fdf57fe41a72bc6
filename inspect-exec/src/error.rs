//! Execution layer error types.

use inspect_domain::EventType;
use inspect_store::StoreError;
use std::fmt;
use thiserror::Error;

use crate::ports::InspectorError;

/// Which lookup failed when a resource could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLookup {
    /// Datasource lookup by name
    Datasource,
    /// Data asset lookup within a datasource
    DataAsset,
}

impl fmt::Display for ResourceLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLookup::Datasource => write!(f, "datasource"),
            ResourceLookup::DataAsset => write!(f, "data asset"),
        }
    }
}

/// Errors that can occur while running an action.
///
/// Every stage of an action maps onto exactly one variant; none of them
/// is retried at this layer.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Named datasource or data asset is not registered
    #[error("Resource not found: {resource} '{name}'")]
    ResourceNotFound {
        /// What kind of lookup failed
        resource: ResourceLookup,
        /// Name that was looked up
        name: String,
    },

    /// Backend failure while resolving a dataset or building its request
    #[error("Resource resolution failed: {0}")]
    ResourceResolution(String),

    /// Computation engine failure
    #[error("Computation failed: {0}")]
    Computation(#[from] InspectorError),

    /// Artifact store failure
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),

    /// No action is registered for the event type
    #[error("No action registered for event type {0}")]
    UnknownEvent(String),

    /// Action was handed an event of another type
    #[error("Unexpected event: expected {expected}, got {actual}")]
    UnexpectedEvent {
        /// Type the action handles
        expected: EventType,
        /// Type it received
        actual: EventType,
    },
}

impl ActionError {
    /// Create a not found error
    pub fn not_found(resource: ResourceLookup, name: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource,
            name: name.into(),
        }
    }

    /// Stable taxonomy name of this error, for status reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::ResourceNotFound { .. } => "ResourceNotFound",
            ActionError::ResourceResolution(_) => "ResourceResolutionError",
            ActionError::Computation(_) => "ComputationError",
            ActionError::Persistence(_) => "PersistenceError",
            ActionError::UnknownEvent(_) => "UnknownEvent",
            ActionError::UnexpectedEvent { .. } => "UnexpectedEvent",
        }
    }
}

/// Result type for execution operations.
pub type ExecResult<T> = Result<T, ActionError>;
