//! Inspect Domain Layer
//!
//! Pure domain types with zero I/O dependencies.
//! Contains inbound events, resource names and identifiers, the
//! metric-run artifact, and the result envelope returned by actions.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod events;
pub mod metrics;
pub mod result;
pub mod value_objects;

// Re-export commonly used types
pub use events::{Event, EventType, RunColumnDescriptiveMetricsEvent};
pub use metrics::{
    BatchRequest, Metric, MetricException, MetricRun, MetricValue, BATCH_ID_OPTION,
};
pub use result::{ActionResult, CreatedResource, ResourceKind};
pub use value_objects::{
    ArtifactId, CorrelationId, DataAssetName, DatasetId, DatasourceName, DomainError,
};
