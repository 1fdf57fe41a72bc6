//! Inspect Execution Layer
//!
//! Runs actions that turn inbound events into recorded artifacts.
//!
//! # Architecture
//!
//! ```text
//! Event → ActionRegistry → Action → Locator → Inspector → Store → ActionResult
//! ```
//!
//! # Components
//!
//! - **Ports**: Traits for the data context and computation engine
//! - **Locator**: Resolves named datasets into a request for current data
//! - **Actions**: One handler per event type, collaborators injected once
//! - **Registry**: Dispatch table from event type to action
//! - **Stub**: Test implementations for development
//!
//! # Example
//!
//! ```rust,ignore
//! use inspect_exec::{ActionRegistry, ColumnDescriptiveMetricsAction, StubBatchInspector, StubDataContext};
//! use inspect_store::MemoryStore;
//! use std::sync::Arc;
//!
//! // Create collaborators
//! let context = Arc::new(StubDataContext::new());
//! let inspector = Arc::new(StubBatchInspector::default());
//! let store = Arc::new(MemoryStore::new());
//!
//! // Build the dispatch table
//! let registry = ActionRegistry::new()
//!     .register(Arc::new(ColumnDescriptiveMetricsAction::new(context, inspector, store)));
//!
//! // Dispatch an event
//! let result = registry.dispatch(&event, &"req-123".into()).await?;
//! ```

#![warn(clippy::all)]

pub mod action;
pub mod column_metrics;
pub mod error;
pub mod locator;
pub mod ports;
pub mod registry;
pub mod stub;

// Re-exports for convenience
pub use action::Action;
pub use column_metrics::ColumnDescriptiveMetricsAction;
pub use error::{ActionError, ExecResult, ResourceLookup};
pub use locator::{ResolvedDataset, ResourceLocator};
pub use ports::{
    BatchInspectorPort, ContextError, DataAssetRef, DataContextPort, DatasourceRef, InspectorError,
};
pub use registry::ActionRegistry;
pub use stub::{StubBatchInspector, StubDataContext};
