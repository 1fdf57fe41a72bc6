//! Inspect Storage Layer
//!
//! Persists metric-run artifacts and hands back their identifiers.
//!
//! # Architecture
//!
//! - **Repository trait**: Defines the artifact store interface (port)
//! - **In-memory store**: Thread-safe implementation for tests and development
//!
//! # Usage
//!
//! ```rust
//! use inspect_domain::{BatchRequest, DataAssetName, DatasetId, DatasourceName, Metric, MetricRun, MetricValue};
//! use inspect_store::{MemoryStore, MetricRunRepository};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!
//!     let request = BatchRequest::new(
//!         DatasourceName::new("sales_db").unwrap(),
//!         DataAssetName::new("orders").unwrap(),
//!     );
//!     let run = MetricRun::new(
//!         DatasetId::new("orders-uuid"),
//!         request,
//!         vec![Metric::table("b1", "table.row_count", MetricValue::Null)],
//!     );
//!
//!     let id = store.add_metric_run(run).await.unwrap();
//!     let stored = store.find_by_id(&id).await.unwrap();
//!     assert!(stored.is_some());
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod error;
mod memory;
mod repository;

// Re-exports
pub use error::StoreError;
pub use memory::MemoryStore;
pub use repository::{MetricRunRepository, StoredMetricRun};
