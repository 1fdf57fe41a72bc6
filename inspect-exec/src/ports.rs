//! Execution layer port definitions.
//!
//! Ports define the interfaces for external collaborators (data context,
//! computation engine). Adapters implement these ports for specific
//! backends (stub, cloud context, etc.). The artifact store port lives in
//! `inspect-store`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use inspect_domain::{BatchRequest, DataAssetName, DatasetId, DatasourceName, MetricRun};

// =============================================================================
// Data Context Port
// =============================================================================

/// Errors reported by a data context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// No datasource with this name
    #[error("Datasource not found: {0}")]
    DatasourceNotFound(String),

    /// No asset with this name in the datasource
    #[error("Data asset not found: {asset} in datasource {datasource}")]
    AssetNotFound {
        /// Datasource that was searched
        datasource: String,
        /// Asset name that was looked up
        asset: String,
    },

    /// Malformed connection, unreachable backend, etc.
    #[error("Data context backend error: {0}")]
    Backend(String),
}

/// Port onto the externally managed data context.
///
/// These three calls are the entire surface the execution layer needs.
/// The context only resolves references; it never creates resources.
///
/// Implementations:
/// - `StubDataContext` - For testing (in-memory registrations)
#[async_trait]
pub trait DataContextPort: Send + Sync {
    /// Look up a datasource by name.
    async fn get_datasource(&self, name: &DatasourceName) -> Result<DatasourceRef, ContextError>;

    /// Look up a data asset by name within a datasource.
    async fn get_asset(
        &self,
        datasource: &DatasourceRef,
        name: &DataAssetName,
    ) -> Result<DataAssetRef, ContextError>;

    /// Build a request for the asset's current data.
    ///
    /// May differ call to call when the datasource partitions dynamically
    /// (e.g. "most recent batch").
    async fn build_batch_request(&self, asset: &DataAssetRef) -> Result<BatchRequest, ContextError>;
}

/// Resolved datasource reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceRef {
    /// Datasource name
    pub name: DatasourceName,
}

/// Resolved data asset reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAssetRef {
    /// Stable asset identifier
    pub id: DatasetId,
    /// Asset name
    pub name: DataAssetName,
    /// Datasource holding the asset
    pub datasource_name: DatasourceName,
}

// =============================================================================
// Batch Inspector Port
// =============================================================================

/// Errors reported by the computation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectorError {
    /// Computation did not finish in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Data could not be read
    #[error("Data unreachable: {0}")]
    Unreachable(String),

    /// Data has a shape the engine cannot inspect
    #[error("Unsupported data: {0}")]
    UnsupportedData(String),

    /// Any other engine failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Port onto the computation engine that produces metric runs.
///
/// A call either returns a complete artifact or fails; there are no
/// partial results.
///
/// Implementations:
/// - `StubBatchInspector` - For testing (deterministic descriptive metrics)
#[async_trait]
pub trait BatchInspectorPort: Send + Sync {
    /// Compute a metric run for one batch of one data asset.
    async fn compute_metric_run(
        &self,
        data_asset_id: &DatasetId,
        batch_request: &BatchRequest,
    ) -> Result<MetricRun, InspectorError>;
}

// =============================================================================
// Tests
// =============================================================================
