//! Repository trait definitions (Ports)
//!
//! These traits define the artifact store interface.
//! Implementations can be a database, the in-memory store, or a test double.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use inspect_domain::{ArtifactId, DatasetId, MetricRun};
use serde::{Deserialize, Serialize};

/// A metric run together with the id it was stored under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMetricRun {
    /// Identifier assigned on persist
    pub id: ArtifactId,
    /// The persisted artifact
    pub run: MetricRun,
    /// When the artifact was persisted
    pub stored_at: DateTime<Utc>,
}

/// Repository for metric-run artifacts
#[async_trait]
pub trait MetricRunRepository: Send + Sync {
    /// Persist a metric run and return its new identifier.
    ///
    /// Ownership of the run moves into the store. Every successful call
    /// yields a new identifier; callers must not rely on deduplication.
    async fn add_metric_run(&self, run: MetricRun) -> Result<ArtifactId, StoreError>;

    /// Find a metric run by ID
    async fn find_by_id(&self, id: &ArtifactId) -> Result<Option<StoredMetricRun>, StoreError>;

    /// Find all metric runs for a data asset (in insertion order)
    async fn find_by_data_asset(
        &self,
        data_asset_id: &DatasetId,
    ) -> Result<Vec<StoredMetricRun>, StoreError>;
}
