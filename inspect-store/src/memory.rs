//! In-memory store implementation
//!
//! Used for testing and development without a database.
//! Thread-safe using RwLock for concurrent access.

use crate::error::StoreError;
use crate::repository::{MetricRunRepository, StoredMetricRun};
use async_trait::async_trait;
use chrono::Utc;
use inspect_domain::{ArtifactId, DatasetId, MetricRun};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// In-memory artifact store
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    runs: HashMap<ArtifactId, StoredMetricRun>,
    /// Insertion order of ids
    order: Vec<ArtifactId>,
}

impl MemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Get the number of stored metric runs
    pub fn metric_run_count(&self) -> usize {
        self.read().order.len()
    }

    /// Clear all data (useful for test setup)
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.runs.clear();
        inner.order.clear();
    }

    // Writers validate before touching `Inner`, so a poisoned lock still
    // guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricRunRepository for MemoryStore {
    async fn add_metric_run(&self, run: MetricRun) -> Result<ArtifactId, StoreError> {
        if run.metrics.is_empty() {
            return Err(StoreError::Validation(format!(
                "metric run for data asset {} contains no metrics",
                run.data_asset_id
            )));
        }

        let id = ArtifactId::generate();
        let mut inner = self.write();
        if inner.runs.contains_key(&id) {
            return Err(StoreError::duplicate("metric_run", id.as_str()));
        }

        debug!(
            artifact_id = %id,
            data_asset_id = %run.data_asset_id,
            metrics = run.metrics.len(),
            "Storing metric run"
        );

        inner.order.push(id.clone());
        inner.runs.insert(
            id.clone(),
            StoredMetricRun {
                id: id.clone(),
                run,
                stored_at: Utc::now(),
            },
        );

        Ok(id)
    }

    async fn find_by_id(&self, id: &ArtifactId) -> Result<Option<StoredMetricRun>, StoreError> {
        Ok(self.read().runs.get(id).cloned())
    }

    async fn find_by_data_asset(
        &self,
        data_asset_id: &DatasetId,
    ) -> Result<Vec<StoredMetricRun>, StoreError> {
        let inner = self.read();
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.runs.get(id))
            .filter(|stored| &stored.run.data_asset_id == data_asset_id)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use inspect_domain::{BatchRequest, DataAssetName, DatasourceName, Metric, MetricValue};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn create_run(asset_id: &str) -> MetricRun {
        MetricRun::new(
            DatasetId::new(asset_id),
            BatchRequest::new(
                DatasourceName::new("sales_db").unwrap(),
                DataAssetName::new("orders").unwrap(),
            ),
            vec![Metric::table("b1", "table.row_count", MetricValue::Numeric(dec!(10)))],
        )
    }

    #[tokio::test]
    async fn test_add_and_find_metric_run() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let run = create_run("orders-uuid");

        let id = store.add_metric_run(run.clone()).await?;
        let stored = store.find_by_id(&id).await?.expect("stored run");

        assert_eq!(stored.id, id);
        assert_eq!(stored.run, run);
        assert_eq!(store.metric_run_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_missing_run() {
        let store = MemoryStore::new();
        let found = store.find_by_id(&ArtifactId::new("nope")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_identical_runs_get_distinct_ids() {
        let store = MemoryStore::new();
        let run = create_run("orders-uuid");

        let first = store.add_metric_run(run.clone()).await.unwrap();
        let second = store.add_metric_run(run).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.metric_run_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_run_rejected() {
        let store = MemoryStore::new();
        let mut run = create_run("orders-uuid");
        run.metrics.clear();

        let err = store.add_metric_run(run).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.metric_run_count(), 0);
    }

    #[tokio::test]
    async fn test_find_by_data_asset_in_insertion_order() {
        let store = MemoryStore::new();

        let a1 = store.add_metric_run(create_run("orders-uuid")).await.unwrap();
        store.add_metric_run(create_run("customers-uuid")).await.unwrap();
        let a2 = store.add_metric_run(create_run("orders-uuid")).await.unwrap();

        let runs = store.find_by_data_asset(&DatasetId::new("orders-uuid")).await.unwrap();
        let ids: Vec<_> = runs.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![a1, a2]);
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add_metric_run(create_run("orders-uuid")).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.metric_run_count(), 16);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = MemoryStore::new();
        store.add_metric_run(create_run("orders-uuid")).await.unwrap();
        store.clear();
        assert_eq!(store.metric_run_count(), 0);
    }
}
