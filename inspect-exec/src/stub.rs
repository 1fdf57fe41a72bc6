//! Stub implementations for testing.
//!
//! These implementations simulate the data context and computation engine
//! without touching any real backend.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use tracing::debug;

use inspect_domain::{
    BatchRequest, DataAssetName, DatasetId, DatasourceName, Metric, MetricRun, MetricValue,
    BATCH_ID_OPTION,
};

use crate::ports::{
    BatchInspectorPort, ContextError, DataAssetRef, DataContextPort, DatasourceRef, InspectorError,
};

// =============================================================================
// Stub Data Context
// =============================================================================

/// Asset registration inside the stub context.
struct StubAsset {
    id: DatasetId,
    /// Batches in arrival order; the last one is "latest"
    batches: Vec<String>,
}

/// Stub data context for testing.
///
/// Datasources and assets are registered up front. Requests select the
/// most recently added batch, or all data when the asset has no batches.
pub struct StubDataContext {
    /// datasource name -> asset name -> asset
    datasources: RwLock<HashMap<String, HashMap<String, StubAsset>>>,
    /// Whether the next request build should fail
    fail_next_build: AtomicBool,
    datasource_lookups: AtomicUsize,
    asset_lookups: AtomicUsize,
    request_builds: AtomicUsize,
}

impl StubDataContext {
    /// Create an empty stub context.
    pub fn new() -> Self {
        Self {
            datasources: RwLock::new(HashMap::new()),
            fail_next_build: AtomicBool::new(false),
            datasource_lookups: AtomicUsize::new(0),
            asset_lookups: AtomicUsize::new(0),
            request_builds: AtomicUsize::new(0),
        }
    }

    /// Register a datasource with no assets.
    pub fn add_datasource(&self, name: &str) {
        let mut datasources = self.datasources.write().unwrap_or_else(|e| e.into_inner());
        datasources.entry(name.to_string()).or_default();
    }

    /// Register an asset (registering its datasource if needed).
    pub fn add_asset(&self, datasource: &str, asset: &str, dataset_id: &str) {
        let mut datasources = self.datasources.write().unwrap_or_else(|e| e.into_inner());
        datasources.entry(datasource.to_string()).or_default().insert(
            asset.to_string(),
            StubAsset {
                id: DatasetId::new(dataset_id),
                batches: Vec::new(),
            },
        );
    }

    /// Append a batch to an asset; it becomes the latest batch.
    ///
    /// Ignored if the asset is not registered.
    pub fn add_batch(&self, datasource: &str, asset: &str, batch_id: &str) {
        let mut datasources = self.datasources.write().unwrap_or_else(|e| e.into_inner());
        if let Some(stub) = datasources.get_mut(datasource).and_then(|assets| assets.get_mut(asset)) {
            stub.batches.push(batch_id.to_string());
        }
    }

    /// Configure the next request build to fail with a backend error.
    pub fn set_fail_next_build(&self, fail: bool) {
        self.fail_next_build.store(fail, Ordering::SeqCst);
    }

    /// Number of `get_datasource` calls so far.
    pub fn datasource_lookups(&self) -> usize {
        self.datasource_lookups.load(Ordering::SeqCst)
    }

    /// Number of `get_asset` calls so far.
    pub fn asset_lookups(&self) -> usize {
        self.asset_lookups.load(Ordering::SeqCst)
    }

    /// Number of `build_batch_request` calls so far.
    pub fn request_builds(&self) -> usize {
        self.request_builds.load(Ordering::SeqCst)
    }
}

impl Default for StubDataContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataContextPort for StubDataContext {
    async fn get_datasource(&self, name: &DatasourceName) -> Result<DatasourceRef, ContextError> {
        self.datasource_lookups.fetch_add(1, Ordering::SeqCst);

        let datasources = self.datasources.read().unwrap_or_else(|e| e.into_inner());
        if !datasources.contains_key(name.as_str()) {
            return Err(ContextError::DatasourceNotFound(name.to_string()));
        }

        Ok(DatasourceRef { name: name.clone() })
    }

    async fn get_asset(
        &self,
        datasource: &DatasourceRef,
        name: &DataAssetName,
    ) -> Result<DataAssetRef, ContextError> {
        self.asset_lookups.fetch_add(1, Ordering::SeqCst);

        let datasources = self.datasources.read().unwrap_or_else(|e| e.into_inner());
        let assets = datasources
            .get(datasource.name.as_str())
            .ok_or_else(|| ContextError::DatasourceNotFound(datasource.name.to_string()))?;
        let asset = assets.get(name.as_str()).ok_or_else(|| ContextError::AssetNotFound {
            datasource: datasource.name.to_string(),
            asset: name.to_string(),
        })?;

        Ok(DataAssetRef {
            id: asset.id.clone(),
            name: name.clone(),
            datasource_name: datasource.name.clone(),
        })
    }

    async fn build_batch_request(&self, asset: &DataAssetRef) -> Result<BatchRequest, ContextError> {
        self.request_builds.fetch_add(1, Ordering::SeqCst);

        if self.fail_next_build.swap(false, Ordering::SeqCst) {
            return Err(ContextError::Backend("Simulated connection failure".to_string()));
        }

        let datasources = self.datasources.read().unwrap_or_else(|e| e.into_inner());
        let stub = datasources
            .get(asset.datasource_name.as_str())
            .and_then(|assets| assets.get(asset.name.as_str()))
            .ok_or_else(|| ContextError::AssetNotFound {
                datasource: asset.datasource_name.to_string(),
                asset: asset.name.to_string(),
            })?;

        let request = BatchRequest::new(asset.datasource_name.clone(), asset.name.clone());
        Ok(match stub.batches.last() {
            Some(latest) => request.with_option(BATCH_ID_OPTION, latest.clone().into()),
            None => request,
        })
    }
}

// =============================================================================
// Stub Batch Inspector
// =============================================================================

/// Stub computation engine for testing.
///
/// Produces `table.row_count`, `table.columns` and one
/// `column.null_count` per configured column.
pub struct StubBatchInspector {
    columns: Vec<String>,
    row_count: Decimal,
    /// Error to return from the next call
    fail_next: RwLock<Option<InspectorError>>,
    call_count: AtomicUsize,
}

impl StubBatchInspector {
    /// Create a stub inspector reporting the given columns and row count.
    pub fn new(columns: &[&str], row_count: Decimal) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            row_count,
            fail_next: RwLock::new(None),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Configure the next computation to fail.
    pub fn set_fail_next(&self, error: Option<InspectorError>) {
        let mut fail_next = self.fail_next.write().unwrap_or_else(|e| e.into_inner());
        *fail_next = error;
    }

    /// Number of computations requested so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Option<InspectorError> {
        let mut fail_next = self.fail_next.write().unwrap_or_else(|e| e.into_inner());
        fail_next.take()
    }
}

impl Default for StubBatchInspector {
    fn default() -> Self {
        Self::new(&["id"], Decimal::ZERO)
    }
}

#[async_trait]
impl BatchInspectorPort for StubBatchInspector {
    async fn compute_metric_run(
        &self,
        data_asset_id: &DatasetId,
        batch_request: &BatchRequest,
    ) -> Result<MetricRun, InspectorError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.take_failure() {
            return Err(error);
        }

        let batch_id = batch_request.batch_id().map(str::to_string).unwrap_or_else(|| {
            format!("{}-{}", batch_request.datasource_name, batch_request.data_asset_name)
        });

        let mut metrics = vec![
            Metric::table(&batch_id, "table.row_count", MetricValue::Numeric(self.row_count)),
            Metric::table(&batch_id, "table.columns", MetricValue::TextList(self.columns.clone())),
        ];
        metrics.extend(self.columns.iter().map(|column| {
            Metric::column(&batch_id, "column.null_count", column, MetricValue::Numeric(Decimal::ZERO))
        }));

        debug!(%data_asset_id, %batch_id, metrics = metrics.len(), "Stub: metric run computed");

        Ok(MetricRun::new(data_asset_id.clone(), batch_request.clone(), metrics))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> BatchRequest {
        BatchRequest::new(
            DatasourceName::new("sales_db").unwrap(),
            DataAssetName::new("orders").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_stub_inspector_metrics() {
        let inspector = StubBatchInspector::new(&["id", "amount"], dec!(120));

        let run = inspector
            .compute_metric_run(&DatasetId::new("orders-uuid"), &request())
            .await
            .unwrap();

        assert_eq!(run.data_asset_id, DatasetId::new("orders-uuid"));
        assert_eq!(run.metrics.len(), 4);
        assert_eq!(
            run.metric("table.row_count", None).unwrap().value,
            MetricValue::Numeric(dec!(120))
        );
        assert!(run.metric("column.null_count", Some("amount")).is_some());
        assert_eq!(run.metrics[0].batch_id, "sales_db-orders");
        assert_eq!(inspector.call_count(), 1);
    }

    #[tokio::test]
    async fn test_stub_inspector_uses_batch_id() {
        let inspector = StubBatchInspector::default();
        let request = request().with_option(BATCH_ID_OPTION, "2024-06".into());

        let run = inspector
            .compute_metric_run(&DatasetId::new("orders-uuid"), &request)
            .await
            .unwrap();

        assert!(run.metrics.iter().all(|m| m.batch_id == "2024-06"));
    }

    #[tokio::test]
    async fn test_stub_inspector_failure_resets() {
        let inspector = StubBatchInspector::default();
        inspector.set_fail_next(Some(InspectorError::Timeout("query timed out".to_string())));

        let first = inspector.compute_metric_run(&DatasetId::new("x"), &request()).await;
        assert_eq!(first.unwrap_err(), InspectorError::Timeout("query timed out".to_string()));

        let second = inspector.compute_metric_run(&DatasetId::new("x"), &request()).await;
        assert!(second.is_ok());
        assert_eq!(inspector.call_count(), 2);
    }

    #[tokio::test]
    async fn test_stub_context_counts_calls() {
        let context = StubDataContext::new();
        context.add_asset("sales_db", "orders", "orders-uuid");

        let ds = context
            .get_datasource(&DatasourceName::new("sales_db").unwrap())
            .await
            .unwrap();
        let asset = context.get_asset(&ds, &DataAssetName::new("orders").unwrap()).await.unwrap();
        let request = context.build_batch_request(&asset).await.unwrap();

        assert!(request.options.is_empty());
        assert_eq!(context.datasource_lookups(), 1);
        assert_eq!(context.asset_lookups(), 1);
        assert_eq!(context.request_builds(), 1);
    }
}
