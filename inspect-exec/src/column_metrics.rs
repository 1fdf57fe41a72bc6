//! Column descriptive metrics action.
//!
//! One invocation is one sequential pass:
//!
//! ```text
//! Event → Resolve (Locator) → Compute (Inspector) → Persist (Store) → ActionResult
//! ```
//!
//! Any stage may fail instead; the error is returned as-is and nothing
//! computed so far is reported.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

use inspect_domain::{ActionResult, CorrelationId, CreatedResource, Event, EventType};
use inspect_store::MetricRunRepository;

use crate::action::Action;
use crate::error::{ActionError, ExecResult};
use crate::locator::ResourceLocator;
use crate::ports::{BatchInspectorPort, DataContextPort};

/// Computes column descriptive metrics for a data asset and records them.
pub struct ColumnDescriptiveMetricsAction<C, I, R>
where
    C: DataContextPort,
    I: BatchInspectorPort,
    R: MetricRunRepository,
{
    /// Resolves named datasets against the data context
    locator: ResourceLocator<C>,
    /// Computation engine
    inspector: Arc<I>,
    /// Artifact store
    repository: Arc<R>,
}

impl<C, I, R> ColumnDescriptiveMetricsAction<C, I, R>
where
    C: DataContextPort,
    I: BatchInspectorPort,
    R: MetricRunRepository,
{
    /// Create a new action.
    pub fn new(context: Arc<C>, inspector: Arc<I>, repository: Arc<R>) -> Self {
        Self {
            locator: ResourceLocator::new(context),
            inspector,
            repository,
        }
    }
}

#[async_trait]
impl<C, I, R> Action for ColumnDescriptiveMetricsAction<C, I, R>
where
    C: DataContextPort,
    I: BatchInspectorPort,
    R: MetricRunRepository,
{
    fn event_type(&self) -> EventType {
        EventType::RunColumnDescriptiveMetrics
    }

    async fn run(&self, event: &Event, id: &CorrelationId) -> ExecResult<ActionResult> {
        let Event::RunColumnDescriptiveMetrics(request) = event else {
            return Err(ActionError::UnexpectedEvent {
                expected: self.event_type(),
                actual: event.event_type(),
            });
        };

        info!(
            %id,
            datasource = %request.datasource_name,
            data_asset = %request.data_asset_name,
            "Running column descriptive metrics"
        );

        // 1. Resolve
        let dataset = self
            .locator
            .resolve(&request.datasource_name, &request.data_asset_name)
            .await
            .inspect_err(|e| error!(%id, error = %e, "Dataset resolution failed"))?;

        // 2. Compute
        let metric_run = self
            .inspector
            .compute_metric_run(&dataset.dataset_id, &dataset.batch_request)
            .await
            .inspect_err(|e| {
                error!(%id, dataset_id = %dataset.dataset_id, error = %e, "Metric computation failed")
            })?;

        debug!(
            %id,
            dataset_id = %dataset.dataset_id,
            metrics = metric_run.metrics.len(),
            failed = metric_run.failed_metric_count(),
            "Metric run computed"
        );

        // 3. Persist (the run moves into the store)
        let kind = metric_run.kind();
        let artifact_id = self
            .repository
            .add_metric_run(metric_run)
            .await
            .inspect_err(|e| {
                error!(%id, dataset_id = %dataset.dataset_id, error = %e, "Metric run persistence failed")
            })?;

        info!(%id, %artifact_id, "Metric run recorded");

        // 4. Respond
        Ok(ActionResult::new(id, event).with_created(CreatedResource::new(&artifact_id, kind)))
    }
}

// =============================================================================
// Tests
// =============================================================================
