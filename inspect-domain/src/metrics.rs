//! Batch requests and metric-run artifacts
//!
//! A [`BatchRequest`] describes which slice of a data asset to read.
//! A [`MetricRun`] is the structured output of inspecting that slice.

use crate::result::ResourceKind;
use crate::value_objects::{DataAssetName, DatasetId, DatasourceName};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Option key selecting a single batch (partition) of a data asset.
pub const BATCH_ID_OPTION: &str = "batch_id";

// =============================================================================
// Batch Request
// =============================================================================

/// Specification of which slice of a dataset's data to read.
///
/// An empty `options` map means "all data currently in the asset".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Datasource holding the asset
    pub datasource_name: DatasourceName,
    /// Asset to read
    pub data_asset_name: DataAssetName,
    /// Partitioning options understood by the datasource
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl BatchRequest {
    /// Create a request for all data of an asset
    pub fn new(datasource_name: DatasourceName, data_asset_name: DataAssetName) -> Self {
        Self {
            datasource_name,
            data_asset_name,
            options: BTreeMap::new(),
        }
    }

    /// Add a partitioning option
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Batch selected by this request, if it selects a single one
    pub fn batch_id(&self) -> Option<&str> {
        self.options.get(BATCH_ID_OPTION).and_then(|v| v.as_str())
    }
}

// =============================================================================
// Metric Run
// =============================================================================

/// The artifact produced by inspecting one batch of one data asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRun {
    /// Asset the metrics describe
    pub data_asset_id: DatasetId,
    /// Slice of data that was inspected
    pub batch_request: BatchRequest,
    /// Computed metrics, in computation order
    pub metrics: Vec<Metric>,
    /// When the computation finished
    pub computed_at: DateTime<Utc>,
}

impl MetricRun {
    /// Create a run stamped with the current time
    pub fn new(data_asset_id: DatasetId, batch_request: BatchRequest, metrics: Vec<Metric>) -> Self {
        Self {
            data_asset_id,
            batch_request,
            metrics,
            computed_at: Utc::now(),
        }
    }

    /// Kind tag used when this run is reported as a created resource
    pub fn kind(&self) -> ResourceKind {
        ResourceKind::MetricRun
    }

    /// Find a metric by name and column
    pub fn metric(&self, metric_name: &str, column: Option<&str>) -> Option<&Metric> {
        self.metrics
            .iter()
            .find(|m| m.metric_name == metric_name && m.column.as_deref() == column)
    }

    /// Number of metrics that failed to compute
    pub fn failed_metric_count(&self) -> usize {
        self.metrics.iter().filter(|m| m.exception.is_some()).count()
    }
}

/// A single computed metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Batch the metric was computed on
    pub batch_id: String,
    /// Metric name (e.g. `table.row_count`, `column.null_count`)
    pub metric_name: String,
    /// Column the metric applies to, `None` for table-level metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Computed value
    pub value: MetricValue,
    /// Failure recorded instead of (or alongside) a value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<MetricException>,
}

impl Metric {
    /// Table-level metric
    pub fn table(batch_id: impl Into<String>, metric_name: impl Into<String>, value: MetricValue) -> Self {
        Self {
            batch_id: batch_id.into(),
            metric_name: metric_name.into(),
            column: None,
            value,
            exception: None,
        }
    }

    /// Column-level metric
    pub fn column(
        batch_id: impl Into<String>,
        metric_name: impl Into<String>,
        column: impl Into<String>,
        value: MetricValue,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            metric_name: metric_name.into(),
            column: Some(column.into()),
            value,
            exception: None,
        }
    }

    /// Attach a failure to this metric
    pub fn with_exception(mut self, exception: MetricException) -> Self {
        self.exception = Some(exception);
        self
    }
}

/// Value of a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    /// Numeric value (counts, min/max, mean)
    Numeric(Decimal),
    /// Free text value
    Text(String),
    /// List of strings (e.g. column names)
    TextList(Vec<String>),
    /// No value (metric failed or not applicable)
    Null,
}

/// Error recorded for a metric that could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricException {
    /// Error class
    #[serde(rename = "type")]
    pub exception_type: String,
    /// Human-readable message
    pub message: String,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn request() -> BatchRequest {
        BatchRequest::new(
            DatasourceName::new("sales_db").unwrap(),
            DataAssetName::new("orders").unwrap(),
        )
    }

    #[test]
    fn test_batch_request_options() {
        let all = request();
        assert!(all.options.is_empty());
        assert!(all.batch_id().is_none());

        let latest = request().with_option(BATCH_ID_OPTION, json!("2024-06"));
        assert_eq!(latest.batch_id(), Some("2024-06"));
    }

    #[test]
    fn test_metric_lookup() {
        let run = MetricRun::new(
            DatasetId::new("orders-uuid"),
            request(),
            vec![
                Metric::table("b1", "table.row_count", MetricValue::Numeric(dec!(42))),
                Metric::column("b1", "column.null_count", "amount", MetricValue::Numeric(dec!(3))),
                Metric::column("b1", "column.mean", "amount", MetricValue::Null).with_exception(
                    MetricException {
                        exception_type: "TypeError".to_string(),
                        message: "non-numeric column".to_string(),
                    },
                ),
            ],
        );

        assert_eq!(run.kind(), ResourceKind::MetricRun);
        assert_eq!(
            run.metric("table.row_count", None).unwrap().value,
            MetricValue::Numeric(dec!(42))
        );
        assert!(run.metric("column.null_count", Some("amount")).is_some());
        assert!(run.metric("column.null_count", Some("status")).is_none());
        assert_eq!(run.failed_metric_count(), 1);
    }

    #[test]
    fn test_metric_serialization() {
        let metric = Metric::table(
            "b1",
            "table.columns",
            MetricValue::TextList(vec!["id".to_string(), "amount".to_string()]),
        );

        let value = serde_json::to_value(&metric).unwrap();
        assert_eq!(
            value,
            json!({
                "batch_id": "b1",
                "metric_name": "table.columns",
                "value": { "kind": "text_list", "value": ["id", "amount"] },
            })
        );

        let parsed: Metric = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, metric);
    }
}
