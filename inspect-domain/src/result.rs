//! Result envelope returned by actions.
//!
//! The envelope echoes the caller's correlation id and the event type
//! verbatim and lists every durable resource the action created.

use crate::events::{Event, EventType};
use crate::value_objects::{ArtifactId, CorrelationId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a durable resource created by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A persisted metric-run artifact
    MetricRun,
}

impl ResourceKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::MetricRun => "MetricRun",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of one resource created as a side effect of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    /// Identifier assigned by the store that persisted it
    pub resource_id: String,
    /// Kind of resource
    #[serde(rename = "type")]
    pub resource_type: ResourceKind,
}

impl CreatedResource {
    /// Describe a persisted artifact
    pub fn new(id: &ArtifactId, resource_type: ResourceKind) -> Self {
        Self {
            resource_id: id.as_str().to_string(),
            resource_type,
        }
    }
}

/// Output of one successful action invocation.
///
/// `id` and `type` are only ever copied from the inbound request; the
/// constructor takes the event itself so neither can be made up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Echoed correlation id
    pub id: CorrelationId,
    /// Echoed event type
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Created resources, in creation order
    pub created_resources: Vec<CreatedResource>,
}

impl ActionResult {
    /// Create an envelope for `event` with no created resources yet
    pub fn new(id: &CorrelationId, event: &Event) -> Self {
        Self {
            id: id.clone(),
            event_type: event.event_type(),
            created_resources: Vec::new(),
        }
    }

    /// Record a created resource (appended after any earlier ones)
    pub fn with_created(mut self, resource: CreatedResource) -> Self {
        self.created_resources.push(resource);
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataAssetName, DatasourceName, RunColumnDescriptiveMetricsEvent};
    use serde_json::json;

    fn event() -> Event {
        RunColumnDescriptiveMetricsEvent::new(
            DatasourceName::new("sales_db").unwrap(),
            DataAssetName::new("orders").unwrap(),
        )
        .into()
    }

    #[test]
    fn test_envelope_echoes_request() {
        let id = CorrelationId::from("req-123");
        let result = ActionResult::new(&id, &event());

        assert_eq!(result.id, id);
        assert_eq!(result.event_type, EventType::RunColumnDescriptiveMetrics);
        assert!(result.created_resources.is_empty());
    }

    #[test]
    fn test_created_resources_keep_order() {
        let result = ActionResult::new(&CorrelationId::from("req-1"), &event())
            .with_created(CreatedResource::new(&ArtifactId::new("a"), ResourceKind::MetricRun))
            .with_created(CreatedResource::new(&ArtifactId::new("b"), ResourceKind::MetricRun));

        let ids: Vec<_> = result.created_resources.iter().map(|r| r.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_envelope_wire_shape() {
        let result = ActionResult::new(&CorrelationId::from("req-123"), &event()).with_created(
            CreatedResource::new(&ArtifactId::new("metricrun-789"), ResourceKind::MetricRun),
        );

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "id": "req-123",
                "type": "RunColumnDescriptiveMetricsEvent",
                "created_resources": [
                    { "resource_id": "metricrun-789", "type": "MetricRun" }
                ],
            })
        );
    }
}
