//! Inbound events
//!
//! Events are immutable work requests delivered by a transport.
//! Each event is consumed exactly once by the action registered for its type.

use crate::value_objects::{DataAssetName, DatasourceName};
use serde::ser::SerializeMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Discriminator identifying which action handles an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Compute descriptive metrics for the columns of a data asset
    #[serde(rename = "RunColumnDescriptiveMetricsEvent")]
    RunColumnDescriptiveMetrics,
    /// Any event type this agent does not understand
    #[serde(rename = "UnknownEvent")]
    Unknown,
}

impl EventType {
    /// Wire name of the event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::RunColumnDescriptiveMetrics => "RunColumnDescriptiveMetricsEvent",
            EventType::Unknown => "UnknownEvent",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound work events, tagged on the wire by `type`.
///
/// Unrecognised types deserialize to [`Event::Unknown`], keeping the wire
/// name, so the dispatcher rather than the transport decides how to reject
/// them.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Compute and record column descriptive metrics for one data asset
    RunColumnDescriptiveMetrics(RunColumnDescriptiveMetricsEvent),

    /// Event of an unrecognised type, holding the `type` it arrived with
    Unknown(String),
}

impl Event {
    /// Get the discriminator of this event
    pub fn event_type(&self) -> EventType {
        match self {
            Event::RunColumnDescriptiveMetrics(_) => EventType::RunColumnDescriptiveMetrics,
            Event::Unknown(_) => EventType::Unknown,
        }
    }

    /// Wire name of this event's type, as received
    pub fn as_str(&self) -> &str {
        match self {
            Event::Unknown(type_name) => type_name,
            known => known.event_type().as_str(),
        }
    }

    /// Datasource this event targets, if it targets one
    pub fn datasource_name(&self) -> Option<&DatasourceName> {
        match self {
            Event::RunColumnDescriptiveMetrics(e) => Some(&e.datasource_name),
            Event::Unknown(_) => None,
        }
    }

    /// Data asset this event targets, if it targets one
    pub fn data_asset_name(&self) -> Option<&DataAssetName> {
        match self {
            Event::RunColumnDescriptiveMetrics(e) => Some(&e.data_asset_name),
            Event::Unknown(_) => None,
        }
    }
}

/// Wire form of the recognised events.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum Tagged<T> {
    #[serde(rename = "RunColumnDescriptiveMetricsEvent")]
    RunColumnDescriptiveMetrics(T),
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Event::RunColumnDescriptiveMetrics(e) => {
                Tagged::RunColumnDescriptiveMetrics(e).serialize(serializer)
            },
            Event::Unknown(type_name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", type_name)?;
                map.end()
            },
        }
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let type_name = match value.get("type") {
            Some(Value::String(type_name)) => type_name.clone(),
            Some(_) => return Err(de::Error::custom("event `type` must be a string")),
            None => return Err(de::Error::missing_field("type")),
        };

        if type_name != EventType::RunColumnDescriptiveMetrics.as_str() {
            return Ok(Event::Unknown(type_name));
        }

        let Tagged::RunColumnDescriptiveMetrics(event) =
            Tagged::<RunColumnDescriptiveMetricsEvent>::deserialize(value).map_err(<D::Error as de::Error>::custom)?;
        Ok(Event::RunColumnDescriptiveMetrics(event))
    }
}

/// Payload of a column descriptive metrics request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunColumnDescriptiveMetricsEvent {
    /// Datasource holding the asset
    pub datasource_name: DatasourceName,
    /// Asset to inspect
    pub data_asset_name: DataAssetName,
}

impl RunColumnDescriptiveMetricsEvent {
    /// Create a new request payload
    pub fn new(datasource_name: DatasourceName, data_asset_name: DataAssetName) -> Self {
        Self { datasource_name, data_asset_name }
    }
}

impl From<RunColumnDescriptiveMetricsEvent> for Event {
    fn from(event: RunColumnDescriptiveMetricsEvent) -> Self {
        Event::RunColumnDescriptiveMetrics(event)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn orders_event() -> Event {
        RunColumnDescriptiveMetricsEvent::new(
            DatasourceName::new("sales_db").unwrap(),
            DataAssetName::new("orders").unwrap(),
        )
        .into()
    }

    #[test]
    fn test_event_wire_shape() {
        let value = serde_json::to_value(orders_event()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "RunColumnDescriptiveMetricsEvent",
                "datasource_name": "sales_db",
                "data_asset_name": "orders",
            })
        );
    }

    #[test]
    fn test_event_deserialization() {
        let event: Event = serde_json::from_value(json!({
            "type": "RunColumnDescriptiveMetricsEvent",
            "datasource_name": "sales_db",
            "data_asset_name": "orders",
        }))
        .unwrap();

        assert_eq!(event, orders_event());
        assert_eq!(event.event_type(), EventType::RunColumnDescriptiveMetrics);
        assert_eq!(event.datasource_name().unwrap().as_str(), "sales_db");
        assert_eq!(event.data_asset_name().unwrap().as_str(), "orders");
    }

    #[test]
    fn test_unrecognised_type_becomes_unknown() {
        let event: Event = serde_json::from_value(json!({
            "type": "RunCheckpointEvent",
            "checkpoint_id": "abc",
        }))
        .unwrap();

        assert_eq!(event, Event::Unknown("RunCheckpointEvent".to_string()));
        assert_eq!(event.event_type(), EventType::Unknown);
        assert_eq!(event.as_str(), "RunCheckpointEvent");
        assert!(event.datasource_name().is_none());
    }

    #[test]
    fn test_unknown_event_keeps_wire_type() {
        let event = Event::Unknown("RunTableRowCountEvent".to_string());

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({ "type": "RunTableRowCountEvent" }));
        assert_eq!(serde_json::from_value::<Event>(value).unwrap(), event);
    }

    #[test]
    fn test_missing_or_invalid_type_rejected() {
        let missing = serde_json::from_value::<Event>(json!({ "datasource_name": "sales_db" }));
        assert!(missing.unwrap_err().to_string().contains("missing field `type`"));

        let numeric = serde_json::from_value::<Event>(json!({ "type": 7 }));
        assert!(numeric.is_err());
    }

    #[test]
    fn test_missing_payload_field_rejected() {
        let result = serde_json::from_value::<Event>(json!({
            "type": "RunColumnDescriptiveMetricsEvent",
            "datasource_name": "sales_db",
        }));
        assert!(result.unwrap_err().to_string().contains("data_asset_name"));
    }

    #[test]
    fn test_empty_names_fail_deserialization() {
        let result = serde_json::from_value::<Event>(json!({
            "type": "RunColumnDescriptiveMetricsEvent",
            "datasource_name": "",
            "data_asset_name": "orders",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(
            EventType::RunColumnDescriptiveMetrics.to_string(),
            "RunColumnDescriptiveMetricsEvent"
        );
        assert_eq!(
            serde_json::to_string(&EventType::Unknown).unwrap(),
            "\"UnknownEvent\""
        );
    }
}
