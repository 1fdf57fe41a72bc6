//! Action registry: the dispatch table from event type to action.
//!
//! Assembled once at startup, then shared read-only by every caller.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use inspect_domain::{ActionResult, CorrelationId, Event, EventType};

use crate::action::Action;
use crate::error::{ActionError, ExecResult};

/// Routes events to the action registered for their type.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<EventType, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action under the event type it handles.
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn register(mut self, action: Arc<dyn Action>) -> Self {
        let event_type = action.event_type();
        if self.actions.insert(event_type, action).is_some() {
            warn!(%event_type, "Replacing previously registered action");
        }
        self
    }

    /// Whether an action is registered for `event_type`.
    pub fn handles(&self, event_type: EventType) -> bool {
        self.actions.contains_key(&event_type)
    }

    /// Registered event types.
    pub fn event_types(&self) -> Vec<EventType> {
        self.actions.keys().copied().collect()
    }

    /// Run the action registered for `event`'s type.
    ///
    /// Fails with `UnknownEvent` when nothing handles the type; no
    /// collaborator is touched in that case.
    pub async fn dispatch(&self, event: &Event, id: &CorrelationId) -> ExecResult<ActionResult> {
        let event_type = event.event_type();
        let action = self.actions.get(&event_type).ok_or_else(|| {
            error!(%id, event_type = event.as_str(), "No action registered for event");
            ActionError::UnknownEvent(event.as_str().to_string())
        })?;

        debug!(%id, %event_type, "Dispatching event");
        action.run(event, id).await
    }
}

// =============================================================================
// Tests
// =============================================================================
