//! Action abstraction shared by every event handler.

use async_trait::async_trait;

use inspect_domain::{ActionResult, CorrelationId, Event, EventType};

use crate::error::ExecResult;

/// A handler bound to one event type.
///
/// Collaborators are injected once at construction and shared for the
/// action's lifetime. `run` holds no per-call state on `self`, so one
/// action may serve many concurrent invocations.
#[async_trait]
pub trait Action: Send + Sync {
    /// Event type this action handles.
    fn event_type(&self) -> EventType;

    /// Handle one event.
    ///
    /// On success the returned envelope echoes `id` and the event's type.
    /// On failure no envelope is produced.
    async fn run(&self, event: &Event, id: &CorrelationId) -> ExecResult<ActionResult>;
}
