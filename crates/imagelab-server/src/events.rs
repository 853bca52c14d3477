//! Logs every orchestrator event as a structured `tracing` event, standing
//! in for the out-of-scope SSE broadcast.

use imagelab_protocol::events::{EventKind, EventPublisher};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, kind: EventKind, payload: Value) {
        info!(event = kind.label(), payload = %payload, "event");
    }
}
