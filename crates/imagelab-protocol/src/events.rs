//! The narrow event-publishing interface the orchestrator depends on.
//!
//! Broadcasting those events over SSE (or any other transport) is an
//! out-of-scope concern owned by the HTTP surface; this crate only needs
//! somewhere to hand events to.

use serde_json::Value;

/// The event labels the orchestrator emits, matching the out-of-scope SSE
/// stream's `event:` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A handshake was completed.
    Handshake,
    /// An upload was initialised.
    UploadInit,
    /// A chunk (data or parity) was ingested.
    Chunk,
    /// Upload progress changed.
    UploadProgress,
    /// A stage recorded new metrics.
    StageMetrics,
    /// The noise configuration changed.
    NoiseConfig,
    /// An upload finished and its image is ready.
    ImageReady,
}

impl EventKind {
    /// The label used on the wire (matches spec.md §6's SSE event labels).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Handshake => "handshake",
            Self::UploadInit => "upload_init",
            Self::Chunk => "chunk",
            Self::UploadProgress => "upload_progress",
            Self::StageMetrics => "stage_metrics",
            Self::NoiseConfig => "noise_config",
            Self::ImageReady => "image_ready",
        }
    }
}

/// Something the orchestrator can publish structured events to.
///
/// Implementations plug in a broadcast transport (SSE, a log sink, a test
/// spy); the orchestrator itself never depends on one concretely.
pub trait EventPublisher {
    /// Publish one event with its JSON-ish payload.
    fn publish(&self, kind: EventKind, payload: Value);
}

/// An [`EventPublisher`] that discards every event; useful in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _kind: EventKind, _payload: Value) {}
}
