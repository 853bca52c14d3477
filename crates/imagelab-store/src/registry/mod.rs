//! The handshake and upload registries: the in-memory, process-wide shared
//! state the orchestrator reads and writes through.

pub mod handshake;
pub mod upload;

pub use handshake::HandshakeRegistry;
pub use upload::{ImageSummary, UploadRegistry};
