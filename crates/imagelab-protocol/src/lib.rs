//! imagelab wire protocol and upload orchestration.
//!
//! Defines chunk envelopes and assembly, channel noise emulation, raw
//! DEFLATE/gzip compression, the negotiated pipeline settings, the event
//! labels published during an upload, 128-bit id generation, and the
//! `UploadRecord` orchestrator that ties FEC (`imagelab-fec`) and crypto
//! (`imagelab-crypto`) into the `finish` sequence.

#![forbid(unsafe_code)]

pub mod compression;
pub mod error;
pub mod events;
pub mod ids;
pub mod noise;
pub mod record;
pub mod settings;
pub mod transfer;

pub use error::ProtocolError;
pub use record::{FinishOutcome, SessionLookup, StageMetric, StatusSnapshot, UploadRecord};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
