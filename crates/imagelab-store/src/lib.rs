//! imagelab persistent-adjacent storage layer.
//!
//! Owns what the pure `imagelab-protocol` orchestrator deliberately does
//! not: environment-driven configuration, the process-wide handshake and
//! upload registries, and writing reassembled blobs to disk.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod persistence;
pub mod registry;

pub use error::StoreError;
pub use registry::{HandshakeRegistry, ImageSummary, UploadRegistry};

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
