//! Store error types.

use thiserror::Error;

/// Result type alias using [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage-layer errors: configuration, registry lookups, persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An environment variable was present but could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Unknown `file_id` or handshake `session_id`.
    #[error("not found: {0}")]
    NotFound(String),

    /// The orchestrator's `finish` sequence failed.
    #[error(transparent)]
    Pipeline(#[from] imagelab_protocol::ProtocolError),

    /// Writing the reassembled blob to disk failed.
    #[error("persistence error: {0}")]
    Io(#[from] std::io::Error),
}
