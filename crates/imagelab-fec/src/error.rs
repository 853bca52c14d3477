//! Error types for forward-error-correction codecs.

use thiserror::Error;

/// Result type alias using [`FecError`].
pub type Result<T> = std::result::Result<T, FecError>;

/// Errors raised by the Hamming and Reed-Solomon codecs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FecError {
    /// Input could not be parsed under the codec's framing rules.
    #[error("malformed FEC input: {0}")]
    InputMalformed(String),

    /// Too many erasures to recover the original data.
    #[error("unrecoverable: {0}")]
    Unrecoverable(String),
}
