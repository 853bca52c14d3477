//! The error taxonomy shared by the protocol layer and the orchestrator.

use thiserror::Error;

/// Result type alias using [`ProtocolError`].
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// The abstract error kinds from the core's error handling design.
///
/// Each variant carries a short message; mapping to a transport-level
/// status code (e.g. HTTP) is the job of the external collaborator that
/// owns the transport, not of this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Unknown `file_id` or handshake session.
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing session id for an encrypted upload, or an empty shard
    /// collection at `finish`.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Odd-length Hamming input, wrong shard count for RS, or an unknown
    /// compression algorithm.
    #[error("malformed input: {0}")]
    InputMalformed(String),

    /// RS erasures exceeded `n - k`.
    #[error("unrecoverable: {0}")]
    Unrecoverable(String),

    /// AES key length was not 16, 24 or 32 bytes.
    #[error("bad cryptographic key: {0}")]
    CryptoBadKey(String),

    /// Encryption is enabled but no session id could be resolved.
    #[error("crypto session missing: {0}")]
    CryptoSessionMissing(String),

    /// A session id was given but does not resolve in the registry.
    #[error("crypto session not found: {0}")]
    CryptoSessionNotFound(String),

    /// AES-GCM authentication tag was rejected.
    #[error("crypto authentication failed")]
    CryptoAuthFailed,

    /// Reassembled length did not match the declared `original_size`.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),
}

impl From<imagelab_fec::FecError> for ProtocolError {
    fn from(err: imagelab_fec::FecError) -> Self {
        match err {
            imagelab_fec::FecError::InputMalformed(msg) => Self::InputMalformed(msg),
            imagelab_fec::FecError::Unrecoverable(msg) => Self::Unrecoverable(msg),
        }
    }
}

impl From<imagelab_crypto::CryptoError> for ProtocolError {
    fn from(err: imagelab_crypto::CryptoError) -> Self {
        match err {
            imagelab_crypto::CryptoError::BadKey(len) => {
                Self::CryptoBadKey(format!("need 16, 24 or 32 bytes, got {len}"))
            }
            imagelab_crypto::CryptoError::AuthFailed => Self::CryptoAuthFailed,
            imagelab_crypto::CryptoError::Encryption(msg) => Self::BadRequest(msg),
            imagelab_crypto::CryptoError::KeyDerivation(msg) => Self::BadRequest(msg),
        }
    }
}
