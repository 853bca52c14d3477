//! Error types for cryptographic operations

use thiserror::Error;

/// Result type alias using CryptoError
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// AES-GCM key was not 16, 24 or 32 bytes
    #[error("invalid AES key length: need 16, 24 or 32 bytes, got {0}")]
    BadKey(usize),

    /// Encryption failed
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// AEAD authentication tag rejected during decryption
    #[error("authentication failed")]
    AuthFailed,

    /// HKDF expansion failed (requested output longer than 255 * hash length)
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
