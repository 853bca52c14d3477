//! Client-proposed, server-echoed pipeline settings.

use serde::{Deserialize, Serialize};

use crate::compression::CompressionAlgorithm;
use crate::error::ProtocolError;

/// Compression settings negotiated for an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionSettings {
    /// Whether compression is applied before FEC/encryption.
    pub enabled: bool,
    /// Compression level, clamped to `[0, 9]` when used.
    pub level: i32,
    /// Which algorithm to use.
    pub algorithm: String,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: 6,
            algorithm: "deflate".to_string(),
        }
    }
}

impl CompressionSettings {
    /// Parse `algorithm` into a [`CompressionAlgorithm`].
    pub fn algorithm(&self) -> Result<CompressionAlgorithm, ProtocolError> {
        CompressionAlgorithm::parse(&self.algorithm)
    }
}

/// Encryption settings negotiated for an upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncryptionSettings {
    /// Whether the uploaded blob is AES-GCM encrypted.
    pub enabled: bool,
    /// The handshake session id to decrypt with, if not otherwise resolvable.
    pub session_id: Option<String>,
}

/// The three supported FEC modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FecMode {
    /// No forward error correction.
    Off,
    /// Hamming(7,4) over nibbles.
    Hamming,
    /// Systematic Reed-Solomon(n, k).
    Rs,
}

/// FEC settings negotiated for an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FecSettings {
    /// The FEC mode.
    pub mode: FecMode,
    /// Total RS shard count (only meaningful when `mode == Rs`).
    pub n: usize,
    /// Data RS shard count (only meaningful when `mode == Rs`).
    pub k: usize,
}

impl Default for FecSettings {
    fn default() -> Self {
        Self {
            mode: FecMode::Off,
            n: 120,
            k: 100,
        }
    }
}

impl FecSettings {
    /// Validate that RS parameters satisfy `n > k > 0` when `mode == Rs`.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.mode == FecMode::Rs && !(self.n > self.k && self.k > 0) {
            return Err(ProtocolError::InputMalformed(format!(
                "invalid RS parameters: n={} k={}, require n > k > 0",
                self.n, self.k
            )));
        }
        Ok(())
    }
}

/// The negotiated settings for one upload: compression, encryption, FEC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Compression settings.
    pub compression: CompressionSettings,
    /// Encryption settings.
    pub encryption: EncryptionSettings,
    /// FEC settings.
    pub fec: FecSettings,
}
