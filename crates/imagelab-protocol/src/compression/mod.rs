//! Raw DEFLATE and gzip compression, per spec §4.6.

pub mod pipeline;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// The two compression algorithms the upload pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    /// Raw DEFLATE, no zlib header (negative window bits convention).
    Deflate,
    /// Gzip, with standard header and trailer.
    Gzip,
}

impl CompressionAlgorithm {
    /// Parse the wire string used in `PipelineSettings.compression.algorithm`.
    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        match s {
            "deflate" => Ok(Self::Deflate),
            "gzip" => Ok(Self::Gzip),
            other => Err(ProtocolError::InputMalformed(format!(
                "unknown compression algorithm: {other}"
            ))),
        }
    }

    /// The wire string for this algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deflate => "deflate",
            Self::Gzip => "gzip",
        }
    }
}

pub use pipeline::{compress, decompress, CompressionMetrics};
