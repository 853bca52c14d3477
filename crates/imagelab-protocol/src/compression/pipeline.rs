//! Compress/decompress wrap and unwrap, with §4.6 metrics.

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use serde::{Deserialize, Serialize};

use super::CompressionAlgorithm;
use crate::error::ProtocolError;

/// Metrics recorded for one compression pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionMetrics {
    /// Whether compression was enabled for this upload.
    pub enabled: bool,
    /// Which algorithm was used.
    pub algorithm: String,
    /// The clamped compression level.
    pub level: u32,
    /// Input length in bytes.
    pub input_bytes: usize,
    /// Output length in bytes.
    pub output_bytes: usize,
    /// `output_bytes / input_bytes`, or `1.0` when input is empty.
    pub ratio: f64,
}

fn clamp_level(level: i32) -> u32 {
    level.clamp(0, 9) as u32
}

fn ratio(input: usize, output: usize) -> f64 {
    if input == 0 {
        1.0
    } else {
        output as f64 / input as f64
    }
}

/// Compress `data`, or pass it through unchanged when `enabled` is false.
pub fn compress(
    data: &[u8],
    enabled: bool,
    algorithm: CompressionAlgorithm,
    level: i32,
) -> Result<(Vec<u8>, CompressionMetrics), ProtocolError> {
    let level = clamp_level(level);

    if !enabled {
        let metrics = CompressionMetrics {
            enabled: false,
            algorithm: algorithm.as_str().to_string(),
            level,
            input_bytes: data.len(),
            output_bytes: data.len(),
            ratio: ratio(data.len(), data.len()),
        };
        return Ok((data.to_vec(), metrics));
    }

    let compression = Compression::new(level);
    let output = match algorithm {
        CompressionAlgorithm::Deflate => {
            let mut encoder = DeflateEncoder::new(Vec::new(), compression);
            encoder
                .write_all(data)
                .map_err(|e| ProtocolError::InputMalformed(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| ProtocolError::InputMalformed(e.to_string()))?
        }
        CompressionAlgorithm::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), compression);
            encoder
                .write_all(data)
                .map_err(|e| ProtocolError::InputMalformed(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| ProtocolError::InputMalformed(e.to_string()))?
        }
    };

    let metrics = CompressionMetrics {
        enabled: true,
        algorithm: algorithm.as_str().to_string(),
        level,
        input_bytes: data.len(),
        output_bytes: output.len(),
        ratio: ratio(data.len(), output.len()),
    };

    Ok((output, metrics))
}

/// Decompress `data` using `algorithm`, or pass it through when `enabled` is false.
pub fn decompress(
    data: &[u8],
    enabled: bool,
    algorithm: CompressionAlgorithm,
) -> Result<Vec<u8>, ProtocolError> {
    if !enabled {
        return Ok(data.to_vec());
    }

    let mut out = Vec::new();
    match algorithm {
        CompressionAlgorithm::Deflate => {
            let mut decoder = DeflateDecoder::new(data);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| ProtocolError::InputMalformed(e.to_string()))?;
        }
        CompressionAlgorithm::Gzip => {
            let mut decoder = GzDecoder::new(data);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| ProtocolError::InputMalformed(e.to_string()))?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let (compressed, metrics) = compress(&data, true, CompressionAlgorithm::Deflate, 6).unwrap();
        assert!(metrics.enabled);
        assert_eq!(metrics.input_bytes, data.len());

        let decompressed = decompress(&compressed, true, CompressionAlgorithm::Deflate).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn gzip_roundtrip() {
        let data = b"gzip me please, repeatedly".repeat(4);
        let (compressed, _) = compress(&data, true, CompressionAlgorithm::Gzip, 9).unwrap();
        let decompressed = decompress(&compressed, true, CompressionAlgorithm::Gzip).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn disabled_is_identity() {
        let data = b"untouched".to_vec();
        let (out, metrics) = compress(&data, false, CompressionAlgorithm::Gzip, 6).unwrap();
        assert_eq!(out, data);
        assert!(!metrics.enabled);
        assert_eq!(metrics.ratio, 1.0);
    }

    #[test]
    fn empty_input_has_ratio_one() {
        let (out, metrics) = compress(&[], true, CompressionAlgorithm::Deflate, 6).unwrap();
        assert_eq!(metrics.ratio, 1.0);
        let round = decompress(&out, true, CompressionAlgorithm::Deflate).unwrap();
        assert!(round.is_empty());
    }

    #[test]
    fn level_is_clamped() {
        let data = b"clamp me".to_vec();
        let (_, metrics) = compress(&data, true, CompressionAlgorithm::Gzip, 99).unwrap();
        assert_eq!(metrics.level, 9);
    }
}
