//! Forward error correction: Hamming(7,4) over nibbles and a systematic,
//! column-oriented Reed-Solomon(n, k) over shards.
//!
//! Both codecs are pure functions over byte slices; neither knows about
//! chunks, sessions or the orchestrator that drives them.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bits;
pub mod error;
pub mod hamming;
pub mod reed_solomon;

pub use error::{FecError, Result};
pub use hamming::HammingMetrics;
pub use reed_solomon::{DecodeMetrics as RsDecodeMetrics, EncodeMetrics as RsEncodeMetrics};
