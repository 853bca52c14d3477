//! # imagelab-crypto
//!
//! Cryptographic primitives backing the imagelab receive pipeline: an
//! X25519 key-agreement handshake, HKDF-SHA256 key derivation, and an
//! AES-GCM cipher whose nonce is derived deterministically from a session
//! base plus a sequence number.
//!
//! This crate does no I/O and knows nothing about chunks, FEC or
//! compression — it is the narrow primitives layer the orchestrator in
//! `imagelab-protocol` builds on.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handshake;
pub mod kdf;
pub mod kem;
pub mod symmetric;

pub use error::{CryptoError, Result};
pub use handshake::{HandshakeContext, HELLO_INFO};
pub use symmetric::AesGcmCipher;

/// Library version constant
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
