//! Key agreement.
//!
//! imagelab only needs classical X25519 Diffie-Hellman for its handshake
//! (see `imagelab_crypto::handshake`); this module is kept narrow on
//! purpose.

pub mod x25519;

pub use x25519::{SharedSecret, X25519KeyPair, X25519PublicKey};
