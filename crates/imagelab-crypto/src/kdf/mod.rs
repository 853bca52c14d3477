//! Key derivation.
//!
//! imagelab derives exactly one thing from the handshake's shared secret:
//! an HKDF-SHA256 expansion into key/salt/nonce-base material. No
//! password hashing is needed here, unlike an end-user identity crate.

pub mod hkdf;

pub use self::hkdf::derive;
