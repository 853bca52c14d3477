//! HKDF-SHA256 key derivation.

use crate::error::{CryptoError, Result};
use hkdf::Hkdf;
use sha2::Sha256;

/// Derive key material using HKDF-SHA256 (extract-then-expand).
///
/// `salt` seeds the extract step, `ikm` is the input key material (the
/// X25519 shared secret), and `info` domain-separates the output.
pub fn derive(salt: &[u8], ikm: &[u8], info: &[u8], len: usize) -> Result<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);

    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(okm)
}
