//! Symmetric encryption: AES-GCM with a deterministic per-sequence nonce.

pub mod aes_gcm;
pub mod nonce;

use zeroize::Zeroize;

use crate::error::{CryptoError, Result};

/// An AES-GCM cipher bound to a session's key and nonce base.
///
/// Every message is identified by a `sequence` number; the nonce for that
/// message is always derived as `nonce_base + sequence`, so the cipher
/// itself holds no mutable counter state.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct AesGcmCipher {
    key: Vec<u8>,
    nonce_base: u128,
}

impl AesGcmCipher {
    /// Build a cipher from a key (16, 24 or 32 bytes) and a 96-bit nonce base.
    pub fn new(key: Vec<u8>, nonce_base: u128) -> Result<Self> {
        match key.len() {
            16 | 24 | 32 => Ok(Self { key, nonce_base }),
            other => Err(CryptoError::BadKey(other)),
        }
    }

    /// Encrypt `plaintext` for the given sequence number.
    pub fn encrypt(&self, sequence: u64, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let nonce = nonce::nonce_for(self.nonce_base, sequence);
        aes_gcm::encrypt(&self.key, &nonce, plaintext, aad)
    }

    /// Decrypt `ciphertext` for the given sequence number.
    pub fn decrypt(&self, sequence: u64, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let nonce = nonce::nonce_for(self.nonce_base, sequence);
        aes_gcm::decrypt(&self.key, &nonce, ciphertext, aad)
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher")
            .field("key_len", &self.key.len())
            .field("nonce_base", &"<redacted>")
            .finish()
    }
}
