//! AES-GCM encryption over 128/192/256-bit keys.

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    AesGcm, Nonce,
};

use crate::error::{CryptoError, Result};

type Aes128Gcm = AesGcm<Aes128, aes_gcm::aead::consts::U12>;
type Aes192Gcm = AesGcm<Aes192, aes_gcm::aead::consts::U12>;
type Aes256Gcm = AesGcm<Aes256, aes_gcm::aead::consts::U12>;

/// Encrypt `plaintext` under `key` (16, 24 or 32 bytes) and `nonce` (12 bytes).
///
/// Returns ciphertext with the 16-byte authentication tag appended.
pub fn encrypt(key: &[u8], nonce: &[u8; 12], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let nonce = Nonce::from_slice(nonce);
    let payload = Payload {
        msg: plaintext,
        aad,
    };

    match key.len() {
        16 => {
            let cipher = Aes128Gcm::new(key.into());
            cipher
                .encrypt(nonce, payload)
                .map_err(|e| CryptoError::Encryption(e.to_string()))
        }
        24 => {
            let cipher = Aes192Gcm::new(key.into());
            cipher
                .encrypt(nonce, payload)
                .map_err(|e| CryptoError::Encryption(e.to_string()))
        }
        32 => {
            let cipher = Aes256Gcm::new(key.into());
            cipher
                .encrypt(nonce, payload)
                .map_err(|e| CryptoError::Encryption(e.to_string()))
        }
        other => Err(CryptoError::BadKey(other)),
    }
}

/// Decrypt `ciphertext` (including its trailing tag) under `key` and `nonce`.
pub fn decrypt(key: &[u8], nonce: &[u8; 12], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let nonce = Nonce::from_slice(nonce);
    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    match key.len() {
        16 => {
            let cipher = Aes128Gcm::new(key.into());
            cipher
                .decrypt(nonce, payload)
                .map_err(|_| CryptoError::AuthFailed)
        }
        24 => {
            let cipher = Aes192Gcm::new(key.into());
            cipher
                .decrypt(nonce, payload)
                .map_err(|_| CryptoError::AuthFailed)
        }
        32 => {
            let cipher = Aes256Gcm::new(key.into());
            cipher
                .decrypt(nonce, payload)
                .map_err(|_| CryptoError::AuthFailed)
        }
        other => Err(CryptoError::BadKey(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_256() {
        let key = [0u8; 32];
        let nonce = [1u8; 12];
        let plaintext = b"hello world";

        let ciphertext = encrypt(&key, &nonce, plaintext, b"").unwrap();
        let decrypted = decrypt(&key, &nonce, &ciphertext, b"").unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn roundtrip_192() {
        let key = [7u8; 24];
        let nonce = [2u8; 12];
        let plaintext = b"twenty four byte key";

        let ciphertext = encrypt(&key, &nonce, plaintext, b"").unwrap();
        let decrypted = decrypt(&key, &nonce, &ciphertext, b"").unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn roundtrip_128() {
        let key = [9u8; 16];
        let nonce = [3u8; 12];
        let plaintext = b"sixteen byte key";

        let ciphertext = encrypt(&key, &nonce, plaintext, b"").unwrap();
        let decrypted = decrypt(&key, &nonce, &ciphertext, b"").unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn bad_key_length_is_rejected() {
        let key = [0u8; 20];
        let nonce = [1u8; 12];
        assert!(matches!(
            encrypt(&key, &nonce, b"x", b""),
            Err(CryptoError::BadKey(20))
        ));
    }

    #[test]
    fn wrong_key_fails_auth() {
        let key1 = [0u8; 32];
        let key2 = [1u8; 32];
        let nonce = [1u8; 12];

        let ciphertext = encrypt(&key1, &nonce, b"secret", b"").unwrap();
        let result = decrypt(&key2, &nonce, &ciphertext, b"");

        assert!(matches!(result, Err(CryptoError::AuthFailed)));
    }

    #[test]
    fn tampered_ciphertext_fails_auth() {
        let key = [0u8; 32];
        let nonce = [1u8; 12];

        let mut ciphertext = encrypt(&key, &nonce, b"secret", b"").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xff;

        let result = decrypt(&key, &nonce, &ciphertext, b"");
        assert!(matches!(result, Err(CryptoError::AuthFailed)));
    }

    #[test]
    fn wrong_aad_fails_auth() {
        let key = [0u8; 32];
        let nonce = [1u8; 12];

        let ciphertext = encrypt(&key, &nonce, b"secret", b"aad1").unwrap();
        let result = decrypt(&key, &nonce, &ciphertext, b"aad2");

        assert!(matches!(result, Err(CryptoError::AuthFailed)));
    }
}
