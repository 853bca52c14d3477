//! The X25519 + HKDF-SHA256 handshake that seeds a session's AES-GCM cipher.

use rand::RngCore;
use rand_core::OsRng;
use zeroize::Zeroize;

use crate::kdf;
use crate::kem::x25519::{X25519KeyPair, X25519PublicKey};
use crate::symmetric::nonce::base_from_bytes;
use crate::Result;

/// Domain-separation string fed to HKDF as `info`.
pub const HELLO_INFO: &[u8] = b"image-http-lab-handshake";

const SALT_LEN: usize = 16;
const AES_KEY_LEN: usize = 32;
const NONCE_BASE_LEN: usize = 12;

/// Everything derived from one client/server X25519 exchange.
///
/// `shared_secret` and `server_private_key` are kept only long enough to
/// derive `aes_key`/`nonce_base`; they are zeroized on drop along with the
/// derived key material.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct HandshakeContext {
    /// Random session identifier, shared with the client out of band.
    #[zeroize(skip)]
    pub session_id: String,
    /// The client's X25519 public key, as received.
    #[zeroize(skip)]
    pub client_public_key: [u8; 32],
    /// The server's ephemeral X25519 private key, kept for this session only.
    server_private_key: [u8; 32],
    /// The server's ephemeral X25519 public key, sent to the client.
    #[zeroize(skip)]
    pub server_public_key: [u8; 32],
    /// Raw Diffie-Hellman output.
    shared_secret: [u8; 32],
    /// Random salt used as the HKDF extract salt.
    pub salt: [u8; SALT_LEN],
    /// Derived AES-256-GCM key.
    pub aes_key: Vec<u8>,
    /// Derived 96-bit nonce base, as a `u128` with the top 32 bits zero.
    pub nonce_base: u128,
    /// Informational creation timestamp (unix seconds), set by the caller.
    #[zeroize(skip)]
    pub created_at: i64,
}

impl HandshakeContext {
    /// Perform the handshake: generate a server keypair, run X25519 DH
    /// against `client_public_key`, and derive the session's key material.
    ///
    /// `session_id` and `created_at` are supplied by the caller so this
    /// crate stays free of ID-generation and clock policy.
    pub fn new(
        session_id: String,
        client_public_key: X25519PublicKey,
        created_at: i64,
    ) -> Result<Self> {
        let server_keypair = X25519KeyPair::generate();
        let shared = server_keypair.diffie_hellman(&client_public_key);

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let aes_key = kdf::derive(&salt, &shared.0, HELLO_INFO, AES_KEY_LEN)?;

        let mut nonce_bytes = [0u8; NONCE_BASE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce_base = base_from_bytes(&nonce_bytes);

        Ok(Self {
            session_id,
            client_public_key: *client_public_key.as_bytes(),
            server_private_key: server_keypair.secret_bytes(),
            server_public_key: server_keypair.public_bytes(),
            shared_secret: shared.0,
            salt,
            aes_key,
            nonce_base,
            created_at,
        })
    }
}

impl std::fmt::Debug for HandshakeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeContext")
            .field("session_id", &self.session_id)
            .field("created_at", &self.created_at)
            .field("aes_key_len", &self.aes_key.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_key_and_nonce_base() {
        let client = X25519KeyPair::generate();
        let ctx =
            HandshakeContext::new("session-1".into(), *client.public_key(), 0).unwrap();

        assert_eq!(ctx.aes_key.len(), AES_KEY_LEN);
        assert_eq!(ctx.client_public_key, client.public_bytes());
    }

    #[test]
    fn distinct_handshakes_derive_distinct_keys() {
        let client = X25519KeyPair::generate();
        let ctx1 =
            HandshakeContext::new("s1".into(), *client.public_key(), 0).unwrap();
        let ctx2 =
            HandshakeContext::new("s2".into(), *client.public_key(), 0).unwrap();

        // Fresh server keypair each time means a fresh shared secret.
        assert_ne!(ctx1.aes_key, ctx2.aes_key);
        assert_ne!(ctx1.nonce_base, ctx2.nonce_base);
    }
}
