//! X25519 Diffie-Hellman key exchange.

use rand_core::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

/// Re-export for callers that only need the public key type.
pub use x25519_dalek::PublicKey as X25519PublicKey;

/// The raw 32-byte output of an X25519 Diffie-Hellman exchange.
///
/// Zeroized on drop; never serialized, never persisted.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SharedSecret(pub [u8; 32]);

/// An X25519 keypair generated fresh per handshake.
///
/// Keys are ephemeral: imagelab never persists them across a session, so
/// unlike a long-lived identity key there is no serialization support here.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct X25519KeyPair {
    secret: StaticSecret,
    #[zeroize(skip)]
    public: PublicKey,
}

impl X25519KeyPair {
    /// Generate a new keypair from the OS RNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The public key half of this keypair.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The public key as raw bytes, as sent on the wire.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// The private scalar as raw bytes. Callers are responsible for
    /// zeroizing any copy they take of this.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Perform Diffie-Hellman with a peer's public key.
    pub fn diffie_hellman(&self, their_public: &PublicKey) -> SharedSecret {
        let shared = self.secret.diffie_hellman(their_public);
        SharedSecret(*shared.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_agrees() {
        let client = X25519KeyPair::generate();
        let server = X25519KeyPair::generate();

        let client_shared = client.diffie_hellman(server.public_key());
        let server_shared = server.diffie_hellman(client.public_key());

        assert_eq!(client_shared.0, server_shared.0);
    }

    #[test]
    fn distinct_keypairs_have_distinct_public_keys() {
        let a = X25519KeyPair::generate();
        let b = X25519KeyPair::generate();
        assert_ne!(a.public_bytes(), b.public_bytes());
    }
}
