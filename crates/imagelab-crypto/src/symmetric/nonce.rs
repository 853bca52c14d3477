//! Deterministic per-sequence nonce derivation.
//!
//! imagelab does not track a live counter: each chunk carries an explicit
//! sequence number, and the nonce for that chunk is always
//! `(nonce_base + sequence) mod 2^96`, encoded big-endian over 12 bytes.
//! Two peers that agree on `nonce_base` therefore agree on every nonce
//! without exchanging state beyond the handshake.

/// Compute the 96-bit GCM nonce for a given sequence number.
///
/// `base` is the handshake-derived nonce base, interpreted as a 96-bit
/// unsigned integer (the top 32 bits of the `u128` are ignored). The
/// addition wraps modulo 2^96.
pub fn nonce_for(base: u128, sequence: u64) -> [u8; 12] {
    const MASK_96: u128 = (1u128 << 96) - 1;
    let value = (base.wrapping_add(sequence as u128)) & MASK_96;

    let full = value.to_be_bytes(); // 16 bytes, big-endian
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&full[4..16]);
    nonce
}

/// Interpret a 96-bit big-endian nonce base as a `u128` (top 32 bits zero).
pub fn base_from_bytes(bytes: &[u8; 12]) -> u128 {
    let mut buf = [0u8; 16];
    buf[4..16].copy_from_slice(bytes);
    u128::from_be_bytes(buf)
}
