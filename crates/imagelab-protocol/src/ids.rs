//! 128-bit random identifiers, rendered as lowercase hex.
//!
//! Used for both `file_id` and `session_id`; no UUID dependency is needed
//! since no UUID-specific invariant (e.g. the version nibble) is ever
//! observed outside of this process.

use rand::RngCore;

/// Generate a fresh 128-bit random identifier as 32 lowercase hex digits.
pub fn generate_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
