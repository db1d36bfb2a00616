//! Short human-verifiable handshake codes.
//!
//! The code is shown to both parties so they can recognise each other in
//! person. It is display-only and not an authentication secret.

use rand::Rng;

/// Characters used in codes; visually ambiguous glyphs (0/O, 1/I) are left out.
pub const SECURE_KEY_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of characters in a generated code.
pub const SECURE_KEY_LENGTH: usize = 4;

/// Generate a fresh random code.
pub fn generate_secure_key() -> String {
    let mut rng = rand::rng();
    (0..SECURE_KEY_LENGTH)
        .map(|_| SECURE_KEY_ALPHABET[rng.random_range(0..SECURE_KEY_ALPHABET.len())] as char)
        .collect()
}
