//! VNC authentication (security type 2, RFC 6143 §7.2.2).
//!
//! The server sends a 16-byte random challenge; the client encrypts it with
//! DES in ECB mode using a key derived from the password and sends the
//! 16-byte result back. The key derivation carries VNC's historical quirk:
//! the password is truncated or zero-padded to 8 bytes and *each byte's bit
//! order is reversed* before use as the DES key.
//!
//! This must stay bit-for-bit compatible with the legacy scheme for
//! interoperability; no cryptographic strength is implied.

use des::cipher::{BlockEncrypt, KeyInit};
use des::Des;

use crate::protocol::rfb::CHALLENGE_SIZE;

/// Encrypts a server challenge with the password-derived DES key.
///
/// Passwords longer than 8 bytes are truncated to the first 8; the DES
/// key has no room for more, and servers derive their comparison key the
/// same way. Shorter passwords are zero-padded.
pub fn challenge_response(
    challenge: &[u8; CHALLENGE_SIZE],
    password: &str,
) -> [u8; CHALLENGE_SIZE] {
    encrypt_with_key(challenge, &vnc_des_key(password))
}

/// Derives the 8-byte DES key: truncate/zero-pad, then reverse the bit
/// order of every byte.
fn vnc_des_key(password: &str) -> [u8; 8] {
    let mut key = [0u8; 8];
    for (slot, byte) in key.iter_mut().zip(password.bytes()) {
        *slot = byte.reverse_bits();
    }
    key
}

/// Encrypts the 16-byte challenge as two independent DES blocks (ECB).
fn encrypt_with_key(challenge: &[u8; CHALLENGE_SIZE], key: &[u8; 8]) -> [u8; CHALLENGE_SIZE] {
    let cipher = Des::new(&(*key).into());

    let mut response = [0u8; CHALLENGE_SIZE];
    for (clear, out) in challenge.chunks_exact(8).zip(response.chunks_exact_mut(8)) {
        let mut block = [0u8; 8];
        block.copy_from_slice(clear);
        let mut block = block.into();
        cipher.encrypt_block(&mut block);
        out.copy_from_slice(&block);
    }
    response
}

// ── Tests ─────────────────────────────────────────────────────────────────
