//! # Key Derivation
//!
//! Combines the client-hello and server-hello key/IV pairs into the final
//! session pair by bytewise XOR. The operation is commutative and
//! self-inverse, so both sides compute identical final material
//! independently, and neither hello alone reveals anything about it.

use crate::crypto::symmetric::KeyIv;
use crate::crypto::{BLOCK_SIZE, KEY_SIZE};
use crate::error::{ChannelError, Result};

/// Bytewise XOR of two equal-length, non-empty byte strings.
pub fn merge(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return Err(ChannelError::KeyLengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect())
}

/// Derive the final session pair from the two hello pairs.
///
/// The fixed-size [`KeyIv`] type guarantees the equal-length precondition,
/// so this cannot fail.
pub fn derive_session(client_hello: &KeyIv, server_hello: &KeyIv) -> KeyIv {
    let mut key = [0u8; KEY_SIZE];
    let mut iv = [0u8; BLOCK_SIZE];
    for (out, (a, b)) in key
        .iter_mut()
        .zip(client_hello.key().iter().zip(server_hello.key().iter()))
    {
        *out = a ^ b;
    }
    for (out, (a, b)) in iv
        .iter_mut()
        .zip(client_hello.iv().iter().zip(server_hello.iv().iter()))
    {
        *out = a ^ b;
    }
    KeyIv::new(key, iv)
}
