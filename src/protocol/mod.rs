//! # Handshake Protocol
//!
//! The 3-message handshake and the persistent encrypted channel it
//! establishes.
//!
//! ## Handshake Flow
//! ```text
//! Client                                  Server
//!   | -- Handshake: RSA(IV_c ‖ Key_c) -->  |   Init
//!   |                                      |   derive final = hello_c XOR hello_s
//!   | <-- Handshake: AES_c(IV_s ‖ Key_s) --|   WaitForClientConfirm
//!   |  derive final, build stream cipher   |
//!   | -- Handshake: AES_f(confirm) ------> |
//!   |  HandshakeCompleted (immediately)    |   HandshakeCompleted
//! ```
//!
//! Completion is asymmetric by design: the client declares success the
//! moment it sends its confirm, without waiting for acknowledgment; the
//! server completes (and the registry promotes the connection) only after
//! verifying that confirm. Test authors should not model the two sides as
//! finishing simultaneously.
//!
//! State machines are sans-IO: operations return the encoded frame(s) for
//! the caller to submit to the transport, and decoded events to forward
//! upward. Each connection's state must be driven from a single logical
//! thread at a time; the chained cipher makes out-of-order processing
//! unrecoverable.

use crate::core::frame::{Frame, ENCRYPTED_HEADER_LEN};
use crate::crypto::{StreamCipher, BLOCK_SIZE};
use crate::error::{ChannelError, Result};

pub mod client;
pub mod registry;
pub mod server;


/// Fixed ASCII literal proving to the server that the client derived the
/// same final key/IV. Encrypted one-shot under the final pair.
pub const CONFIRM_LITERAL: &[u8] = b"SC_HANDSHAKE_CONFIRM";

/// Largest application payload that fits a reliable-channel frame.
///
/// One cipher block of padding headroom plus the Encrypted frame header are
/// reserved out of the transport's stated maximum, so no outbound buffer
/// this layer produces can ever exceed it.
pub fn max_payload_size(transport_max: usize) -> usize {
    transport_max.saturating_sub(BLOCK_SIZE + ENCRYPTED_HEADER_LEN)
}

/// Encrypt `payload` through the connection's stream cipher and frame it.
///
/// The length check happens before the cipher is touched: advancing the
/// chain for a frame that can never be sent would desynchronize the
/// connection permanently.
pub(crate) fn encode_encrypted(
    cipher: &mut StreamCipher,
    payload: &[u8],
    transport_max: usize,
) -> Result<Vec<u8>> {
    if payload.len() > max_payload_size(transport_max) {
        return Err(ChannelError::OversizedPacket(payload.len()));
    }
    let ciphertext = cipher.encrypt_next(payload);
    Ok(Frame::Encrypted {
        plaintext_len: payload.len() as u32,
        ciphertext,
    }
    .encode())
}

/// Decrypt an Encrypted frame's ciphertext in place and truncate the
/// padding away. Frame decoding has already validated the length fields.
pub(crate) fn decode_encrypted(
    cipher: &mut StreamCipher,
    plaintext_len: u32,
    mut ciphertext: Vec<u8>,
) -> Result<Vec<u8>> {
    cipher.decrypt_next(&mut ciphertext)?;
    ciphertext.truncate(plaintext_len as usize);
    Ok(ciphertext)
}

/// Frame an unencrypted passthrough payload, bounded by the transport max.
pub(crate) fn encode_unencrypted(payload: &[u8], transport_max: usize) -> Result<Vec<u8>> {
    let frame = Frame::Unencrypted(payload.to_vec()).encode();
    if frame.len() > transport_max {
        return Err(ChannelError::OversizedPacket(frame.len()));
    }
    Ok(frame)
}

/// Frame a handshake ciphertext, bounded by the transport max. An RSA-2048
/// hello is 256 bytes of ciphertext, so transports with very small packet
/// limits are rejected here rather than silently truncated.
pub(crate) fn encode_handshake(ciphertext: Vec<u8>, transport_max: usize) -> Result<Vec<u8>> {
    let frame = Frame::Handshake(ciphertext).encode();
    if frame.len() > transport_max {
        return Err(ChannelError::OversizedPacket(frame.len()));
    }
    Ok(frame)
}
