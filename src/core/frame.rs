//! # Encrypted Framing
//!
//! Opcode-tagged message encoding/decoding built on the byte codec.
//!
//! ## Wire Format
//! ```text
//! Handshake:   [0x00] [len(4)] [ciphertext(len)]
//! Encrypted:   [0x01] [plaintext_len(4)] [ct_len(4)] [ciphertext(ct_len)]
//! Unencrypted: [0x02] [len(4)] [payload(len)]
//! ```
//!
//! The Encrypted layout carries the original plaintext length alongside the
//! block-aligned ciphertext so the receiver can truncate the padding away
//! after decrypting.

use crate::core::codec::{ByteReader, ByteWriter};
use crate::crypto::BLOCK_SIZE;
use crate::error::{ChannelError, Result};

/// 1-byte tag identifying a message's role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Handshake = 0,
    Encrypted = 1,
    Unencrypted = 2,
}

impl TryFrom<u8> for Opcode {
    type Error = ChannelError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Opcode::Handshake),
            1 => Ok(Opcode::Encrypted),
            2 => Ok(Opcode::Unencrypted),
            other => Err(ChannelError::InvalidOpcode(other)),
        }
    }
}

/// A decoded wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Ciphertext of the current handshake step.
    Handshake(Vec<u8>),
    /// Block-aligned ciphertext plus the true plaintext length.
    Encrypted {
        plaintext_len: u32,
        ciphertext: Vec<u8>,
    },
    /// Raw passthrough payload (unreliable channel traffic).
    Unencrypted(Vec<u8>),
}

/// Fixed header bytes of an Encrypted frame: opcode + two length fields.
pub const ENCRYPTED_HEADER_LEN: usize = 1 + 4 + 4;

impl Frame {
    pub fn opcode(&self) -> Opcode {
        match self {
            Frame::Handshake(_) => Opcode::Handshake,
            Frame::Encrypted { .. } => Opcode::Encrypted,
            Frame::Unencrypted(_) => Opcode::Unencrypted,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let w = match self {
            Frame::Handshake(p) | Frame::Unencrypted(p) => {
                let mut w = ByteWriter::with_capacity(5 + p.len());
                w.write_u8(self.opcode() as u8);
                w.write_segment(p);
                w
            }
            Frame::Encrypted {
                plaintext_len,
                ciphertext,
            } => {
                let mut w = ByteWriter::with_capacity(ENCRYPTED_HEADER_LEN + ciphertext.len());
                w.write_u8(Opcode::Encrypted as u8);
                w.write_u32(*plaintext_len);
                w.write_segment(ciphertext);
                w
            }
        };
        w.into_vec()
    }

    pub fn decode(raw: &[u8]) -> Result<Frame> {
        let mut r = ByteReader::new(raw);
        let opcode = Opcode::try_from(r.read_u8()?)?;

        let frame = match opcode {
            Opcode::Handshake => Frame::Handshake(r.read_segment()?.to_vec()),
            Opcode::Unencrypted => Frame::Unencrypted(r.read_segment()?.to_vec()),
            Opcode::Encrypted => {
                let plaintext_len = r.read_u32()?;
                let ciphertext = r.read_segment()?.to_vec();
                validate_encrypted_lengths(plaintext_len, ciphertext.len())?;
                Frame::Encrypted {
                    plaintext_len,
                    ciphertext,
                }
            }
        };
        Ok(frame)
    }
}

/// The ciphertext of a streamed message is its plaintext extended to the
/// next block boundary; anything else is a framing violation.
fn validate_encrypted_lengths(plaintext_len: u32, ciphertext_len: usize) -> Result<()> {
    let expected = (plaintext_len as usize).div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
    if ciphertext_len != expected {
        return Err(ChannelError::LengthMismatch {
            plaintext: plaintext_len as usize,
            ciphertext: ciphertext_len,
        });
    }
    Ok(())
}
