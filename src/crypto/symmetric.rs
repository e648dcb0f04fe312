//! # Symmetric Cipher Adapter
//!
//! AES-256-CBC in the two shapes the protocol needs:
//!
//! - **One-shot padded**: a fresh cipher instance per call with PKCS#7
//!   padding, used for the individual handshake payloads.
//! - **Streaming chained**: a persistent, state-carrying [`StreamCipher`]
//!   with no padding, created once at handshake completion. Every block it
//!   transforms depends on the cipher state accumulated from prior
//!   messages, so both sides must apply messages in the exact order they
//!   were produced.
//!
//! Streamed plaintexts are copied into a fresh zero-filled buffer extended
//! to the next block boundary before encryption, so padding bytes can never
//! carry a previous message's plaintext.

use crate::crypto::{BLOCK_SIZE, KEY_SIZE};
use crate::error::{ChannelError, Result};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// A symmetric key/IV pair. Three of these exist per connection during the
/// handshake: client-hello, server-hello, and the derived final pair.
///
/// Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyIv {
    pub(crate) key: [u8; KEY_SIZE],
    pub(crate) iv: [u8; BLOCK_SIZE],
}

impl KeyIv {
    pub fn new(key: [u8; KEY_SIZE], iv: [u8; BLOCK_SIZE]) -> Self {
        Self { key, iv }
    }

    /// Generate a fresh pair from the OS random source.
    pub fn random() -> Self {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; BLOCK_SIZE];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    /// Parse the wire layout `IV ‖ Key` of a hello payload.
    pub fn from_hello_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() != BLOCK_SIZE + KEY_SIZE {
            return Err(ChannelError::HandshakeError(
                crate::error::constants::ERR_HELLO_LENGTH.into(),
            ));
        }
        let mut iv = [0u8; BLOCK_SIZE];
        let mut key = [0u8; KEY_SIZE];
        iv.copy_from_slice(&buf[..BLOCK_SIZE]);
        key.copy_from_slice(&buf[BLOCK_SIZE..]);
        Ok(Self { key, iv })
    }

    /// Serialize as `IV ‖ Key` for a hello payload. The buffer is zeroed
    /// when dropped; it only exists long enough to be encrypted.
    pub fn to_hello_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut buf = Vec::with_capacity(BLOCK_SIZE + KEY_SIZE);
        buf.extend_from_slice(&self.iv);
        buf.extend_from_slice(&self.key);
        Zeroizing::new(buf)
    }

    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; BLOCK_SIZE] {
        &self.iv
    }
}

// Debug without leaking key material.
impl std::fmt::Debug for KeyIv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyIv(..)")
    }
}

/// One-shot CBC encrypt with PKCS#7 padding. Used for handshake payloads.
pub fn encrypt_padded(keys: &KeyIv, plaintext: &[u8]) -> Vec<u8> {
    let cipher = Aes256CbcEnc::new(&keys.key.into(), &keys.iv.into());
    cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// One-shot CBC decrypt with PKCS#7 padding. A wrong key or corrupted
/// ciphertext surfaces as [`ChannelError::DecryptionFailure`].
pub fn decrypt_padded(keys: &KeyIv, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256CbcDec::new(&keys.key.into(), &keys.iv.into());
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| ChannelError::DecryptionFailure)
}

/// The persistent chained cipher state for an established connection.
///
/// Created once from the final key/IV and never reset or re-keyed: block
/// *n* of any message depends on block *n−1* of the stream so far. Exclusive
/// ownership and strictly serialized access per connection are required;
/// out-of-order or dropped messages desynchronize the two ends permanently.
pub struct StreamCipher {
    encryptor: Aes256CbcEnc,
    decryptor: Aes256CbcDec,
}

impl StreamCipher {
    pub fn new(keys: &KeyIv) -> Self {
        Self {
            encryptor: Aes256CbcEnc::new(&keys.key.into(), &keys.iv.into()),
            decryptor: Aes256CbcDec::new(&keys.key.into(), &keys.iv.into()),
        }
    }

    /// Encrypt the next message in the stream.
    ///
    /// The plaintext is copied into a fresh zero-filled buffer rounded up to
    /// the block size; the caller transmits the true length alongside the
    /// ciphertext. A zero-length plaintext produces a zero-length
    /// ciphertext and leaves the chain untouched.
    pub fn encrypt_next(&mut self, plaintext: &[u8]) -> Vec<u8> {
        let padded_len = plaintext.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        let mut buf = vec![0u8; padded_len];
        buf[..plaintext.len()].copy_from_slice(plaintext);
        for block in buf.chunks_exact_mut(BLOCK_SIZE) {
            self.encryptor
                .encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        buf
    }

    /// Decrypt the next message in the stream, in place. The caller
    /// truncates to the transmitted plaintext length afterwards.
    pub fn decrypt_next(&mut self, ciphertext: &mut [u8]) -> Result<()> {
        if ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(ChannelError::DecryptionFailure);
        }
        for block in ciphertext.chunks_exact_mut(BLOCK_SIZE) {
            self.decryptor
                .decrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }
}
