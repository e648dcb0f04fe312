//! # Cryptographic Adapters
//!
//! Wrappers around the asymmetric and symmetric primitives the handshake is
//! built from, plus the XOR key derivation that combines both sides' hello
//! material into the session secret.
//!
//! ## Components
//! - **Asymmetric**: RSA-2048 PKCS#1 v1.5 (key exchange bootstrap)
//! - **Symmetric**: AES-256-CBC, one-shot padded and streaming chained modes
//! - **Kdf**: bytewise-XOR merge of client and server hello pairs
//!
//! ## Security
//! - Cryptographically secure RNG (`OsRng`) for all key material
//! - Key/IV buffers are zeroed on drop (`zeroize`)
//! - Decryption failures are typed errors; corrupted ciphertext is never
//!   surfaced as accepted plaintext

pub mod asymmetric;
pub mod kdf;
pub mod symmetric;

/// AES block size in bytes; also the IV length.
pub const BLOCK_SIZE: usize = 16;

/// AES-256 key length in bytes.
pub const KEY_SIZE: usize = 32;

pub use symmetric::{KeyIv, StreamCipher};
