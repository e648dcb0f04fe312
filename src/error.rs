//! # Error Types
//!
//! Comprehensive error handling for the secure channel layer.
//!
//! This module defines all error variants that can occur while establishing
//! or operating a secure channel, from malformed wire data to cryptographic
//! failures and protocol-state violations.
//!
//! ## Error Categories
//! - **Framing Errors**: Malformed opcodes, truncated length fields, oversized frames
//! - **Cryptographic Errors**: Encryption/decryption failures, bad key material
//! - **Protocol Errors**: Messages received in a state that does not expect them
//! - **I/O Errors**: Transport and file system failures
//!
//! Errors raised while decoding an inbound message are connection-scoped:
//! they must never crash the dispatch loop, and the caller is expected to
//! disconnect the affected connection rather than retry.
//!
//! All errors implement `std::error::Error` for interoperability.

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
/// Static strings are borrowed, avoiding heap allocations for common error cases.
pub mod constants {
    /// Handshake sequencing errors
    pub const ERR_HANDSHAKE_NOT_STARTED: &str = "Handshake has not been started";
    pub const ERR_HELLO_LENGTH: &str = "Hello payload has wrong length";

    /// Connection errors
    pub const ERR_TRANSPORT_CHANNEL: &str = "Transport channel closed";
}

/// Primary error type for all secure channel operations.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Truncated message: needed {needed} more bytes, {remaining} remaining")]
    TruncatedMessage { needed: usize, remaining: usize },

    #[error("Invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),

    #[error("Frame too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("Length fields disagree: plaintext {plaintext} vs ciphertext {ciphertext}")]
    LengthMismatch { plaintext: usize, ciphertext: usize },

    #[error("Encryption failed")]
    EncryptionFailure,

    #[error("Decryption failed")]
    DecryptionFailure,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Key halves differ in length: {left} vs {right}")]
    KeyLengthMismatch { left: usize, right: usize },

    #[error("Handshake failed: {0}")]
    HandshakeError(String),

    #[error("Confirm literal mismatch")]
    ConfirmMismatch,

    #[error("Handshake not complete")]
    HandshakeNotComplete,

    #[error("Unknown connection: {0}")]
    UnknownConnection(u64),

    #[error("Unexpected message for current state")]
    UnexpectedMessage,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ChannelError {
    /// Whether the affected connection should be torn down by the caller.
    ///
    /// Framing and cryptographic failures poison the connection (a chained
    /// cipher cannot recover from a bad message); configuration and lookup
    /// errors do not.
    pub fn is_connection_fatal(&self) -> bool {
        !matches!(
            self,
            ChannelError::ConfigError(_)
                | ChannelError::UnknownConnection(_)
                | ChannelError::HandshakeNotComplete
        )
    }
}

/// Type alias for Results using ChannelError
pub type Result<T> = std::result::Result<T, ChannelError>;
