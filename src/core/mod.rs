//! # Core Wire Components
//!
//! Low-level byte codec and opcode-tagged framing.
//!
//! This module provides the foundation the handshake and the encrypted
//! channel are built on: checked primitive reads/writes and the three-opcode
//! wire format.
//!
//! ## Components
//! - **Codec**: bounds-checked reader/writer for bytes, u32s, and segments
//! - **Frame**: Handshake / Encrypted / Unencrypted message layouts
//!
//! ## Security
//! - Length validation before allocation
//! - Truncated or malformed buffers surface as typed errors, never panics

pub mod codec;
pub mod frame;
