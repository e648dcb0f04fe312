//! # Secure Channel
//!
//! A secure-channel layer that upgrades an existing, unauthenticated,
//! message-oriented transport into a confidential, tamper-resistant channel
//! without changing the transport's send/receive contract.
//!
//! The underlying transport must deliver discrete byte messages over at
//! least one reliable/ordered channel and may offer additional unreliable
//! channels. This crate supplies everything on top: a 3-message RSA/AES
//! handshake per connection, XOR derivation of the session key, and a
//! persistent block-chained cipher protecting every subsequent
//! reliable-channel message, multiplexed across many concurrent peer
//! connections on the server side.
//!
//! ## Architecture
//! ```text
//! application payloads
//!         │
//! ┌───────▼────────────────────────────────────────────┐
//! │ protocol: ClientChannel / ServerChannel / Registry │
//! │   handshake state machines + streaming cipher      │
//! ├────────────────────────────────────────────────────┤
//! │ crypto: RSA adapter, AES-CBC adapter, XOR kdf      │
//! ├────────────────────────────────────────────────────┤
//! │ core: byte codec + opcode framing                  │
//! └───────┬────────────────────────────────────────────┘
//!         │ opaque byte messages
//!   underlying transport (provided by the caller)
//! ```
//!
//! ## Quick Start
//! ```no_run
//! use secure_channel::crypto::asymmetric::KeyPair;
//! use secure_channel::protocol::client::ClientChannel;
//! use secure_channel::protocol::registry::ConnectionRegistry;
//! use std::time::Duration;
//!
//! # fn main() -> secure_channel::error::Result<()> {
//! // Provisioning (out of band): private half to the server only.
//! let pair = KeyPair::generate()?;
//!
//! // Server side, one registry for all connections.
//! let mut registry = ConnectionRegistry::new(
//!     pair.private_key().clone(),
//!     16 * 1024,
//!     Duration::from_secs(10),
//! );
//!
//! // Client side, one channel per connection.
//! let mut client = ClientChannel::new(pair.public_key().clone(), 16 * 1024);
//! let hello = client.start_handshake()?;
//! // ... submit `hello` to the transport, feed inbound messages to
//! // `client.on_message` / `registry.on_message`, and transmit whatever
//! // frames they return ...
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees and Limits
//! - Confidentiality and tamper-evidence for reliable-channel traffic after
//!   handshake completion; unreliable channels pass through untouched.
//! - No peer identity beyond possession of the matching key half, no key
//!   rotation within a session, no replay protection across sessions.
//! - Encrypted messages must be applied in send order on each side; the
//!   reliable channel's ordering guarantee is load-bearing.

pub mod config;
pub mod core;
pub mod crypto;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use config::ChannelConfig;
pub use error::{ChannelError, Result};
pub use protocol::client::{ClientChannel, ClientEvent};
pub use protocol::registry::{ConnectionRegistry, ServerEvent};
pub use protocol::server::{ServerChannel, ServerState};
