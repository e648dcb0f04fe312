//! # Transport Boundary
//!
//! The secure channel sits on top of an existing message-oriented transport
//! that this crate does not implement: something that delivers discrete
//! byte messages over at least one reliable/ordered channel and one
//! unreliable channel, and reports connect/disconnect events per
//! connection.
//!
//! This module defines the identifiers and the collaborator contract, plus
//! two adapters at that boundary:
//! - [`memory`]: an in-process loopback pair for tests and examples
//! - [`tcp`]: a tokio TCP adapter exposing the reliable channel
//!
//! Only the reliable channel is confidentiality-protected by the layer
//! above; its ordered delivery is what makes the chained cipher sound.

use crate::error::Result;

pub mod memory;
pub mod tcp;

/// Identifies one inbound connection on the server side.
pub type ConnectionId = u64;

/// Identifies a delivery class of the underlying transport.
pub type ChannelId = u8;

/// The ordered, lossless channel. Encrypted traffic travels here.
pub const RELIABLE_CHANNEL: ChannelId = 0;

/// Best-effort delivery. Never encrypted; never protected.
pub const UNRELIABLE_CHANNEL: ChannelId = 1;

/// The outbound half of the transport contract, as seen from one endpoint.
///
/// `max_packet_size` is the transport's own limit; the secure layer derives
/// its usable payload budget from it (see [`crate::protocol`]).
pub trait MessageTransport {
    fn send(&mut self, channel: ChannelId, payload: &[u8]) -> Result<()>;
    fn max_packet_size(&self, channel: ChannelId) -> usize;
}

/// Receive-side notifications delivered by a transport adapter.
#[derive(Debug)]
pub enum TransportEvent {
    Connected(ConnectionId),
    Data {
        conn: ConnectionId,
        channel: ChannelId,
        payload: Vec<u8>,
    },
    Disconnected(ConnectionId),
}
