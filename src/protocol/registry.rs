//! # Connection Registry
//!
//! Server-side bookkeeping for many concurrent secure channels: maps
//! transport connection identifiers to in-progress and completed handshake
//! states, and routes inbound messages to the right state machine.
//!
//! A connection id lives in at most one of the two maps. It moves from
//! pending to established exactly once, at the moment the client's confirm
//! verifies, and is removed from whichever map holds it when the transport
//! reports disconnection.
//!
//! The registry is a plain owned value: it assumes all calls arrive from a
//! single dispatch path. Parallel dispatch across connections requires
//! wrapping it in external mutual exclusion.

use crate::core::frame::Frame;
use crate::error::{ChannelError, Result};
use crate::protocol::server::ServerChannel;
use crate::transport::{ChannelId, ConnectionId};
use rsa::RsaPrivateKey;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Notifications for the layer above, produced while processing inbound
/// messages.
#[derive(Debug)]
pub enum ServerEvent {
    /// A handshake step produced a reply; transmit `frame` to `conn` on the
    /// reliable channel.
    Reply { conn: ConnectionId, frame: Vec<u8> },
    /// The connection's handshake completed and it is now established.
    Connected(ConnectionId),
    /// A decrypted (or passthrough) application payload.
    Message {
        conn: ConnectionId,
        payload: Vec<u8>,
        channel: ChannelId,
    },
}

/// Registry of per-connection secure channel state.
pub struct ConnectionRegistry {
    private: Arc<RsaPrivateKey>,
    transport_max: usize,
    handshake_timeout: Duration,
    pending: HashMap<ConnectionId, ServerChannel>,
    established: HashMap<ConnectionId, ServerChannel>,
}

impl ConnectionRegistry {
    pub fn new(
        private: RsaPrivateKey,
        transport_max: usize,
        handshake_timeout: Duration,
    ) -> Self {
        Self {
            private: Arc::new(private),
            transport_max,
            handshake_timeout,
            pending: HashMap::new(),
            established: HashMap::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn established_count(&self) -> usize {
        self.established.len()
    }

    pub fn is_established(&self, conn: ConnectionId) -> bool {
        self.established.contains_key(&conn)
    }

    /// Process one raw inbound message from the transport.
    ///
    /// Errors are connection-scoped: on `Err` the caller should disconnect
    /// `conn` (which calls back into [`Self::on_disconnect`]). The dispatch
    /// loop itself never needs to stop.
    pub fn on_message(
        &mut self,
        conn: ConnectionId,
        raw: &[u8],
        channel: ChannelId,
    ) -> Result<Option<ServerEvent>> {
        match Frame::decode(raw)? {
            Frame::Handshake(payload) => self.on_handshake(conn, &payload),
            Frame::Encrypted {
                plaintext_len,
                ciphertext,
            } => {
                let Some(state) = self.established.get_mut(&conn) else {
                    // Encrypted traffic for an unestablished id is dropped.
                    debug!(conn, "dropping encrypted message from unestablished connection");
                    return Ok(None);
                };
                let payload = state.decrypt_message(plaintext_len, ciphertext)?;
                Ok(Some(ServerEvent::Message {
                    conn,
                    payload,
                    channel,
                }))
            }
            Frame::Unencrypted(payload) => {
                if !self.established.contains_key(&conn) {
                    debug!(conn, "dropping unencrypted message from unestablished connection");
                    return Ok(None);
                }
                Ok(Some(ServerEvent::Message {
                    conn,
                    payload,
                    channel,
                }))
            }
        }
    }

    /// Route a Handshake-opcode payload, creating pending state for unseen
    /// connection ids and promoting to established on completion.
    fn on_handshake(
        &mut self,
        conn: ConnectionId,
        payload: &[u8],
    ) -> Result<Option<ServerEvent>> {
        if self.established.contains_key(&conn) {
            warn!(conn, "handshake message on established connection, dropping");
            return Ok(None);
        }

        let state = self.pending.entry(conn).or_insert_with(|| {
            debug!(conn, "new pending connection");
            ServerChannel::new(self.private.clone(), self.transport_max)
        });

        let reply = state.on_handshake(payload)?;
        if let Some(frame) = reply {
            return Ok(Some(ServerEvent::Reply { conn, frame }));
        }

        if state.is_established() {
            // Promotion happens exactly once, on this transition.
            if let Some(state) = self.pending.remove(&conn) {
                self.established.insert(conn, state);
            }
            info!(conn, "connection established");
            return Ok(Some(ServerEvent::Connected(conn)));
        }
        Ok(None)
    }

    /// Frame an outbound payload for an established connection.
    pub fn encode_send(
        &mut self,
        conn: ConnectionId,
        payload: &[u8],
        channel: ChannelId,
    ) -> Result<Vec<u8>> {
        if let Some(state) = self.established.get_mut(&conn) {
            return state.encode_send(payload, channel);
        }
        if self.pending.contains_key(&conn) {
            return Err(ChannelError::HandshakeNotComplete);
        }
        Err(ChannelError::UnknownConnection(conn))
    }

    /// Drop all state for a connection, releasing its cipher contexts.
    /// Returns whether the id was known.
    pub fn on_disconnect(&mut self, conn: ConnectionId) -> bool {
        let known = self.pending.remove(&conn).is_some()
            | self.established.remove(&conn).is_some();
        if known {
            debug!(conn, "connection state released");
        }
        known
    }

    /// Remove pending handshakes older than the configured timeout and
    /// return their ids so the caller can disconnect them. The original
    /// protocol had no timeout; without this sweep a peer that never
    /// confirms would occupy pending state until transport disconnect.
    pub fn prune_stalled(&mut self) -> Vec<ConnectionId> {
        let timeout = self.handshake_timeout;
        let stalled: Vec<ConnectionId> = self
            .pending
            .iter()
            .filter(|(_, state)| state.handshake_age() > timeout)
            .map(|(conn, _)| *conn)
            .collect();
        for conn in &stalled {
            warn!(conn, "pruning stalled handshake");
            self.pending.remove(conn);
        }
        stalled
    }
}
