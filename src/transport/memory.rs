//! # In-Memory Transport
//!
//! A loopback transport pair for driving both ends of a secure channel in
//! one process: whatever one endpoint sends, the other receives in order.
//! This is the "simulated transport" the handshake and channel tests run
//! on; it enforces the configured maximum packet size like a real
//! transport would.

use crate::error::{ChannelError, Result};
use crate::transport::{ChannelId, MessageTransport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Queue = Arc<Mutex<VecDeque<(ChannelId, Vec<u8>)>>>;

/// One end of an in-memory duplex link.
pub struct MemoryEndpoint {
    outbound: Queue,
    inbound: Queue,
    max_packet_size: usize,
}

/// Create a connected pair of endpoints with a shared packet-size limit.
pub fn pair(max_packet_size: usize) -> (MemoryEndpoint, MemoryEndpoint) {
    let a_to_b: Queue = Arc::new(Mutex::new(VecDeque::new()));
    let b_to_a: Queue = Arc::new(Mutex::new(VecDeque::new()));

    let a = MemoryEndpoint {
        outbound: a_to_b.clone(),
        inbound: b_to_a.clone(),
        max_packet_size,
    };
    let b = MemoryEndpoint {
        outbound: b_to_a,
        inbound: a_to_b,
        max_packet_size,
    };
    (a, b)
}

impl MemoryEndpoint {
    /// Pop the next message delivered to this endpoint, if any.
    pub fn recv(&self) -> Option<(ChannelId, Vec<u8>)> {
        self.inbound.lock().ok()?.pop_front()
    }

    /// Number of messages waiting to be received.
    pub fn pending(&self) -> usize {
        self.inbound.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl MessageTransport for MemoryEndpoint {
    fn send(&mut self, channel: ChannelId, payload: &[u8]) -> Result<()> {
        if payload.len() > self.max_packet_size {
            return Err(ChannelError::OversizedPacket(payload.len()));
        }
        self.outbound
            .lock()
            .map_err(|_| ChannelError::TransportError("memory queue poisoned".into()))?
            .push_back((channel, payload.to_vec()));
        Ok(())
    }

    fn max_packet_size(&self, _channel: ChannelId) -> usize {
        self.max_packet_size
    }
}
