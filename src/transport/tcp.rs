//! # TCP Transport Adapter
//!
//! A tokio-based adapter satisfying the transport collaborator contract
//! over TCP, for running the secure channel against a real socket.
//!
//! TCP gives exactly one delivery class, so this adapter exposes only the
//! reliable/ordered channel ([`RELIABLE_CHANNEL`]); pair it with a
//! datagram transport if unreliable traffic is needed. Discrete messages
//! are preserved over the byte stream with a length-delimited codec.
//!
//! The accept loop hands each connection a monotonically increasing
//! connection id and delivers [`TransportEvent`]s through a single mpsc
//! channel, which keeps per-connection callbacks naturally serialized for
//! the consumer driving a [`crate::protocol::registry::ConnectionRegistry`].

use crate::error::{constants, ChannelError, Result};
use crate::transport::{ConnectionId, TransportEvent, RELIABLE_CHANNEL};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, error, info, warn};

/// Maximum framed message size this adapter accepts.
pub const TCP_MAX_PACKET_SIZE: usize = 64 * 1024;

/// Outbound queue depth per connection before backpressure.
const WRITE_QUEUE_DEPTH: usize = 64;

fn codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(TCP_MAX_PACKET_SIZE)
        .new_codec()
}

type Writers = Arc<Mutex<HashMap<ConnectionId, mpsc::Sender<Bytes>>>>;

/// Server end: accepts connections and multiplexes their traffic into one
/// event stream.
pub struct TcpServer {
    events: mpsc::Receiver<TransportEvent>,
    writers: Writers,
    local_addr: SocketAddr,
}

impl TcpServer {
    /// Bind a listener and start accepting in the background.
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "secure channel TCP transport listening");

        let (event_tx, events) = mpsc::channel(WRITE_QUEUE_DEPTH);
        let writers: Writers = Arc::new(Mutex::new(HashMap::new()));
        tokio::spawn(accept_loop(listener, event_tx, writers.clone()));

        Ok(Self {
            events,
            writers,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn max_packet_size(&self) -> usize {
        TCP_MAX_PACKET_SIZE
    }

    /// Next transport event; `None` once the accept loop has shut down.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    /// Queue a message to one connection on the reliable channel.
    pub async fn send_to(&self, conn: ConnectionId, payload: &[u8]) -> Result<()> {
        if payload.len() > TCP_MAX_PACKET_SIZE {
            return Err(ChannelError::OversizedPacket(payload.len()));
        }
        let writer = self
            .writers
            .lock()
            .map_err(|_| ChannelError::TransportError("writer table poisoned".into()))?
            .get(&conn)
            .cloned()
            .ok_or(ChannelError::UnknownConnection(conn))?;
        writer
            .send(Bytes::copy_from_slice(payload))
            .await
            .map_err(|_| ChannelError::ConnectionClosed)
    }
}

async fn accept_loop(
    listener: TcpListener,
    event_tx: mpsc::Sender<TransportEvent>,
    writers: Writers,
) {
    let mut next_id: ConnectionId = 1;
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let conn = next_id;
                next_id += 1;
                debug!(conn, %peer, "connection accepted");

                let (sink, read) = Framed::new(stream, codec()).split();
                let (write_tx, write_rx) = mpsc::channel::<Bytes>(WRITE_QUEUE_DEPTH);
                if let Ok(mut table) = writers.lock() {
                    table.insert(conn, write_tx);
                }
                if event_tx.send(TransportEvent::Connected(conn)).await.is_err() {
                    return;
                }

                tokio::spawn(write_loop(sink, write_rx));
                tokio::spawn(read_loop(conn, read, event_tx.clone(), writers.clone()));
            }
            Err(e) => {
                error!(error = %e, "error accepting connection");
            }
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<Framed<TcpStream, LengthDelimitedCodec>, Bytes>,
    mut write_rx: mpsc::Receiver<Bytes>,
) {
    while let Some(buf) = write_rx.recv().await {
        if let Err(e) = sink.send(buf).await {
            warn!(error = %e, "write failed, closing connection");
            break;
        }
    }
}

async fn read_loop(
    conn: ConnectionId,
    mut read: SplitStream<Framed<TcpStream, LengthDelimitedCodec>>,
    event_tx: mpsc::Sender<TransportEvent>,
    writers: Writers,
) {
    while let Some(item) = read.next().await {
        match item {
            Ok(frame) => {
                let event = TransportEvent::Data {
                    conn,
                    channel: RELIABLE_CHANNEL,
                    payload: frame.to_vec(),
                };
                if event_tx.send(event).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!(conn, error = %e, "read failed, closing connection");
                break;
            }
        }
    }
    if let Ok(mut table) = writers.lock() {
        table.remove(&conn);
    }
    let _ = event_tx.send(TransportEvent::Disconnected(conn)).await;
    debug!(conn, "connection closed");
}

/// Client end: one framed connection to a server.
pub struct TcpClient {
    sink: SplitSink<Framed<TcpStream, LengthDelimitedCodec>, Bytes>,
    read: SplitStream<Framed<TcpStream, LengthDelimitedCodec>>,
}

impl TcpClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (sink, read) = Framed::new(stream, codec()).split();
        Ok(Self { sink, read })
    }

    pub fn max_packet_size(&self) -> usize {
        TCP_MAX_PACKET_SIZE
    }

    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > TCP_MAX_PACKET_SIZE {
            return Err(ChannelError::OversizedPacket(payload.len()));
        }
        self.sink
            .send(Bytes::copy_from_slice(payload))
            .await
            .map_err(ChannelError::Io)
    }

    /// Next inbound message; `None` when the server closed the connection.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        match self.read.next().await {
            None => Ok(None),
            Some(Ok(frame)) => Ok(Some(frame.to_vec())),
            Some(Err(e)) => Err(ChannelError::TransportError(format!(
                "{}: {e}",
                constants::ERR_TRANSPORT_CHANNEL
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loopback_messages_flow_both_ways() {
        let mut server = TcpServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().to_string();

        let mut client = TcpClient::connect(&addr).await.unwrap();

        let conn = match server.next_event().await.unwrap() {
            TransportEvent::Connected(conn) => conn,
            other => panic!("expected Connected, got {other:?}"),
        };

        client.send(b"ping").await.unwrap();
        match server.next_event().await.unwrap() {
            TransportEvent::Data { payload, .. } => assert_eq!(payload, b"ping"),
            other => panic!("expected Data, got {other:?}"),
        }

        server.send_to(conn, b"pong").await.unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), b"pong");

        drop(client);
        match server.next_event().await.unwrap() {
            TransportEvent::Disconnected(id) => assert_eq!(id, conn),
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }
}
