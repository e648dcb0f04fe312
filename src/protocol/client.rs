//! Client side of the handshake and the established channel.
//!
//! One [`ClientChannel`] exists per connection to a server. It drives the
//! client half of the handshake (`Init → HandshakeCompleted`) and then owns
//! the connection's streaming cipher state.

use crate::core::frame::Frame;
use crate::crypto::symmetric::{self, KeyIv};
use crate::crypto::{asymmetric, kdf, StreamCipher};
use crate::error::{constants, ChannelError, Result};
use crate::protocol::{
    decode_encrypted, encode_encrypted, encode_handshake, encode_unencrypted, max_payload_size,
    CONFIRM_LITERAL,
};
use crate::transport::{ChannelId, RELIABLE_CHANNEL};
use rsa::RsaPublicKey;
use tracing::{debug, instrument, warn};

/// Client handshake progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Init,
    HandshakeCompleted,
}

/// Something the upper layer needs to know about, produced while processing
/// an inbound message.
#[derive(Debug)]
pub enum ClientEvent {
    /// The handshake finished locally. `confirm` must be transmitted on the
    /// reliable channel; the channel is usable immediately after.
    Connected { confirm: Vec<u8> },
    /// A decrypted (or passthrough) application payload.
    Message { payload: Vec<u8>, channel: ChannelId },
}

/// Client-side secure channel state machine.
pub struct ClientChannel {
    state: ClientState,
    server_public: RsaPublicKey,
    client_hello: Option<KeyIv>,
    cipher: Option<StreamCipher>,
    transport_max: usize,
}

impl ClientChannel {
    /// `transport_max` is the underlying transport's maximum packet size
    /// for the reliable channel.
    pub fn new(server_public: RsaPublicKey, transport_max: usize) -> Self {
        Self {
            state: ClientState::Init,
            server_public,
            client_hello: None,
            cipher: None,
            transport_max,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_established(&self) -> bool {
        self.state == ClientState::HandshakeCompleted
    }

    /// Largest payload `encode_send` accepts on the reliable channel.
    pub fn max_payload_size(&self) -> usize {
        max_payload_size(self.transport_max)
    }

    /// Generate the client hello and return the opening Handshake frame.
    ///
    /// Call once after the transport reports the connection open. State
    /// remains `Init` until the server's hello arrives.
    #[instrument(skip(self))]
    pub fn start_handshake(&mut self) -> Result<Vec<u8>> {
        let hello = KeyIv::random();
        let ciphertext = asymmetric::encrypt(&self.server_public, &hello.to_hello_bytes())?;
        self.client_hello = Some(hello);
        debug!("client hello generated, starting handshake");
        encode_handshake(ciphertext, self.transport_max)
    }

    /// Process one raw inbound message from the transport.
    ///
    /// Cipher and framing failures propagate as errors; the caller is
    /// expected to tear the connection down on any of them. Messages that
    /// merely do not apply to the current state are dropped.
    pub fn on_message(&mut self, raw: &[u8], channel: ChannelId) -> Result<Option<ClientEvent>> {
        match Frame::decode(raw)? {
            Frame::Handshake(payload) => self.on_server_hello(&payload),
            Frame::Encrypted {
                plaintext_len,
                ciphertext,
            } => {
                let Some(cipher) = self.cipher.as_mut() else {
                    // Encrypted traffic before completion is harmless noise.
                    debug!("dropping encrypted message before handshake completion");
                    return Ok(None);
                };
                let payload = decode_encrypted(cipher, plaintext_len, ciphertext)?;
                Ok(Some(ClientEvent::Message { payload, channel }))
            }
            Frame::Unencrypted(payload) => Ok(Some(ClientEvent::Message { payload, channel })),
        }
    }

    /// Handle the server hello: derive the final key/IV, build the
    /// streaming cipher, and complete the handshake optimistically.
    #[instrument(skip(self, payload))]
    fn on_server_hello(&mut self, payload: &[u8]) -> Result<Option<ClientEvent>> {
        if self.state != ClientState::Init {
            warn!("handshake message after completion, dropping");
            return Ok(None);
        }
        let client_hello = self
            .client_hello
            .as_ref()
            .ok_or_else(|| ChannelError::HandshakeError(constants::ERR_HANDSHAKE_NOT_STARTED.into()))?;

        let plain = symmetric::decrypt_padded(client_hello, payload)?;
        let server_hello = KeyIv::from_hello_bytes(&plain)?;

        let session = kdf::derive_session(client_hello, &server_hello);
        let confirm_ct = symmetric::encrypt_padded(&session, CONFIRM_LITERAL);
        self.cipher = Some(StreamCipher::new(&session));
        self.client_hello = None;

        // Completion is declared now, before the server has seen the
        // confirm. The upper layer may start sending immediately.
        self.state = ClientState::HandshakeCompleted;
        debug!("client handshake completed");

        let confirm = encode_handshake(confirm_ct, self.transport_max)?;
        Ok(Some(ClientEvent::Connected { confirm }))
    }

    /// Frame an outbound application payload.
    ///
    /// Reliable-channel sends are encrypted through the stream cipher and
    /// require a completed handshake. Sends on any other channel pass
    /// through unencrypted, even before completion.
    pub fn encode_send(&mut self, payload: &[u8], channel: ChannelId) -> Result<Vec<u8>> {
        if channel == RELIABLE_CHANNEL {
            if self.state != ClientState::HandshakeCompleted {
                return Err(ChannelError::HandshakeNotComplete);
            }
            let cipher = self
                .cipher
                .as_mut()
                .ok_or(ChannelError::HandshakeNotComplete)?;
            encode_encrypted(cipher, payload, self.transport_max)
        } else {
            encode_unencrypted(payload, self.transport_max)
        }
    }
}
