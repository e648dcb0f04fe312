//! Server side of the handshake and the established channel.
//!
//! One [`ServerChannel`] exists per inbound connection identifier. The
//! registry creates it on the first handshake message from an unseen
//! connection and destroys it when the transport reports disconnection.

use crate::crypto::symmetric::{self, KeyIv};
use crate::crypto::{asymmetric, kdf, StreamCipher};
use crate::error::{ChannelError, Result};
use crate::protocol::{
    decode_encrypted, encode_encrypted, encode_handshake, encode_unencrypted, CONFIRM_LITERAL,
};
use crate::transport::{ChannelId, RELIABLE_CHANNEL};
use rsa::RsaPrivateKey;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Server handshake progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Init,
    WaitForClientConfirm,
    HandshakeCompleted,
}

/// Server-side secure channel state machine for one connection.
pub struct ServerChannel {
    state: ServerState,
    private: Arc<RsaPrivateKey>,
    session: Option<KeyIv>,
    cipher: Option<StreamCipher>,
    transport_max: usize,
    started_at: Instant,
}

impl ServerChannel {
    pub fn new(private: Arc<RsaPrivateKey>, transport_max: usize) -> Self {
        Self {
            state: ServerState::Init,
            private,
            session: None,
            cipher: None,
            transport_max,
            started_at: Instant::now(),
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn is_established(&self) -> bool {
        self.state == ServerState::HandshakeCompleted
    }

    /// How long ago this connection's handshake began. The registry uses
    /// this to reap handshakes that never complete.
    pub fn handshake_age(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Advance the handshake with one inbound Handshake payload.
    ///
    /// Returns the reply frame to transmit, if this step produces one.
    /// Completion is observable through [`Self::is_established`]. A confirm
    /// that does not match the expected literal leaves the state machine
    /// where it is and returns [`ChannelError::ConfirmMismatch`] so the
    /// caller can fail the connection instead of stalling silently.
    pub fn on_handshake(&mut self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.state {
            ServerState::Init => self.on_client_hello(payload).map(Some),
            ServerState::WaitForClientConfirm => {
                self.on_client_confirm(payload)?;
                Ok(None)
            }
            ServerState::HandshakeCompleted => {
                warn!("handshake message after completion, dropping");
                Ok(None)
            }
        }
    }

    /// Recover the client hello, answer with a fresh server hello, and
    /// derive the final key/IV.
    #[instrument(skip(self, payload))]
    fn on_client_hello(&mut self, payload: &[u8]) -> Result<Vec<u8>> {
        let plain = asymmetric::decrypt(&self.private, payload)?;
        let client_hello = KeyIv::from_hello_bytes(&plain)?;

        let server_hello = KeyIv::random();
        let session = kdf::derive_session(&client_hello, &server_hello);
        self.cipher = Some(StreamCipher::new(&session));

        // The server hello travels under the client-hello pair: only the
        // peer that generated it can read the reply.
        let reply_ct = symmetric::encrypt_padded(&client_hello, &server_hello.to_hello_bytes());
        self.session = Some(session);

        self.state = ServerState::WaitForClientConfirm;
        debug!("server hello sent, waiting for client confirm");
        encode_handshake(reply_ct, self.transport_max)
    }

    /// Verify the client's confirm against the fixed literal.
    #[instrument(skip(self, payload))]
    fn on_client_confirm(&mut self, payload: &[u8]) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or(ChannelError::UnexpectedMessage)?;
        let plain = symmetric::decrypt_padded(session, payload)?;
        if plain != CONFIRM_LITERAL {
            warn!("confirm literal mismatch");
            return Err(ChannelError::ConfirmMismatch);
        }
        self.state = ServerState::HandshakeCompleted;
        debug!("server handshake completed");
        Ok(())
    }

    /// Decrypt one Encrypted-opcode message from the established channel.
    pub fn decrypt_message(&mut self, plaintext_len: u32, ciphertext: Vec<u8>) -> Result<Vec<u8>> {
        let cipher = self
            .cipher
            .as_mut()
            .ok_or(ChannelError::HandshakeNotComplete)?;
        decode_encrypted(cipher, plaintext_len, ciphertext)
    }

    /// Frame an outbound application payload, as on the client side.
    pub fn encode_send(&mut self, payload: &[u8], channel: ChannelId) -> Result<Vec<u8>> {
        if channel == RELIABLE_CHANNEL {
            if self.state != ServerState::HandshakeCompleted {
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
