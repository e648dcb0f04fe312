#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Edge-case tests for the wire framing: malformed opcodes, truncated
//! length fields, and disagreeing length pairs must surface as typed
//! errors at the dispatch boundary, never as panics.

use secure_channel::core::codec::{ByteReader, ByteWriter};
use secure_channel::core::frame::{Frame, Opcode};
use secure_channel::crypto::asymmetric::KeyPair;
use secure_channel::error::ChannelError;
use secure_channel::protocol::registry::ConnectionRegistry;
use secure_channel::transport::RELIABLE_CHANNEL;
use std::sync::OnceLock;
use std::time::Duration;

fn keypair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| KeyPair::generate().expect("RSA keygen"))
}

// ============================================================================
// OPCODES
// ============================================================================

#[test]
fn opcode_values_match_wire_format() {
    assert_eq!(Opcode::Handshake as u8, 0);
    assert_eq!(Opcode::Encrypted as u8, 1);
    assert_eq!(Opcode::Unencrypted as u8, 2);
}

#[test]
fn every_unknown_opcode_is_rejected() {
    for byte in 3u8..=255 {
        let raw = [byte, 0, 0, 0, 0];
        assert!(
            matches!(Frame::decode(&raw), Err(ChannelError::InvalidOpcode(b)) if b == byte),
            "opcode {byte} must be rejected"
        );
    }
}

// ============================================================================
// TRUNCATION
// ============================================================================

#[test]
fn truncated_buffers_error_at_every_cut() {
    let full = Frame::Encrypted {
        plaintext_len: 20,
        ciphertext: vec![0xCD; 32],
    }
    .encode();

    for cut in 0..full.len() {
        let result = Frame::decode(&full[..cut]);
        assert!(
            matches!(result, Err(ChannelError::TruncatedMessage { .. })),
            "cut at {cut} must be a truncation error, got {result:?}"
        );
    }
    assert!(Frame::decode(&full).is_ok());
}

#[test]
fn segment_length_larger_than_buffer_is_truncation() {
    let mut w = ByteWriter::new();
    w.write_u8(Opcode::Handshake as u8);
    w.write_u32(u32::MAX);
    let raw = w.into_vec();
    assert!(matches!(
        Frame::decode(&raw),
        Err(ChannelError::TruncatedMessage { .. })
    ));
}

// ============================================================================
// LENGTH FIELD CONSISTENCY
// ============================================================================

#[test]
fn encrypted_length_pairs_must_agree() {
    // plaintext 20 → ciphertext must be exactly 32.
    for ct_len in [0usize, 16, 31, 33, 48] {
        let frame = Frame::Encrypted {
            plaintext_len: 20,
            ciphertext: vec![0; ct_len],
        };
        assert!(
            matches!(
                Frame::decode(&frame.encode()),
                Err(ChannelError::LengthMismatch { .. })
            ),
            "ciphertext length {ct_len} must be rejected"
        );
    }
}

#[test]
fn reader_is_exact_about_shortfall() {
    let mut r = ByteReader::new(&[1, 2, 3]);
    r.read_u8().unwrap();
    match r.read_u32() {
        Err(ChannelError::TruncatedMessage { needed, remaining }) => {
            assert_eq!(needed, 2);
            assert_eq!(remaining, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}

// ============================================================================
// DISPATCH BOUNDARY
// ============================================================================

#[test]
fn registry_survives_garbage_without_panicking() {
    let mut registry = ConnectionRegistry::new(
        keypair().private_key().clone(),
        4096,
        Duration::from_secs(10),
    );

    let garbage: &[&[u8]] = &[
        &[],
        &[0xFF],
        &[0x00],
        &[0x00, 0x10, 0x00, 0x00, 0x00],
        &[0x01, 0x05, 0x00, 0x00, 0x00, 0x10],
        &[0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0x01],
    ];
    for raw in garbage {
        // Every malformed buffer is a connection-scoped error or a silent
        // drop; the dispatch loop keeps running either way.
        let _ = registry.on_message(1, raw, RELIABLE_CHANNEL);
    }

    // A non-handshake frame from a stranger is dropped without state.
    assert_eq!(registry.pending_count(), 0);
    assert_eq!(registry.established_count(), 0);
}

#[test]
fn handshake_garbage_is_a_fatal_connection_error() {
    let mut registry = ConnectionRegistry::new(
        keypair().private_key().clone(),
        4096,
        Duration::from_secs(10),
    );

    // A well-framed handshake whose payload is not valid RSA ciphertext.
    let frame = Frame::Handshake(vec![0xAB; 256]).encode();
    let err = registry
        .on_message(1, &frame, RELIABLE_CHANNEL)
        .unwrap_err();
    assert!(matches!(err, ChannelError::DecryptionFailure));
    assert!(err.is_connection_fatal());

    // The caller disconnects; state is released.
    registry.on_disconnect(1);
    assert_eq!(registry.pending_count(), 0);
}
