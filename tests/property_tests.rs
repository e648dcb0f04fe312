#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Property-based tests using proptest
//!
//! These tests validate key-derivation algebra, framing round trips, and
//! stream-cipher behavior across a wide range of randomly generated inputs.

use proptest::prelude::*;
use secure_channel::core::frame::Frame;
use secure_channel::crypto::kdf::merge;
use secure_channel::crypto::symmetric::{
    decrypt_padded, encrypt_padded, KeyIv, StreamCipher,
};
use secure_channel::crypto::BLOCK_SIZE;

// Property: merge is commutative
proptest! {
    #[test]
    fn prop_merge_commutative(
        pair in prop::collection::vec((any::<u8>(), any::<u8>()), 1..256),
    ) {
        let (a, b): (Vec<u8>, Vec<u8>) = pair.into_iter().unzip();
        prop_assert_eq!(merge(&a, &b).unwrap(), merge(&b, &a).unwrap());
    }
}

// Property: merging twice with the same operand returns the original
proptest! {
    #[test]
    fn prop_merge_self_inverse(
        pair in prop::collection::vec((any::<u8>(), any::<u8>()), 1..256),
    ) {
        let (a, b): (Vec<u8>, Vec<u8>) = pair.into_iter().unzip();
        let merged = merge(&a, &b).unwrap();
        prop_assert_eq!(merge(&merged, &b).unwrap(), a);
    }
}

// Property: mismatched or empty inputs always fail
proptest! {
    #[test]
    fn prop_merge_rejects_bad_lengths(
        a in prop::collection::vec(any::<u8>(), 0..64),
        b in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        prop_assume!(a.len() != b.len() || a.is_empty());
        prop_assert!(merge(&a, &b).is_err());
    }
}

// Property: handshake and unencrypted frames round-trip any payload
proptest! {
    #[test]
    fn prop_frame_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..4096)) {
        let frame = Frame::Handshake(payload.clone());
        prop_assert_eq!(Frame::decode(&frame.encode()).unwrap(), frame);

        let frame = Frame::Unencrypted(payload);
        prop_assert_eq!(Frame::decode(&frame.encode()).unwrap(), frame);
    }
}

// Property: encrypted frames round-trip when the length pair is consistent
proptest! {
    #[test]
    fn prop_encrypted_frame_roundtrip(plaintext_len in 0usize..2048) {
        let ct_len = plaintext_len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        let frame = Frame::Encrypted {
            plaintext_len: plaintext_len as u32,
            ciphertext: vec![0x5A; ct_len],
        };
        prop_assert_eq!(Frame::decode(&frame.encode()).unwrap(), frame);
    }
}

// Property: one-shot padded encryption round-trips any payload
proptest! {
    #[test]
    fn prop_one_shot_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..512)) {
        let keys = KeyIv::random();
        let ct = encrypt_padded(&keys, &payload);
        prop_assert_eq!(ct.len() % BLOCK_SIZE, 0);
        prop_assert_eq!(decrypt_padded(&keys, &ct).unwrap(), payload);
    }
}

// Property: a whole randomly sized message sequence survives the chained
// cipher as long as order is preserved
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn prop_stream_sequence_roundtrip(
        lengths in prop::collection::vec(0usize..200, 1..20),
    ) {
        let keys = KeyIv::random();
        let mut tx = StreamCipher::new(&keys);
        let mut rx = StreamCipher::new(&keys);

        for (i, len) in lengths.into_iter().enumerate() {
            let payload: Vec<u8> = (0..len).map(|j| (i + j) as u8).collect();
            let mut ct = tx.encrypt_next(&payload);
            rx.decrypt_next(&mut ct).unwrap();
            ct.truncate(len);
            prop_assert_eq!(ct, payload);
        }
    }
}

// The padding region of a streamed message is always zero: a long message
// followed by a short one must not leak the long message's bytes into the
// short one's padding.
#[test]
fn stream_padding_is_zero_filled() {
    let keys = KeyIv::random();
    let mut tx = StreamCipher::new(&keys);
    let mut rx = StreamCipher::new(&keys);

    let mut long = tx.encrypt_next(&[0xAA; 160]);
    rx.decrypt_next(&mut long).unwrap();

    let short = b"abc";
    let mut ct = tx.encrypt_next(short);
    rx.decrypt_next(&mut ct).unwrap();

    assert_eq!(&ct[..short.len()], short);
    assert!(
        ct[short.len()..].iter().all(|&b| b == 0),
        "padding region must be zero, got {:?}",
        &ct[short.len()..]
    );
}
