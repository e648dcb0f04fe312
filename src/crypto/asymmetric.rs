//! # Asymmetric Cipher Adapter
//!
//! Wraps RSA public-key encryption for the handshake bootstrap: the client
//! encrypts its hello key material under the server's public key, and only
//! the server (holding the private half) can recover it.
//!
//! Key pairs are provisioned out of band. [`KeyPair::generate`] produces
//! both halves; the PEM helpers exist so the private half can be stored
//! server-side and the public half shipped to clients. A client process
//! must never hold the private half.

use crate::error::{ChannelError, Result};
use rand::rngs::OsRng;
use rsa::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding,
};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use tracing::debug;

/// RSA modulus size. 2048 bits keeps the handshake frame comfortably under
/// common transport MTU-style limits while remaining adequate for session
/// bootstrap.
pub const RSA_KEY_BITS: usize = 2048;

/// A freshly generated or imported RSA key pair.
///
/// The private half is decrypt-capable and belongs exclusively to the
/// server; the public half is encrypt-only and is distributed to clients.
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl KeyPair {
    /// Generate a new key pair from the OS random source.
    pub fn generate() -> Result<Self> {
        let mut rng = OsRng;
        let private = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| ChannelError::InvalidKey(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        debug!(bits = RSA_KEY_BITS, "generated RSA key pair");
        Ok(Self { private, public })
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Export the private half as PKCS#8 PEM. Server-side storage only.
    pub fn private_key_pem(&self) -> Result<String> {
        self.private
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| ChannelError::InvalidKey(e.to_string()))
    }

    /// Export the public half as PEM for distribution to clients.
    pub fn public_key_pem(&self) -> Result<String> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| ChannelError::InvalidKey(e.to_string()))
    }

    /// Import a key pair from a PKCS#8 private-key PEM.
    pub fn from_private_key_pem(pem: &str) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| ChannelError::InvalidKey(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { private, public })
    }
}

/// Import just the public half from PEM (the client-side provisioning path).
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| ChannelError::InvalidKey(e.to_string()))
}

/// Encrypt a short payload under the peer's public key.
pub fn encrypt(public: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut rng = OsRng;
    public
        .encrypt(&mut rng, Pkcs1v15Encrypt, plaintext)
        .map_err(|_| ChannelError::EncryptionFailure)
}

/// Decrypt a payload with the private key. Fails with a typed error on a
/// mismatched key or corrupted ciphertext; never returns garbage as valid.
pub fn decrypt(private: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    private
        .decrypt(Pkcs1v15Encrypt, ciphertext)
        .map_err(|_| ChannelError::DecryptionFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn keypair() -> &'static KeyPair {
        static PAIR: OnceLock<KeyPair> = OnceLock::new();
        PAIR.get_or_init(|| KeyPair::generate().unwrap())
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let pair = keypair();
        let msg = b"hello key material";
        let ct = encrypt(pair.public_key(), msg).unwrap();
        assert_ne!(&ct[..], &msg[..]);
        let pt = decrypt(pair.private_key(), &ct).unwrap();
        assert_eq!(pt, msg);
    }

    #[test]
    fn mismatched_private_half_fails() {
        let pair = keypair();
        let other = KeyPair::generate().unwrap();
        let ct = encrypt(pair.public_key(), b"secret").unwrap();
        assert!(matches!(
            decrypt(other.private_key(), &ct),
            Err(ChannelError::DecryptionFailure)
        ));
    }

    #[test]
    fn pem_roundtrip_preserves_keys() {
        let pair = keypair();
        let private_pem = pair.private_key_pem().unwrap();
        let public_pem = pair.public_key_pem().unwrap();

        let restored = KeyPair::from_private_key_pem(&private_pem).unwrap();
        assert_eq!(restored.private_key(), pair.private_key());

        let public = public_key_from_pem(&public_pem).unwrap();
        assert_eq!(&public, pair.public_key());
    }
}
