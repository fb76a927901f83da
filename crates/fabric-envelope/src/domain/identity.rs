//! # Signing Identity
//!
//! An Ed25519 key pair together with the sequence counter it owns.

use super::errors::EnvelopeError;
use super::sequence::SequenceCounter;
use fabric_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use std::path::Path;

/// Sender identity: secret key, derived public key and sequence state.
#[derive(Debug)]
pub struct SigningIdentity {
    keypair: Ed25519KeyPair,
    public_key: Ed25519PublicKey,
    sequence: SequenceCounter,
}

impl SigningIdentity {
    /// Identity over an existing key pair with a fresh counter.
    pub fn new(keypair: Ed25519KeyPair) -> Self {
        let public_key = keypair.public_key();
        Self {
            keypair,
            public_key,
            sequence: SequenceCounter::new(),
        }
    }

    /// Identity over a freshly generated key pair.
    pub fn generate() -> Self {
        Self::new(Ed25519KeyPair::generate())
    }

    /// Identity from a 32-byte seed or 64-byte `seed || public_key`.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ed25519KeyPair::from_secret_bytes(bytes)
            .map(Self::new)
            .map_err(|e| EnvelopeError::InvalidKeyMaterial(e.to_string()))
    }

    /// Identity from a raw key file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EnvelopeError> {
        Ed25519KeyPair::from_file(path)
            .map(Self::new)
            .map_err(|e| EnvelopeError::InvalidKeyMaterial(e.to_string()))
    }

    /// Replace the counter, e.g. with one resumed from persisted state.
    #[must_use]
    pub fn with_sequence(mut self, sequence: SequenceCounter) -> Self {
        self.sequence = sequence;
        self
    }

    /// Public key.
    pub fn public_key(&self) -> &Ed25519PublicKey {
        &self.public_key
    }

    /// Public key as lower-case hex.
    pub fn public_key_hex(&self) -> String {
        self.public_key.to_hex()
    }

    /// Last sequence number issued, 0 if none.
    pub fn last_sequence(&self) -> u64 {
        self.sequence.last_issued()
    }

    pub(crate) fn next_sequence(&self) -> Result<u64, EnvelopeError> {
        self.sequence.next()
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Ed25519Signature {
        self.keypair.sign(message)
    }
}
