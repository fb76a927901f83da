//! # Envelope
//!
//! The signed, identified, transport-ready unit carrying one message.
//! Fields are read-only once built; a receiver that needs to inspect or forward
//! raw bytes goes through [`EnvelopeParts`].

use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// A signed envelope as it travels over the fabric.
///
/// Byte fields are held as received, so a malformed envelope can still be
/// represented and rejected by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EnvelopeParts", into = "EnvelopeParts")]
pub struct Envelope {
    pubkey: Vec<u8>,
    sig: Vec<u8>,
    nonce: Vec<u8>,
    aad: Vec<u8>,
    payload: Vec<u8>,
    seq: u64,
    msg_id: String,
    key_version: u32,
    topic: String,
}

/// Owned field set of an [`Envelope`], and its JSON wire form.
///
/// Byte fields serialize as lower-case hex.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeParts {
    /// Sender's Ed25519 public key (32 bytes)
    #[serde_as(as = "Hex")]
    pub pubkey: Vec<u8>,
    /// Ed25519 signature over `aad || payload` (64 bytes)
    #[serde_as(as = "Hex")]
    pub sig: Vec<u8>,
    /// Per-message nonce (24 bytes)
    #[serde_as(as = "Hex")]
    pub nonce: Vec<u8>,
    /// Canonical AAD bytes
    #[serde_as(as = "Hex")]
    pub aad: Vec<u8>,
    /// Plaintext, or `ciphertext || tag` when `key_version > 0`
    #[serde_as(as = "Hex")]
    pub payload: Vec<u8>,
    /// Sender sequence number
    pub seq: u64,
    /// Hex message id
    pub msg_id: String,
    /// Content key version, 0 for plaintext
    pub key_version: u32,
    /// Routing topic
    pub topic: String,
}

impl From<EnvelopeParts> for Envelope {
    fn from(parts: EnvelopeParts) -> Self {
        Self {
            pubkey: parts.pubkey,
            sig: parts.sig,
            nonce: parts.nonce,
            aad: parts.aad,
            payload: parts.payload,
            seq: parts.seq,
            msg_id: parts.msg_id,
            key_version: parts.key_version,
            topic: parts.topic,
        }
    }
}

impl From<Envelope> for EnvelopeParts {
    fn from(envelope: Envelope) -> Self {
        envelope.into_parts()
    }
}

impl Envelope {
    /// Reassemble from raw parts.
    pub fn from_parts(parts: EnvelopeParts) -> Self {
        parts.into()
    }

    /// Take the envelope apart.
    pub fn into_parts(self) -> EnvelopeParts {
        EnvelopeParts {
            pubkey: self.pubkey,
            sig: self.sig,
            nonce: self.nonce,
            aad: self.aad,
            payload: self.payload,
            seq: self.seq,
            msg_id: self.msg_id,
            key_version: self.key_version,
            topic: self.topic,
        }
    }

    /// Sender public key bytes.
    pub fn pubkey(&self) -> &[u8] {
        &self.pubkey
    }

    /// Signature bytes.
    pub fn sig(&self) -> &[u8] {
        &self.sig
    }

    /// Nonce bytes.
    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    /// Canonical AAD bytes.
    pub fn aad(&self) -> &[u8] {
        &self.aad
    }

    /// Payload bytes (ciphertext and tag when encrypted).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Sender sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Hex message id.
    pub fn msg_id(&self) -> &str {
        &self.msg_id
    }

    /// Content key version.
    pub fn key_version(&self) -> u32 {
        self.key_version
    }

    /// Routing topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// True if the payload is end-to-end encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.key_version != 0
    }

    /// Bytes covered by the signature.
    pub fn signed_message(&self) -> Vec<u8> {
        signed_message(&self.aad, &self.payload)
    }
}

pub(crate) fn signed_message(aad: &[u8], body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(aad.len() + body.len());
    message.extend_from_slice(aad);
    message.extend_from_slice(body);
    message
}
