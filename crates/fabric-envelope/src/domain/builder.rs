//! # Envelope Builder
//!
//! Steps, in order:
//! 1. draw a 24-byte nonce
//! 2. serialize the AAD canonically (and encrypt, if a content key is given)
//! 3. take the next sequence number
//! 4. sign `aad || body`
//! 5. derive `msg_id = BLAKE3(pubkey || le64(seq) || nonce)`
//!
//! Everything that can fail on bad input happens before step 3, so a rejected
//! build never consumes a sequence number.

use super::aad::Aad;
use super::envelope::{signed_message, Envelope, EnvelopeParts};
use super::errors::EnvelopeError;
use super::identity::SigningIdentity;
use super::keys::ContentKey;
use fabric_crypto::{MessageId, Nonce, NONCE_LEN};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tracing::debug;

/// Optional AAD metadata for a send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Tenant scope
    pub tenant_id: Option<String>,
    /// Payload MIME type
    pub content_type: Option<String>,
}

impl SendOptions {
    /// No optional metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tenant id.
    #[must_use]
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    fn to_aad(&self, topic: &str, key_version: u32) -> Aad {
        Aad {
            topic: topic.to_string(),
            key_version,
            tenant_id: self.tenant_id.clone(),
            content_type: self.content_type.clone(),
        }
    }
}

/// Seals payloads into signed envelopes for one identity.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    identity: Arc<SigningIdentity>,
}

impl EnvelopeBuilder {
    /// Builder signing as `identity`.
    pub fn new(identity: Arc<SigningIdentity>) -> Self {
        Self { identity }
    }

    /// The signing identity.
    pub fn identity(&self) -> &Arc<SigningIdentity> {
        &self.identity
    }

    /// Seal a plaintext payload with a nonce from the OS CSPRNG.
    pub fn seal(
        &self,
        topic: &str,
        payload: &[u8],
        options: &SendOptions,
    ) -> Result<Envelope, EnvelopeError> {
        self.seal_with_nonce(*Nonce::generate().as_bytes(), topic, payload, options)
    }

    /// Seal a plaintext payload, drawing the nonce from `rng`.
    pub fn seal_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        topic: &str,
        payload: &[u8],
        options: &SendOptions,
    ) -> Result<Envelope, EnvelopeError> {
        self.seal_with_nonce(*Nonce::random(rng).as_bytes(), topic, payload, options)
    }

    /// Seal a plaintext payload under a caller-chosen nonce.
    ///
    /// The nonce must never repeat for this identity; this entry point exists
    /// for fixed test vectors.
    pub fn seal_with_nonce(
        &self,
        nonce: [u8; NONCE_LEN],
        topic: &str,
        payload: &[u8],
        options: &SendOptions,
    ) -> Result<Envelope, EnvelopeError> {
        let aad = options.to_aad(topic, 0);
        let aad_bytes = aad.to_canonical_bytes()?;
        self.finish(nonce, aad, aad_bytes, payload.to_vec())
    }

    /// Seal an end-to-end encrypted payload under `key`.
    ///
    /// The envelope nonce doubles as the AEAD nonce and the AAD bytes are the
    /// associated data. The payload becomes `ciphertext || tag` and the
    /// signature covers it.
    pub fn seal_encrypted(
        &self,
        topic: &str,
        plaintext: &[u8],
        options: &SendOptions,
        key: &ContentKey,
    ) -> Result<Envelope, EnvelopeError> {
        self.seal_encrypted_with_nonce(*Nonce::generate().as_bytes(), topic, plaintext, options, key)
    }

    /// [`seal_encrypted`](Self::seal_encrypted) under a caller-chosen nonce.
    pub fn seal_encrypted_with_nonce(
        &self,
        nonce: [u8; NONCE_LEN],
        topic: &str,
        plaintext: &[u8],
        options: &SendOptions,
        key: &ContentKey,
    ) -> Result<Envelope, EnvelopeError> {
        let aad = options.to_aad(topic, key.version());
        let aad_bytes = aad.to_canonical_bytes()?;

        let (mut body, tag) = fabric_crypto::encrypt(key.key_bytes(), &nonce, plaintext, &aad_bytes)
            .map_err(|e| EnvelopeError::EncodingError(e.to_string()))?;
        body.extend_from_slice(&tag);

        self.finish(nonce, aad, aad_bytes, body)
    }

    fn finish(
        &self,
        nonce: [u8; NONCE_LEN],
        aad: Aad,
        aad_bytes: Vec<u8>,
        body: Vec<u8>,
    ) -> Result<Envelope, EnvelopeError> {
        let seq = self.identity.next_sequence()?;
        let sig = self.identity.sign(&signed_message(&aad_bytes, &body));
        let pubkey = self.identity.public_key();
        let msg_id = MessageId::derive(pubkey.as_bytes(), seq, &nonce).to_hex();

        debug!(
            topic = %aad.topic,
            seq,
            msg_id = %msg_id,
            key_version = aad.key_version,
            "Envelope sealed"
        );

        Ok(Envelope::from_parts(EnvelopeParts {
            pubkey: pubkey.as_bytes().to_vec(),
            sig: sig.as_bytes().to_vec(),
            nonce: nonce.to_vec(),
            aad: aad_bytes,
            payload: body,
            seq,
            msg_id,
            key_version: aad.key_version,
            topic: aad.topic,
        }))
    }
}
