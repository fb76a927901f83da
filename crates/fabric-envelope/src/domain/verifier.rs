//! # Envelope Verifier
//!
//! Receiver side of the protocol. Checks run in this order and the first
//! failure is returned:
//!
//! 1. `seq != 0`
//! 2. field lengths (pubkey 32, sig 64, nonce 24) and optional sender allow-list
//! 3. AAD is canonical and agrees with `topic` / `key_version`
//! 4. `msg_id` recomputes
//! 5. replay window check (read-only)
//! 6. Ed25519 signature over `aad || payload`
//! 7. replay window commit
//!
//! Only authenticated envelopes reach the window, so forgeries cannot consume
//! a sender's sequence numbers.
//!
//! At most `max_senders` windows are kept. Once full, envelopes from unseen
//! senders are rejected with `SenderLimit`; existing windows are never
//! evicted, since a fresh window would re-admit old sequence numbers.

use super::aad::Aad;
use super::envelope::Envelope;
use super::errors::{AuthFailure, EnvelopeError, ReplayReason};
use super::keys::ContentKeyring;
use super::replay::{ReplayFilter, DEFAULT_WINDOW_SIZE};
use fabric_crypto::{Ed25519PublicKey, Ed25519Signature, MessageId, NONCE_LEN, TAG_LEN};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use tracing::{debug, warn};

/// Default cap on distinct senders tracked by one verifier.
pub const DEFAULT_MAX_SENDERS: usize = 10_000;

/// Receiver-side settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Replay window per sender; zero is unrepresentable
    pub window_size: NonZeroUsize,
    /// Distinct senders with a replay window
    #[serde(default = "default_max_senders")]
    pub max_senders: NonZeroUsize,
}

fn default_max_senders() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(DEFAULT_MAX_SENDERS - 1)
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            window_size: NonZeroUsize::MIN.saturating_add(DEFAULT_WINDOW_SIZE - 1),
            max_senders: default_max_senders(),
        }
    }
}

/// An envelope that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEnvelope {
    sender: Ed25519PublicKey,
    seq: u64,
    msg_id: MessageId,
    aad: Aad,
    aad_bytes: Vec<u8>,
    nonce: [u8; NONCE_LEN],
    payload: Vec<u8>,
}

impl VerifiedEnvelope {
    /// Authenticated sender.
    pub fn sender(&self) -> &Ed25519PublicKey {
        &self.sender
    }

    /// Sender sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Message id.
    pub fn msg_id(&self) -> &MessageId {
        &self.msg_id
    }

    /// Decoded AAD.
    pub fn aad(&self) -> &Aad {
        &self.aad
    }

    /// Routing topic.
    pub fn topic(&self) -> &str {
        &self.aad.topic
    }

    /// True if the payload needs [`decrypt`](Self::decrypt).
    pub fn is_encrypted(&self) -> bool {
        self.aad.key_version != 0
    }

    /// Raw payload as signed (ciphertext and tag when encrypted).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume, returning the raw payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Recover the plaintext.
    ///
    /// Plaintext envelopes return their payload unchanged. Encrypted ones
    /// need the content key named by `key_version`.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyMaterial` if the keyring lacks the key version
    /// - `AuthenticationFailed(AeadTag)` if the tag does not authenticate
    pub fn decrypt(&self, keyring: &ContentKeyring) -> Result<Vec<u8>, EnvelopeError> {
        let version = self.aad.key_version;
        if version == 0 {
            return Ok(self.payload.clone());
        }

        let key = keyring.get(version).ok_or_else(|| {
            EnvelopeError::InvalidKeyMaterial(format!("no content key for version {version}"))
        })?;
        let split = self
            .payload
            .len()
            .checked_sub(TAG_LEN)
            .ok_or(EnvelopeError::AuthenticationFailed(AuthFailure::AeadTag))?;
        let (ciphertext, tag) = self.payload.split_at(split);

        fabric_crypto::decrypt(key.key_bytes(), &self.nonce, ciphertext, &self.aad_bytes, tag)
            .map_err(|_| {
                warn!(
                    msg_id = %self.msg_id,
                    key_version = version,
                    "Payload failed AEAD authentication"
                );
                EnvelopeError::AuthenticationFailed(AuthFailure::AeadTag)
            })
    }
}

/// Stateful verifier holding one replay window per sender.
#[derive(Debug)]
pub struct EnvelopeVerifier {
    config: ReceiverConfig,
    trusted: Option<HashSet<Ed25519PublicKey>>,
    windows: Mutex<HashMap<Ed25519PublicKey, ReplayFilter>>,
}

impl EnvelopeVerifier {
    /// Verifier accepting any sender.
    pub fn new(config: ReceiverConfig) -> Self {
        Self {
            config,
            trusted: None,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Restrict accepted senders to `keys`.
    #[must_use]
    pub fn with_trusted_senders(mut self, keys: impl IntoIterator<Item = Ed25519PublicKey>) -> Self {
        self.trusted = Some(keys.into_iter().collect());
        self
    }

    /// Receiver settings.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Run every check and record the sequence number on success.
    pub fn verify(&self, envelope: &Envelope) -> Result<VerifiedEnvelope, EnvelopeError> {
        let result = self.verify_inner(envelope);
        match &result {
            Ok(verified) => debug!(
                topic = %verified.topic(),
                seq = verified.seq,
                msg_id = %verified.msg_id,
                sender = %verified.sender,
                "Envelope accepted"
            ),
            Err(err) => warn!(
                topic = %envelope.topic(),
                seq = envelope.seq(),
                msg_id = %envelope.msg_id(),
                reason = err.reason_label(),
                "Envelope rejected"
            ),
        }
        result
    }

    fn verify_inner(&self, envelope: &Envelope) -> Result<VerifiedEnvelope, EnvelopeError> {
        let seq = envelope.seq();
        if seq == 0 {
            return Err(EnvelopeError::SequenceViolation(
                "sequence 0 is never issued".to_string(),
            ));
        }

        let verified = self.authenticate_fields(envelope)?;

        // read-only: a forged envelope must not touch the window
        {
            let windows = self.windows.lock();
            match windows.get(&verified.sender) {
                Some(filter) => filter.check(seq).map_err(EnvelopeError::ReplayRejected)?,
                None if windows.len() >= self.config.max_senders.get() => {
                    return Err(EnvelopeError::ReplayRejected(ReplayReason::SenderLimit));
                }
                None => {}
            }
        }

        let sig = Ed25519Signature::from_slice(envelope.sig())
            .map_err(|_| EnvelopeError::AuthenticationFailed(AuthFailure::MalformedField("sig")))?;
        if !verified.sender.verify(&envelope.signed_message(), &sig) {
            return Err(EnvelopeError::AuthenticationFailed(AuthFailure::Signature));
        }

        let mut windows = self.windows.lock();
        if !windows.contains_key(&verified.sender)
            && windows.len() >= self.config.max_senders.get()
        {
            return Err(EnvelopeError::ReplayRejected(ReplayReason::SenderLimit));
        }
        let window = self.config.window_size;
        windows
            .entry(verified.sender)
            .or_insert_with(|| ReplayFilter::new(window))
            .accept(seq)
            .map_err(EnvelopeError::ReplayRejected)?;
        drop(windows);

        Ok(verified)
    }

    /// Field, AAD and `msg_id` checks; no signature, no replay state.
    fn authenticate_fields(&self, envelope: &Envelope) -> Result<VerifiedEnvelope, EnvelopeError> {
        let sender = Ed25519PublicKey::from_slice(envelope.pubkey()).map_err(|_| {
            EnvelopeError::AuthenticationFailed(AuthFailure::MalformedField("pubkey"))
        })?;
        if envelope.sig().len() != fabric_crypto::SIGNATURE_LEN {
            return Err(EnvelopeError::AuthenticationFailed(AuthFailure::MalformedField("sig")));
        }
        let nonce: [u8; NONCE_LEN] = envelope.nonce().try_into().map_err(|_| {
            EnvelopeError::AuthenticationFailed(AuthFailure::MalformedField("nonce"))
        })?;

        if let Some(trusted) = &self.trusted {
            if !trusted.contains(&sender) {
                return Err(EnvelopeError::AuthenticationFailed(AuthFailure::UntrustedSender));
            }
        }

        let aad = Aad::from_canonical_bytes(envelope.aad())?;
        if aad.topic != envelope.topic() || aad.key_version != envelope.key_version() {
            return Err(EnvelopeError::AuthenticationFailed(AuthFailure::AadMismatch));
        }

        let msg_id = MessageId::derive(sender.as_bytes(), envelope.seq(), &nonce);
        if msg_id.to_hex() != envelope.msg_id() {
            return Err(EnvelopeError::AuthenticationFailed(AuthFailure::MessageId));
        }

        Ok(VerifiedEnvelope {
            sender,
            seq: envelope.seq(),
            msg_id,
            aad,
            aad_bytes: envelope.aad().to_vec(),
            nonce,
            payload: envelope.payload().to_vec(),
        })
    }

    /// Highest sequence accepted from `sender`, if any.
    pub fn high_water_mark(&self, sender: &Ed25519PublicKey) -> Option<u64> {
        self.windows
            .lock()
            .get(sender)
            .map(ReplayFilter::high_water_mark)
    }

    /// Number of senders with a replay window.
    pub fn tracked_senders(&self) -> usize {
        self.windows.lock().len()
    }
}

impl Default for EnvelopeVerifier {
    fn default() -> Self {
        Self::new(ReceiverConfig::default())
    }
}
