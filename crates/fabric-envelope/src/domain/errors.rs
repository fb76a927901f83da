//! # Envelope Errors
//!
//! Every rejection is a distinct, typed condition. Nothing here is retried
//! internally: a failed authentication cannot succeed without new input.

use std::fmt;
use thiserror::Error;

/// Which authenticity check an envelope failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthFailure {
    /// Ed25519 signature does not cover `aad || payload`
    Signature,
    /// AEAD tag does not authenticate the ciphertext
    AeadTag,
    /// `msg_id` differs from `BLAKE3(pubkey || le64(seq) || nonce)`
    MessageId,
    /// The signed AAD disagrees with the envelope's `topic` or `key_version`
    AadMismatch,
    /// A fixed-length field has the wrong length or encoding
    MalformedField(&'static str),
    /// Sender key is not in the verifier's trusted set
    UntrustedSender,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature => f.write_str("signature mismatch"),
            Self::AeadTag => f.write_str("AEAD tag mismatch"),
            Self::MessageId => f.write_str("message id mismatch"),
            Self::AadMismatch => f.write_str("AAD does not match envelope header"),
            Self::MalformedField(field) => write!(f, "malformed field `{field}`"),
            Self::UntrustedSender => f.write_str("untrusted sender"),
        }
    }
}

/// Why the replay window refused a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplayReason {
    /// At or below the bottom of the tracked window
    TooOld,
    /// Already accepted within the window
    Duplicate,
    /// Unseen sender while the verifier already tracks its maximum
    SenderLimit,
}

impl fmt::Display for ReplayReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooOld => f.write_str("too old"),
            Self::Duplicate => f.write_str("duplicate"),
            Self::SenderLimit => f.write_str("sender limit reached"),
        }
    }
}

/// Errors raised while building, verifying or opening envelopes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Signing key, public key or content key is malformed or unknown
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// AAD input cannot be canonically serialized or parsed
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Signature, tag, message id or header check failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(AuthFailure),

    /// Replay window rejected the sequence number
    #[error("Replay rejected: {0}")]
    ReplayRejected(ReplayReason),

    /// Sequence number is invalid or the counter is exhausted
    #[error("Sequence violation: {0}")]
    SequenceViolation(String),

    /// Failure reported by the transport port
    #[error("Transport error: {0}")]
    Transport(String),
}

impl EnvelopeError {
    /// Short, stable label used for metrics and structured logs.
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::InvalidKeyMaterial(_) => "invalid_key",
            Self::EncodingError(_) => "encoding",
            Self::AuthenticationFailed(AuthFailure::Signature) => "signature",
            Self::AuthenticationFailed(AuthFailure::AeadTag) => "aead_tag",
            Self::AuthenticationFailed(AuthFailure::MessageId) => "msg_id",
            Self::AuthenticationFailed(AuthFailure::AadMismatch) => "aad_mismatch",
            Self::AuthenticationFailed(AuthFailure::MalformedField(_)) => "malformed",
            Self::AuthenticationFailed(AuthFailure::UntrustedSender) => "untrusted_sender",
            Self::ReplayRejected(ReplayReason::TooOld) => "too_old",
            Self::ReplayRejected(ReplayReason::Duplicate) => "duplicate",
            Self::ReplayRejected(ReplayReason::SenderLimit) => "sender_limit",
            Self::SequenceViolation(_) => "sequence",
            Self::Transport(_) => "transport",
        }
    }

    /// True for the authentication and replay rejections a receiver drops.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed(_) | Self::ReplayRejected(_) | Self::SequenceViolation(_)
        )
    }
}
