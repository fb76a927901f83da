//! # BLAKE3 Message Identifiers
//!
//! `msg_id = BLAKE3(pubkey || le64(seq) || nonce)`, rendered as 64 lower-case
//! hex characters on the wire.

use crate::{CryptoError, NONCE_LEN, PUBLIC_KEY_LEN};
use blake3::Hasher;
use std::fmt;

/// Message identifier length in bytes.
pub const MSG_ID_LEN: usize = 32;

/// 256-bit envelope identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId([u8; MSG_ID_LEN]);

impl MessageId {
    /// Derive the identifier of the message `(pubkey, seq, nonce)`.
    pub fn derive(pubkey: &[u8; PUBLIC_KEY_LEN], seq: u64, nonce: &[u8; NONCE_LEN]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(pubkey);
        hasher.update(&seq.to_le_bytes());
        hasher.update(nonce);
        Self(*hasher.finalize().as_bytes())
    }

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; MSG_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex characters (either case).
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        let array: [u8; MSG_ID_LEN] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidInput(format!(
                "message id must be {MSG_ID_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; MSG_ID_LEN] {
        &self.0
    }

    /// Lower-case hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", &self.to_hex()[..16])
    }
}

/// Hex-encoded message identifier for `(pubkey, seq, nonce)`.
pub fn derive_msg_id(pubkey: &[u8; PUBLIC_KEY_LEN], seq: u64, nonce: &[u8; NONCE_LEN]) -> String {
    MessageId::derive(pubkey, seq, nonce).to_hex()
}
