//! # Content Keys
//!
//! Versioned symmetric keys for end-to-end payload encryption. Version 0 is
//! reserved for plaintext envelopes.

use super::errors::EnvelopeError;
use fabric_crypto::{SecretKey, KEY_LEN};
use std::collections::BTreeMap;

/// A 256-bit content key tagged with its version.
#[derive(Clone, Debug)]
pub struct ContentKey {
    version: u32,
    key: SecretKey,
}

impl ContentKey {
    /// Wrap key bytes under `version` (must be at least 1).
    pub fn new(version: u32, key: [u8; KEY_LEN]) -> Result<Self, EnvelopeError> {
        if version == 0 {
            return Err(EnvelopeError::InvalidKeyMaterial(
                "content key version 0 is reserved for plaintext".to_string(),
            ));
        }
        Ok(Self {
            version,
            key: SecretKey::from_bytes(key),
        })
    }

    /// Accept a slice of exactly 32 bytes.
    pub fn from_slice(version: u32, key: &[u8]) -> Result<Self, EnvelopeError> {
        let key = SecretKey::from_slice(key)
            .map_err(|e| EnvelopeError::InvalidKeyMaterial(e.to_string()))?;
        Self::new(version, *key.as_bytes())
    }

    /// Fresh random key.
    pub fn generate(version: u32) -> Result<Self, EnvelopeError> {
        Self::new(version, *SecretKey::generate().as_bytes())
    }

    /// Key version carried in the AAD.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub(crate) fn key_bytes(&self) -> &[u8; KEY_LEN] {
        self.key.as_bytes()
    }
}

/// Content keys known to a receiver, indexed by version.
#[derive(Clone, Debug, Default)]
pub struct ContentKeyring {
    keys: BTreeMap<u32, ContentKey>,
}

impl ContentKeyring {
    /// Empty keyring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a key; returns the key previously stored under its version.
    pub fn insert(&mut self, key: ContentKey) -> Option<ContentKey> {
        self.keys.insert(key.version, key)
    }

    /// Look up a key version.
    pub fn get(&self, version: u32) -> Option<&ContentKey> {
        self.keys.get(&version)
    }

    /// Drop a retired key version.
    pub fn remove(&mut self, version: u32) -> Option<ContentKey> {
        self.keys.remove(&version)
    }

    /// Highest version held, used for sealing new messages.
    pub fn current(&self) -> Option<&ContentKey> {
        self.keys.values().next_back()
    }

    /// Number of key versions held.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if no keys are held.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<ContentKey> for ContentKeyring {
    fn from_iter<I: IntoIterator<Item = ContentKey>>(iter: I) -> Self {
        let mut ring = Self::new();
        for key in iter {
            ring.insert(key);
        }
        ring
    }
}
