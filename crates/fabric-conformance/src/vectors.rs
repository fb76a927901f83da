//! Conformance vector file schema.
//!
//! All byte fields are lower-case hex in the file and decoded on load, so a
//! malformed vector fails at parse time rather than in the middle of a run.

use crate::ConformanceError;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::path::Path;

/// Bundled vector file.
const BUNDLED: &str = include_str!("../vectors/test_vectors.json");

/// The full vector document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceVectors {
    /// AEAD known-answer tests
    pub encryption: EncryptionSuite,
    /// Ed25519 known-answer tests
    pub signatures: SignatureSuite,
    /// Replay filter decision sequences
    pub replay_protection: ReplaySuite,
    /// AEAD tamper detection
    pub tamper_detection: TamperSuite,
    /// Full envelope construction; optional in third-party vector files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelopes: Option<EnvelopeSuite>,
}

impl ConformanceVectors {
    /// Parse a vector document.
    pub fn from_json(json: &str) -> Result<Self, ConformanceError> {
        serde_json::from_str(json).map_err(|e| ConformanceError::Parse(e.to_string()))
    }

    /// Load a vector document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConformanceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConformanceError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// The vectors shipped with this crate.
    pub fn bundled() -> Result<Self, ConformanceError> {
        Self::from_json(BUNDLED)
    }

    /// Number of cases across all suites.
    pub fn case_count(&self) -> usize {
        self.encryption.xchacha20_poly1305.len()
            + self.signatures.ed25519.len()
            + self.replay_protection.tests.len()
            + self.tamper_detection.tests.len()
            + self.envelopes.as_ref().map_or(0, |suite| suite.tests.len())
    }
}

/// `encryption` suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionSuite {
    pub xchacha20_poly1305: Vec<AeadVector>,
}

/// XChaCha20-Poly1305 known answer.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AeadVector {
    pub description: String,
    #[serde_as(as = "Hex")]
    pub key: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub nonce: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub plaintext: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub aad: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub ciphertext: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub tag: Vec<u8>,
}

/// `signatures` suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSuite {
    pub ed25519: Vec<SignatureVector>,
}

/// Ed25519 known answer.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureVector {
    pub description: String,
    #[serde_as(as = "Hex")]
    pub secret_key: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub public_key: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub message: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
}

/// `replay_protection` suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySuite {
    #[serde(default)]
    pub description: String,
    pub tests: Vec<ReplayVector>,
}

/// Counters fed in order to a fresh filter, with the expected decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayVector {
    pub description: String,
    /// Defaults to 64 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_size: Option<usize>,
    pub counters: Vec<u64>,
    pub expected: Vec<bool>,
}

/// `tamper_detection` suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TamperSuite {
    #[serde(default)]
    pub description: String,
    pub tests: Vec<TamperVector>,
}

/// AEAD open attempt that must succeed or fail.
///
/// The untampered form is `original_ciphertext` (or `ciphertext`),
/// `original_tag` (or `tag`) and `aad`. The attempted form substitutes any
/// `tampered_*` field present. Missing `aad` means empty associated data.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TamperVector {
    pub description: String,
    #[serde_as(as = "Hex")]
    pub key: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub nonce: Vec<u8>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciphertext: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_ciphertext: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tampered_ciphertext: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_tag: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tampered_tag: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aad: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tampered_aad: Option<Vec<u8>>,
    /// Expected plaintext when the open should succeed
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaintext: Option<Vec<u8>>,
    pub should_fail: bool,
}

impl TamperVector {
    /// Ciphertext before tampering.
    pub fn untampered_ciphertext(&self) -> Option<&[u8]> {
        self.original_ciphertext
            .as_deref()
            .or(self.ciphertext.as_deref())
    }

    /// Tag before tampering.
    pub fn untampered_tag(&self) -> Option<&[u8]> {
        self.original_tag.as_deref().or(self.tag.as_deref())
    }

    /// Associated data before tampering.
    pub fn untampered_aad(&self) -> &[u8] {
        self.aad.as_deref().unwrap_or_default()
    }

    /// Ciphertext of the attempted open.
    pub fn attempted_ciphertext(&self) -> Option<&[u8]> {
        self.tampered_ciphertext
            .as_deref()
            .or(self.untampered_ciphertext())
    }

    /// Tag of the attempted open.
    pub fn attempted_tag(&self) -> Option<&[u8]> {
        self.tampered_tag.as_deref().or(self.untampered_tag())
    }

    /// Associated data of the attempted open.
    pub fn attempted_aad(&self) -> &[u8] {
        self.tampered_aad
            .as_deref()
            .unwrap_or_else(|| self.untampered_aad())
    }

    /// True if any `tampered_*` field is present.
    pub fn is_tampered(&self) -> bool {
        self.tampered_ciphertext.is_some()
            || self.tampered_tag.is_some()
            || self.tampered_aad.is_some()
    }
}

/// `envelopes` suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeSuite {
    #[serde(default)]
    pub description: String,
    pub tests: Vec<EnvelopeVector>,
}

/// Full envelope built from fixed key, sequence and nonce.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeVector {
    pub description: String,
    #[serde_as(as = "Hex")]
    pub secret_key: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub public_key: Vec<u8>,
    pub topic: String,
    #[serde_as(as = "Hex")]
    pub payload: Vec<u8>,
    pub seq: u64,
    #[serde_as(as = "Hex")]
    pub nonce: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Content key; present for end-to-end encrypted envelopes
    #[serde_as(as = "Option<Hex>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_version: Option<u32>,
    /// Expected canonical AAD bytes
    #[serde_as(as = "Hex")]
    pub aad: Vec<u8>,
    /// Expected envelope payload (ciphertext || tag when encrypted)
    #[serde_as(as = "Hex")]
    pub body: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub sig: Vec<u8>,
    /// Expected message id, lower-case hex
    pub msg_id: String,
}
