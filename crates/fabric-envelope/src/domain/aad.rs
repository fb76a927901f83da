//! # Canonical AAD
//!
//! The additional authenticated data bound into every signature and AEAD tag.
//!
//! Wire form is a JSON object with keys in the fixed order `topic`,
//! `key_version`, `tenant_id`, `content_type`. Optional keys appear only when
//! set. Separators are `", "` and `": "` and every character outside printable
//! ASCII is written as a lower-case `\uXXXX` escape (UTF-16 surrogate pairs
//! above U+FFFF). The Python client produces the same bytes with
//! `json.dumps(aad)`, so signatures verify across both.

use super::errors::EnvelopeError;
use serde::{Deserialize, Serialize};
use std::io;

/// Authenticated header fields of an envelope.
///
/// Field declaration order is the canonical key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Aad {
    /// Routing topic (non-empty)
    pub topic: String,
    /// Content key version; 0 for plaintext payloads
    pub key_version: u32,
    /// Tenant scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// MIME type of the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Aad {
    /// AAD for `topic` with no optional fields.
    pub fn new(topic: impl Into<String>, key_version: u32) -> Self {
        Self {
            topic: topic.into(),
            key_version,
            tenant_id: None,
            content_type: None,
        }
    }

    /// Set the tenant id.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Build from raw byte fields, rejecting any that are not valid UTF-8.
    pub fn from_utf8_parts(
        topic: &[u8],
        key_version: u32,
        tenant_id: Option<&[u8]>,
        content_type: Option<&[u8]>,
    ) -> Result<Self, EnvelopeError> {
        let text = |name: &str, bytes: &[u8]| {
            std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| EnvelopeError::EncodingError(format!("{name} is not UTF-8: {e}")))
        };

        Ok(Self {
            topic: text("topic", topic)?,
            key_version,
            tenant_id: tenant_id.map(|b| text("tenant_id", b)).transpose()?,
            content_type: content_type.map(|b| text("content_type", b)).transpose()?,
        })
    }

    /// Serialize to the canonical byte form.
    ///
    /// # Errors
    ///
    /// `EncodingError` if the topic is empty.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        if self.topic.is_empty() {
            return Err(EnvelopeError::EncodingError(
                "topic must not be empty".to_string(),
            ));
        }

        let mut out = Vec::with_capacity(64 + self.topic.len());
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter);
        self.serialize(&mut serializer)
            .map_err(|e| EnvelopeError::EncodingError(e.to_string()))?;
        Ok(out)
    }

    /// Parse the canonical byte form.
    ///
    /// Input is accepted only if it re-serializes to exactly the same bytes,
    /// so two distinct byte strings never decode to the same `Aad`.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let aad: Self = serde_json::from_slice(bytes)
            .map_err(|e| EnvelopeError::EncodingError(format!("invalid aad: {e}")))?;

        if aad.to_canonical_bytes()? != bytes {
            return Err(EnvelopeError::EncodingError(
                "aad is not in canonical form".to_string(),
            ));
        }
        Ok(aad)
    }
}

/// `serde_json` formatter producing the canonical AAD layout.
///
/// Short escapes (`\"`, `\\`, `\b`, `\f`, `\n`, `\r`, `\t`) and lower-case
/// `\u00XX` for other C0 controls come from serde_json's default
/// `write_char_escape`; this formatter adds the separators and escapes
/// everything else outside 0x20..=0x7E.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalFormatter;

impl serde_json::ser::Formatter for CanonicalFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                // printable ASCII is one byte
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}
