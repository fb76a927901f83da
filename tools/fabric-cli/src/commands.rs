//! Subcommand implementations.
//!
//! Each command returns its result instead of printing, so `main` owns
//! stdout and the tests can inspect outputs directly.

use crate::cli::{ConformanceArgs, KeygenArgs, OpenArgs, SealArgs};
use anyhow::{bail, ensure, Context, Result};
use fabric_conformance::{ConformanceReport, ConformanceVectors};
use fabric_crypto::{Ed25519KeyPair, Ed25519PublicKey};
use fabric_envelope::{
    ContentKey, ContentKeyring, Envelope, EnvelopeBuilder, EnvelopeVerifier, ReceiverConfig,
    SendOptions, SequenceCounter, SigningIdentity,
};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Write a fresh seed to `args.out`; returns the public key hex.
pub fn keygen(args: &KeygenArgs) -> Result<String> {
    let keypair = Ed25519KeyPair::generate();

    let mut options = OpenOptions::new();
    options.write(true);
    if args.force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(&args.out)
        .with_context(|| format!("Failed to create key file {}", args.out.display()))?;
    file.write_all(keypair.to_seed().as_slice())
        .with_context(|| format!("Failed to write key file {}", args.out.display()))?;

    let public_key = keypair.public_key().to_hex();
    info!(path = %args.out.display(), sender = %public_key, "Signing key generated");
    Ok(public_key)
}

fn content_key(hex_key: &str, version: u32) -> Result<ContentKey> {
    let bytes = hex::decode(hex_key.trim()).context("Content key is not valid hex")?;
    Ok(ContentKey::from_slice(version, &bytes)?)
}

/// Sidecar file holding the last sequence number issued with `key`.
fn sequence_path(key: &Path) -> PathBuf {
    let mut path = key.as_os_str().to_owned();
    path.push(".seq");
    PathBuf::from(path)
}

fn read_last_issued(path: &Path) -> Result<u64> {
    match std::fs::read_to_string(path) {
        Ok(text) => text
            .trim()
            .parse()
            .with_context(|| format!("Sequence file {} is corrupt", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to read sequence file {}", path.display()))
        }
    }
}

/// Build one envelope as described by `args` and record its sequence number
/// next to the key file.
pub fn seal(args: &SealArgs) -> Result<Envelope> {
    let seq_path = sequence_path(&args.key);
    let last_issued = read_last_issued(&seq_path)?;
    let seq = match args.seq {
        Some(seq) => {
            ensure!(seq >= 1, "Sequence numbers start at 1");
            ensure!(
                seq > last_issued,
                "Sequence {seq} was already issued with this key (last {last_issued})"
            );
            seq
        }
        None => last_issued
            .checked_add(1)
            .context("Sequence counter exhausted for this key")?,
    };

    let identity = SigningIdentity::from_file(&args.key)
        .with_context(|| format!("Failed to load signing key {}", args.key.display()))?
        .with_sequence(SequenceCounter::resume_after(seq - 1));
    let builder = EnvelopeBuilder::new(Arc::new(identity));

    let mut options = SendOptions::new();
    if let Some(tenant) = &args.tenant {
        options = options.tenant_id(tenant.clone());
    }
    if let Some(content_type) = &args.content_type {
        options = options.content_type(content_type.clone());
    }

    let envelope = match &args.content_key {
        Some(hex_key) => {
            let key = content_key(hex_key, args.key_version)?;
            builder.seal_encrypted(&args.topic, args.message.as_bytes(), &options, &key)?
        }
        None => builder.seal(&args.topic, args.message.as_bytes(), &options)?,
    };

    std::fs::write(&seq_path, envelope.seq().to_string())
        .with_context(|| format!("Failed to record sequence in {}", seq_path.display()))?;
    debug!(path = %seq_path.display(), seq = envelope.seq(), "Sequence recorded");
    Ok(envelope)
}

/// Verified envelope contents as printed by `open`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenedEnvelope {
    pub sender: String,
    pub topic: String,
    pub seq: u64,
    pub msg_id: String,
    pub key_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Payload as text when it is valid UTF-8
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_utf8: Option<String>,
    pub payload_hex: String,
}

fn read_envelope(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .context("Failed to read envelope from stdin")?;
        Ok(json)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read envelope {}", path.display()))
    }
}

/// Verify the envelope named by `args` and decrypt it if a key is given.
pub fn open(args: &OpenArgs) -> Result<OpenedEnvelope> {
    open_json(&read_envelope(&args.envelope)?, args)
}

fn open_json(json: &str, args: &OpenArgs) -> Result<OpenedEnvelope> {
    let envelope: Envelope = serde_json::from_str(json).context("Envelope JSON is malformed")?;

    let mut verifier = EnvelopeVerifier::new(ReceiverConfig::default());
    if !args.trusted.is_empty() {
        let keys = args
            .trusted
            .iter()
            .map(|hex_key| {
                let bytes = hex::decode(hex_key.trim())
                    .with_context(|| format!("Trusted key `{hex_key}` is not valid hex"))?;
                Ed25519PublicKey::from_slice(&bytes)
                    .with_context(|| format!("Trusted key `{hex_key}` is not an Ed25519 key"))
            })
            .collect::<Result<Vec<_>>>()?;
        verifier = verifier.with_trusted_senders(keys);
    }

    let verified = verifier
        .verify(&envelope)
        .context("Envelope failed verification")?;

    let payload = if verified.is_encrypted() {
        let Some(hex_key) = &args.content_key else {
            bail!(
                "Envelope is encrypted under key version {}; pass --content-key",
                verified.aad().key_version
            );
        };
        let keyring: ContentKeyring = [content_key(hex_key, args.key_version)?]
            .into_iter()
            .collect();
        verified.decrypt(&keyring).context("Failed to decrypt payload")?
    } else {
        verified.payload().to_vec()
    };

    let aad = verified.aad();
    Ok(OpenedEnvelope {
        sender: verified.sender().to_hex(),
        topic: aad.topic.clone(),
        seq: verified.seq(),
        msg_id: verified.msg_id().to_hex(),
        key_version: aad.key_version,
        tenant_id: aad.tenant_id.clone(),
        content_type: aad.content_type.clone(),
        payload_hex: hex::encode(&payload),
        payload_utf8: String::from_utf8(payload).ok(),
    })
}

/// Run the bundled vectors, or the file named by `args`.
pub fn conformance(args: &ConformanceArgs) -> Result<ConformanceReport> {
    let vectors = match &args.vectors {
        Some(path) => ConformanceVectors::from_file(path)?,
        None => ConformanceVectors::bundled()?,
    };
    Ok(vectors.run_all())
}
