//! Suite runner.
//!
//! Each case is checked against the production code paths: the AEAD codec,
//! Ed25519 signing, [`ReplayFilter`], and the envelope builder plus verifier.
//! A case passes only if every output matches byte for byte and every
//! accept/reject decision matches exactly.

use crate::report::{CaseResult, ConformanceReport, SuiteReport};
use crate::vectors::{
    AeadVector, ConformanceVectors, EnvelopeVector, ReplayVector, SignatureVector, TamperVector,
};
use fabric_crypto::{CryptoError, Ed25519KeyPair, NONCE_LEN};
use fabric_envelope::{
    ContentKey, EnvelopeBuilder, EnvelopeVerifier, ReplayFilter, SendOptions, SequenceCounter,
    SigningIdentity, DEFAULT_WINDOW_SIZE,
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{info, warn};

impl ConformanceVectors {
    /// Run every suite.
    pub fn run_all(&self) -> ConformanceReport {
        let mut suites = vec![
            run_suite(
                "encryption.xchacha20_poly1305",
                &self.encryption.xchacha20_poly1305,
                |v| &v.description,
                check_encryption,
            ),
            run_suite(
                "signatures.ed25519",
                &self.signatures.ed25519,
                |v| &v.description,
                check_signature,
            ),
            run_suite(
                "replay_protection",
                &self.replay_protection.tests,
                |v| &v.description,
                check_replay,
            ),
            run_suite(
                "tamper_detection",
                &self.tamper_detection.tests,
                |v| &v.description,
                check_tamper,
            ),
        ];
        if let Some(envelopes) = &self.envelopes {
            suites.push(run_suite(
                "envelopes",
                &envelopes.tests,
                |v| &v.description,
                check_envelope,
            ));
        }

        let report = ConformanceReport { suites };
        info!(
            passed = report.passed(),
            failed = report.failed(),
            "Conformance run complete"
        );
        report
    }
}

fn run_suite<V>(
    name: &'static str,
    vectors: &[V],
    description: impl Fn(&V) -> &String,
    check: impl Fn(&V) -> Result<(), String>,
) -> SuiteReport {
    let cases = vectors
        .iter()
        .map(|vector| {
            let result = CaseResult::from_check(description(vector), check(vector));
            if let Some(detail) = &result.detail {
                warn!(suite = name, case = %result.description, detail = %detail, "Conformance case failed");
            }
            result
        })
        .collect();
    SuiteReport { name, cases }
}

fn expect_eq(what: &str, actual: &[u8], expected: &[u8]) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!(
            "{what} mismatch: got {}, expected {}",
            hex::encode(actual),
            hex::encode(expected)
        ))
    }
}

fn check_encryption(v: &AeadVector) -> Result<(), String> {
    let (ciphertext, tag) = fabric_crypto::encrypt(&v.key, &v.nonce, &v.plaintext, &v.aad)
        .map_err(|e| format!("encrypt failed: {e}"))?;
    expect_eq("ciphertext", &ciphertext, &v.ciphertext)?;
    expect_eq("tag", &tag, &v.tag)?;

    let plaintext = fabric_crypto::decrypt(&v.key, &v.nonce, &v.ciphertext, &v.aad, &v.tag)
        .map_err(|e| format!("decrypt failed: {e}"))?;
    expect_eq("plaintext", &plaintext, &v.plaintext)
}

fn check_signature(v: &SignatureVector) -> Result<(), String> {
    let keypair =
        Ed25519KeyPair::from_secret_bytes(&v.secret_key).map_err(|e| format!("secret key: {e}"))?;
    expect_eq("public key", keypair.public_key().as_bytes(), &v.public_key)?;

    let signature = fabric_crypto::sign(&v.secret_key, &v.message)
        .map_err(|e| format!("sign failed: {e}"))?;
    expect_eq("signature", &signature, &v.signature)?;

    if !fabric_crypto::verify(&v.public_key, &v.message, &v.signature) {
        return Err("vector signature does not verify".to_string());
    }

    let mut forged = v.signature.clone();
    if let Some(byte) = forged.first_mut() {
        *byte ^= 0x01;
    }
    if fabric_crypto::verify(&v.public_key, &v.message, &forged) {
        return Err("altered signature verified".to_string());
    }
    if let Some(last) = v.message.len().checked_sub(1) {
        let mut altered = v.message.clone();
        altered[last] ^= 0x80;
        if fabric_crypto::verify(&v.public_key, &altered, &v.signature) {
            return Err("signature verified over altered message".to_string());
        }
    }
    Ok(())
}

fn check_replay(v: &ReplayVector) -> Result<(), String> {
    if v.counters.len() != v.expected.len() {
        return Err(format!(
            "vector has {} counters but {} expected decisions",
            v.counters.len(),
            v.expected.len()
        ));
    }
    let window = NonZeroUsize::new(v.window_size.unwrap_or(DEFAULT_WINDOW_SIZE))
        .ok_or_else(|| "window_size must be positive".to_string())?;

    let mut filter = ReplayFilter::new(window);
    for (index, (&counter, &expected)) in v.counters.iter().zip(&v.expected).enumerate() {
        let accepted = filter.accept(counter).is_ok();
        if accepted != expected {
            return Err(format!(
                "counter #{index} ({counter}): {} but expected {}",
                decision(accepted),
                decision(expected)
            ));
        }
    }
    Ok(())
}

fn decision(accepted: bool) -> &'static str {
    if accepted {
        "accepted"
    } else {
        "rejected"
    }
}

fn check_tamper(v: &TamperVector) -> Result<(), String> {
    let (Some(ciphertext), Some(tag)) = (v.attempted_ciphertext(), v.attempted_tag()) else {
        return Err("vector lacks ciphertext or tag".to_string());
    };

    if v.is_tampered() {
        // The tampering must be the only reason for failure
        if let (Some(original_ct), Some(original_tag)) = (v.untampered_ciphertext(), v.untampered_tag()) {
            fabric_crypto::decrypt(&v.key, &v.nonce, original_ct, v.untampered_aad(), original_tag)
                .map_err(|e| format!("untampered input does not open: {e}"))?;
        }
    }

    match fabric_crypto::decrypt(&v.key, &v.nonce, ciphertext, v.attempted_aad(), tag) {
        Err(CryptoError::AuthenticationFailed) if v.should_fail => Ok(()),
        Err(e) if v.should_fail => Err(format!("failed with {e} instead of authentication failure")),
        Err(e) => Err(format!("open failed: {e}")),
        Ok(_) if v.should_fail => Err("tampered input decrypted".to_string()),
        Ok(plaintext) => match &v.plaintext {
            Some(expected) => expect_eq("plaintext", &plaintext, expected),
            None => Ok(()),
        },
    }
}

fn check_envelope(v: &EnvelopeVector) -> Result<(), String> {
    let last_issued = v
        .seq
        .checked_sub(1)
        .ok_or_else(|| "seq must be at least 1".to_string())?;
    let nonce: [u8; NONCE_LEN] = v
        .nonce
        .as_slice()
        .try_into()
        .map_err(|_| format!("nonce must be {NONCE_LEN} bytes"))?;

    let identity = SigningIdentity::from_secret_bytes(&v.secret_key)
        .map_err(|e| e.to_string())?
        .with_sequence(SequenceCounter::resume_after(last_issued));
    expect_eq("public key", identity.public_key().as_bytes(), &v.public_key)?;

    let mut options = SendOptions::new();
    if let Some(tenant_id) = &v.tenant_id {
        options = options.tenant_id(tenant_id.clone());
    }
    if let Some(content_type) = &v.content_type {
        options = options.content_type(content_type.clone());
    }

    let builder = EnvelopeBuilder::new(Arc::new(identity));
    let content_key = match &v.encryption_key {
        Some(key) => {
            let version = v
                .key_version
                .ok_or_else(|| "encryption_key without key_version".to_string())?;
            Some(ContentKey::from_slice(version, key).map_err(|e| e.to_string())?)
        }
        None => None,
    };
    let envelope = match &content_key {
        Some(key) => builder.seal_encrypted_with_nonce(nonce, &v.topic, &v.payload, &options, key),
        None => builder.seal_with_nonce(nonce, &v.topic, &v.payload, &options),
    }
    .map_err(|e| format!("seal failed: {e}"))?;

    if envelope.seq() != v.seq {
        return Err(format!("seq {} but expected {}", envelope.seq(), v.seq));
    }
    expect_eq("aad", envelope.aad(), &v.aad)?;
    expect_eq("body", envelope.payload(), &v.body)?;
    expect_eq("sig", envelope.sig(), &v.sig)?;
    if envelope.msg_id() != v.msg_id {
        return Err(format!(
            "msg_id mismatch: got {}, expected {}",
            envelope.msg_id(),
            v.msg_id
        ));
    }

    let verified = EnvelopeVerifier::default()
        .verify(&envelope)
        .map_err(|e| format!("built envelope rejected: {e}"))?;
    if let Some(key) = content_key {
        let plaintext = verified
            .decrypt(&[key].into_iter().collect())
            .map_err(|e| format!("decrypt failed: {e}"))?;
        expect_eq("decrypted payload", &plaintext, &v.payload)?;
    }
    Ok(())
}
