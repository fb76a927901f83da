//! # Attack Simulations
//!
//! An attacker with raw access to the fabric injects captured, replayed or
//! modified envelopes. Each attempt must surface as a typed rejection on the
//! subscriber while legitimate traffic keeps flowing.
//!
//! | Attack | Expected rejection |
//! |--------|--------------------|
//! | Replay of a delivered envelope | `ReplayRejected(Duplicate)` |
//! | Replay older than the window | `ReplayRejected(TooOld)` |
//! | Payload swap with forged seq | `AuthenticationFailed(Signature)` |
//! | Topic relabel | `AuthenticationFailed(AadMismatch)` |
//! | AAD rewrite | `AuthenticationFailed(Signature)` |
//! | Message id rewrite | `AuthenticationFailed(MessageId)` |
//! | Flood of freshly minted sender keys | `ReplayRejected(SenderLimit)` |

#[cfg(test)]
mod tests {
    use super::super::support::{client, connect, fabric, next};
    use fabric_crypto::derive_msg_id;
    use fabric_envelope::{
        Aad, AuthFailure, ContentKey, Envelope, EnvelopeBuilder, EnvelopeError, EnvelopeParts,
        FabricClient, FabricTransport, MessagingApi, ReceiverConfig, ReplayReason, SendOptions,
        SigningIdentity,
    };
    use fabric_telemetry::PrometheusMetrics;
    use std::num::NonZeroUsize;
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn sender() -> EnvelopeBuilder {
        EnvelopeBuilder::new(Arc::new(SigningIdentity::generate()))
    }

    fn seal(builder: &EnvelopeBuilder, topic: &str, payload: &[u8]) -> Envelope {
        builder.seal(topic, payload, &SendOptions::new()).unwrap()
    }

    /// Copy of `envelope` with `edit` applied to its fields.
    fn tamper(envelope: &Envelope, edit: impl FnOnce(&mut EnvelopeParts)) -> Envelope {
        let mut parts = envelope.clone().into_parts();
        edit(&mut parts);
        Envelope::from_parts(parts)
    }

    fn rejection(result: Result<fabric_envelope::VerifiedEnvelope, EnvelopeError>) -> EnvelopeError {
        match result {
            Ok(verified) => panic!("accepted seq {}", verified.seq()),
            Err(err) => err,
        }
    }

    // =============================================================================
    // REPLAY
    // =============================================================================

    #[tokio::test]
    async fn test_replayed_envelope_is_duplicate_and_stream_continues() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("orders").await.unwrap();
        let alice = sender();

        let first = seal(&alice, "orders", b"pay 10");
        wire.send(first.clone()).await.unwrap();
        wire.send(first).await.unwrap();
        wire.send(seal(&alice, "orders", b"pay 20")).await.unwrap();

        assert_eq!(next(&mut sub).await.unwrap().payload(), b"pay 10");
        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::ReplayRejected(ReplayReason::Duplicate)
        );
        assert_eq!(next(&mut sub).await.unwrap().payload(), b"pay 20");
    }

    #[tokio::test]
    async fn test_withheld_envelope_beyond_window_is_too_old() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();
        let alice = sender();

        let withheld = seal(&alice, "t", b"seq 1");
        for _ in 0..64 {
            wire.send(seal(&alice, "t", b"x")).await.unwrap();
        }
        for _ in 0..64 {
            next(&mut sub).await.unwrap();
        }

        // high-water mark 65; 65 - 1 >= 64
        wire.send(withheld).await.unwrap();
        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::ReplayRejected(ReplayReason::TooOld)
        );
    }

    #[tokio::test]
    async fn test_late_envelope_inside_window_is_accepted_once() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();
        let alice = sender();

        let late = seal(&alice, "t", b"late");
        let on_time = seal(&alice, "t", b"on time");
        wire.send(on_time).await.unwrap();
        wire.send(late.clone()).await.unwrap();
        wire.send(late).await.unwrap();

        assert_eq!(next(&mut sub).await.unwrap().seq(), 2);
        assert_eq!(next(&mut sub).await.unwrap().seq(), 1);
        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::ReplayRejected(ReplayReason::Duplicate)
        );
    }

    #[tokio::test]
    async fn test_windows_are_per_sender() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();
        let (alice, carol) = (sender(), sender());

        wire.send(seal(&alice, "t", b"a")).await.unwrap();
        wire.send(seal(&carol, "t", b"c")).await.unwrap();

        // both carry seq 1
        assert_eq!(next(&mut sub).await.unwrap().seq(), 1);
        assert_eq!(next(&mut sub).await.unwrap().seq(), 1);
        assert_eq!(sub.verifier().tracked_senders(), 2);
    }

    #[tokio::test]
    async fn test_minted_sender_keys_cannot_grow_window_map() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let receiver = client(&fabric).with_receiver_config(ReceiverConfig {
            max_senders: NonZeroUsize::new(4).unwrap(),
            ..ReceiverConfig::default()
        });
        let mut sub = receiver.subscribe("t").await.unwrap();
        let regular = sender();

        wire.send(seal(&regular, "t", b"hello")).await.unwrap();
        assert!(next(&mut sub).await.is_ok());

        for _ in 0..40 {
            wire.send(seal(&sender(), "t", b"flood")).await.unwrap();
        }
        let mut limited = 0;
        for _ in 0..40 {
            match next(&mut sub).await {
                Ok(_) => {}
                Err(EnvelopeError::ReplayRejected(ReplayReason::SenderLimit)) => limited += 1,
                Err(other) => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(limited, 37);
        assert_eq!(sub.verifier().tracked_senders(), 4);

        // the known sender is unaffected
        wire.send(seal(&regular, "t", b"again")).await.unwrap();
        assert_eq!(next(&mut sub).await.unwrap().seq(), 2);
    }

    // =============================================================================
    // FORGERY
    // =============================================================================

    #[tokio::test]
    async fn test_forged_envelope_cannot_advance_replay_window() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();
        let alice = sender();
        let genuine = seal(&alice, "t", b"genuine");

        // swap the payload and jump far ahead with a consistent msg_id
        let forged = tamper(&genuine, |p| {
            p.payload = b"forged".to_vec();
            p.seq = 10_000;
            let pubkey: [u8; 32] = p.pubkey.as_slice().try_into().unwrap();
            let nonce: [u8; 24] = p.nonce.as_slice().try_into().unwrap();
            p.msg_id = derive_msg_id(&pubkey, p.seq, &nonce);
        });
        wire.send(forged).await.unwrap();
        wire.send(genuine).await.unwrap();

        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::AuthenticationFailed(AuthFailure::Signature)
        );
        let accepted = next(&mut sub).await.unwrap();
        assert_eq!(accepted.payload(), b"genuine");
        assert_eq!(
            sub.verifier().high_water_mark(alice.identity().public_key()),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_topic_relabel_is_aad_mismatch() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut admin = client(&fabric).subscribe("admin").await.unwrap();

        let envelope = seal(&sender(), "public", b"hello");
        wire.send(tamper(&envelope, |p| p.topic = "admin".to_string()))
            .await
            .unwrap();

        assert_eq!(
            rejection(next(&mut admin).await),
            EnvelopeError::AuthenticationFailed(AuthFailure::AadMismatch)
        );
    }

    #[tokio::test]
    async fn test_aad_rewrite_breaks_signature() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();

        let envelope = seal(&sender(), "t", b"x");
        let rewritten = Aad::new("t", 0)
            .with_tenant_id("someone-else")
            .to_canonical_bytes()
            .unwrap();
        wire.send(tamper(&envelope, |p| p.aad = rewritten)).await.unwrap();

        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::AuthenticationFailed(AuthFailure::Signature)
        );
    }

    #[tokio::test]
    async fn test_non_canonical_aad_is_encoding_error() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();

        let envelope = seal(&sender(), "t", b"x");
        let compact = br#"{"topic":"t","key_version":0}"#.to_vec();
        wire.send(tamper(&envelope, |p| p.aad = compact)).await.unwrap();

        assert!(matches!(
            rejection(next(&mut sub).await),
            EnvelopeError::EncodingError(_)
        ));
    }

    #[tokio::test]
    async fn test_msg_id_rewrite_is_detected() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();

        let envelope = seal(&sender(), "t", b"x");
        wire.send(tamper(&envelope, |p| p.msg_id = "ab".repeat(32)))
            .await
            .unwrap();

        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::AuthenticationFailed(AuthFailure::MessageId)
        );
    }

    #[tokio::test]
    async fn test_ciphertext_bit_flip_rejected_before_decryption() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();

        let key = ContentKey::generate(1).unwrap();
        let envelope = sender()
            .seal_encrypted("t", b"secret", &SendOptions::new(), &key)
            .unwrap();
        wire.send(tamper(&envelope, |p| p.payload[0] ^= 0x01))
            .await
            .unwrap();

        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::AuthenticationFailed(AuthFailure::Signature)
        );
    }

    #[tokio::test]
    async fn test_malformed_fields_and_zero_seq() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();
        let envelope = seal(&sender(), "t", b"x");

        wire.send(tamper(&envelope, |p| p.sig.truncate(63))).await.unwrap();
        wire.send(tamper(&envelope, |p| p.nonce.push(0))).await.unwrap();
        wire.send(tamper(&envelope, |p| p.seq = 0)).await.unwrap();

        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::AuthenticationFailed(AuthFailure::MalformedField("sig"))
        );
        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::AuthenticationFailed(AuthFailure::MalformedField("nonce"))
        );
        assert!(matches!(
            rejection(next(&mut sub).await),
            EnvelopeError::SequenceViolation(_)
        ));
    }

    // =============================================================================
    // TRUST
    // =============================================================================

    #[tokio::test]
    async fn test_untrusted_sender_rejected() {
        let fabric = fabric();
        let alice = client(&fabric);
        let carol = client(&fabric);
        let bob = client(&fabric).with_trusted_senders([*carol.identity().public_key()]);
        let mut sub = bob.subscribe("t").await.unwrap();

        alice.send("t", b"from alice", SendOptions::new()).await.unwrap();
        carol.send("t", b"from carol", SendOptions::new()).await.unwrap();

        assert_eq!(
            rejection(next(&mut sub).await),
            EnvelopeError::AuthenticationFailed(AuthFailure::UntrustedSender)
        );
        assert_eq!(next(&mut sub).await.unwrap().payload(), b"from carol");
    }

    #[tokio::test]
    async fn test_rejections_are_counted_by_reason() {
        let fabric = fabric();
        let wire = connect(&fabric);
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let bob = FabricClient::new(connect(&fabric), SigningIdentity::generate())
            .with_metrics(metrics.clone());
        let mut sub = bob.subscribe("t").await.unwrap();

        let envelope = seal(&sender(), "t", b"x");
        wire.send(envelope.clone()).await.unwrap();
        wire.send(envelope.clone()).await.unwrap();
        wire.send(tamper(&envelope, |p| p.msg_id = "00".repeat(32)))
            .await
            .unwrap();
        for _ in 0..3 {
            let _ = next(&mut sub).await;
        }

        assert_eq!(metrics.accepted_total(), 1);
        assert_eq!(metrics.rejected_total("duplicate"), 1);
        assert_eq!(metrics.rejected_total("msg_id"), 1);
    }
}
