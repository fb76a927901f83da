//! # Integration Test Flows
//!
//! Publisher and subscriber clients exchanging envelopes through the
//! in-memory fabric.
//!
//! ## Flows Tested:
//!
//! 1. **Plaintext**: payload and AAD metadata arrive intact and verified
//! 2. **End-to-end encryption**: only holders of the content key can open
//! 3. **Shared identity**: concurrent senders never reuse a sequence number
//! 4. **Transport**: bearer-token enforcement, stats and metrics

#[cfg(test)]
mod tests {
    use super::super::support::{client, connect, fabric, next, plaintext_config, TOKEN};
    use fabric_bus::{InMemoryFabric, TransportConfig};
    use fabric_envelope::{
        ContentKey, ContentKeyring, EnvelopeError, FabricClient, MessagingApi, SendOptions,
        SigningIdentity,
    };
    use fabric_telemetry::PrometheusMetrics;
    use std::collections::HashSet;
    use std::sync::Arc;

    // =============================================================================
    // PLAINTEXT FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_plaintext_send_and_verified_receive() {
        let fabric = fabric();
        let alice = client(&fabric);
        let bob = client(&fabric);
        let mut sub = bob.subscribe("demo.messages").await.unwrap();

        let options = SendOptions::new()
            .tenant_id("acme")
            .content_type("text/plain");
        let msg_id = alice
            .send("demo.messages", b"Hello from Rust!", options)
            .await
            .unwrap();

        let received = next(&mut sub).await.unwrap();
        assert_eq!(received.payload(), b"Hello from Rust!");
        assert_eq!(received.msg_id().to_hex(), msg_id);
        assert_eq!(received.seq(), 1);
        assert_eq!(received.sender(), alice.identity().public_key());
        assert_eq!(received.aad().tenant_id.as_deref(), Some("acme"));
        assert_eq!(received.aad().content_type.as_deref(), Some("text/plain"));
        assert!(!received.is_encrypted());
    }

    #[tokio::test]
    async fn test_sequence_advances_per_send() {
        let fabric = fabric();
        let alice = client(&fabric);
        let mut sub = client(&fabric).subscribe("t").await.unwrap();

        for expected in 1..=5u64 {
            alice.send("t", b"x", SendOptions::new()).await.unwrap();
            assert_eq!(next(&mut sub).await.unwrap().seq(), expected);
        }
        assert_eq!(alice.identity().last_sequence(), 5);
    }

    #[tokio::test]
    async fn test_subscriber_only_sees_its_topic() {
        let fabric = fabric();
        let alice = client(&fabric);
        let mut orders = client(&fabric).subscribe("orders").await.unwrap();

        alice.send("audit", b"ignored", SendOptions::new()).await.unwrap();
        alice.send("orders", b"wanted", SendOptions::new()).await.unwrap();

        let received = next(&mut orders).await.unwrap();
        assert_eq!(received.topic(), "orders");
        assert_eq!(received.payload(), b"wanted");
        // audit consumed seq 1
        assert_eq!(received.seq(), 2);
    }

    #[tokio::test]
    async fn test_fan_out_to_independent_subscribers() {
        let fabric = fabric();
        let alice = client(&fabric);
        let bob = client(&fabric);
        let mut first = bob.subscribe("t").await.unwrap();
        let mut second = bob.subscribe("t").await.unwrap();

        alice.send("t", b"once", SendOptions::new()).await.unwrap();

        // each subscription keeps its own replay window
        assert_eq!(next(&mut first).await.unwrap().payload(), b"once");
        assert_eq!(next(&mut second).await.unwrap().payload(), b"once");
    }

    #[tokio::test]
    async fn test_empty_topic_rejected_without_consuming_sequence() {
        let fabric = fabric();
        let alice = client(&fabric);

        let err = alice.send("", b"x", SendOptions::new()).await.unwrap_err();
        assert!(matches!(err, EnvelopeError::EncodingError(_)));
        assert_eq!(alice.identity().last_sequence(), 0);
    }

    // =============================================================================
    // END-TO-END ENCRYPTION
    // =============================================================================

    #[tokio::test]
    async fn test_encrypted_roundtrip_with_keyring() {
        let fabric = fabric();
        let alice = client(&fabric);
        let mut sub = client(&fabric).subscribe("secrets").await.unwrap();

        let key = ContentKey::new(2, [0x42; 32]).unwrap();
        alice
            .send_encrypted("secrets", b"launch codes", SendOptions::new(), &key)
            .await
            .unwrap();

        let received = next(&mut sub).await.unwrap();
        assert!(received.is_encrypted());
        assert_eq!(received.aad().key_version, 2);
        assert_ne!(received.payload(), b"launch codes");

        let keyring: ContentKeyring = [
            ContentKey::new(1, [0x01; 32]).unwrap(),
            ContentKey::new(2, [0x42; 32]).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(received.decrypt(&keyring).unwrap(), b"launch codes");
    }

    #[tokio::test]
    async fn test_encrypted_payload_needs_matching_key_version() {
        let fabric = fabric();
        let alice = client(&fabric);
        let mut sub = client(&fabric).subscribe("secrets").await.unwrap();

        let key = ContentKey::generate(7).unwrap();
        alice
            .send_encrypted("secrets", b"x", SendOptions::new(), &key)
            .await
            .unwrap();
        let received = next(&mut sub).await.unwrap();

        let missing: ContentKeyring = [ContentKey::generate(6).unwrap()].into_iter().collect();
        assert!(matches!(
            received.decrypt(&missing),
            Err(EnvelopeError::InvalidKeyMaterial(_))
        ));

        // right version, wrong key bytes
        let wrong: ContentKeyring = [ContentKey::generate(7).unwrap()].into_iter().collect();
        assert_eq!(
            received.decrypt(&wrong),
            Err(EnvelopeError::AuthenticationFailed(
                fabric_envelope::AuthFailure::AeadTag
            ))
        );
    }

    // =============================================================================
    // SHARED IDENTITY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_senders_share_one_sequence() {
        const TASKS: u64 = 4;
        const PER_TASK: u64 = 25;

        let fabric = fabric();
        let identity = Arc::new(SigningIdentity::generate());
        let mut sub = client(&fabric).subscribe("load").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..TASKS {
            let sender = FabricClient::with_shared(Arc::new(connect(&fabric)), Arc::clone(&identity));
            handles.push(tokio::spawn(async move {
                for _ in 0..PER_TASK {
                    sender.send("load", b"tick", SendOptions::new()).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut seen = HashSet::new();
        for _ in 0..TASKS * PER_TASK {
            let received = next(&mut sub).await.unwrap();
            assert!(seen.insert(received.seq()), "sequence reused");
        }
        let expected: HashSet<u64> = (1..=TASKS * PER_TASK).collect();
        assert_eq!(seen, expected);
        assert_eq!(identity.last_sequence(), TASKS * PER_TASK);
    }

    // =============================================================================
    // TRANSPORT
    // =============================================================================

    #[tokio::test]
    async fn test_config_from_environment_lookup_connects() {
        let fabric = fabric();
        let config = TransportConfig::from_lookup(|name| match name {
            "SF_ENDPOINT" => Some("http://fabric.internal:50051".to_string()),
            "SF_TOKEN" => Some(TOKEN.to_string()),
            _ => None,
        })
        .unwrap();

        let conn = fabric.connect(&config).unwrap();
        let alice = FabricClient::new(conn, SigningIdentity::generate());
        assert!(alice.send("t", b"x", SendOptions::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoked_token_surfaces_transport_error() {
        let fabric = fabric();
        let alice = client(&fabric);
        fabric.revoke_token(TOKEN);

        let err = alice.send("t", b"x", SendOptions::new()).await.unwrap_err();
        assert!(matches!(err, EnvelopeError::Transport(_)));
        assert!(matches!(
            alice.subscribe("t").await,
            Err(EnvelopeError::Transport(_))
        ));
        // a failed publish still consumed the sequence number it was sealed with
        assert_eq!(alice.identity().last_sequence(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_connection_refused() {
        let fabric = InMemoryFabric::new();
        assert!(fabric.connect(&plaintext_config()).is_err());
    }

    #[tokio::test]
    async fn test_stats_reflect_traffic() {
        let fabric = fabric();
        let alice = client(&fabric);
        let bob = client(&fabric);
        let mut sub = bob.subscribe("t").await.unwrap();

        for _ in 0..3 {
            alice.send("t", b"x", SendOptions::new()).await.unwrap();
            next(&mut sub).await.unwrap();
        }

        let stats = bob.stats().await.unwrap();
        assert_eq!(stats.peers, 2);
        assert_eq!(stats.envelopes_published, 3);
        assert_eq!(stats.envelopes_delivered, 3);
        assert!(stats.p95_latency_ms >= 0.0);
        assert!(stats.version.starts_with("fabric-bus/"));
    }

    #[tokio::test]
    async fn test_prometheus_metrics_record_outcomes() {
        let fabric = fabric();
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let alice = client(&fabric).with_metrics(metrics.clone());
        let bob = client(&fabric).with_metrics(metrics.clone());
        let mut sub = bob.subscribe("t").await.unwrap();

        alice.send("t", b"x", SendOptions::new()).await.unwrap();
        next(&mut sub).await.unwrap();

        assert_eq!(metrics.built_total(), 1);
        assert_eq!(metrics.accepted_total(), 1);
        assert!(metrics
            .encode()
            .unwrap()
            .contains("fabric_envelopes_accepted_total 1"));
    }
}
