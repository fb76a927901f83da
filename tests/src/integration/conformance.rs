//! # Conformance Through the Public API
//!
//! Replays the bundled vectors and the reference demo envelope end to end:
//! built by one client, carried by the fabric, verified by another.

#[cfg(test)]
mod tests {
    use super::super::support::{connect, fabric, next};
    use fabric_conformance::ConformanceVectors;
    use fabric_envelope::{
        EnvelopeBuilder, FabricClient, FabricTransport, MessagingApi, SendOptions,
        SequenceCounter, SigningIdentity,
    };
    use std::sync::Arc;

    const DEMO_SECRET: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const DEMO_SIG: &str = "627e2aa99d0093c29903a0723108d1147919537f2cb521f04e0211d9a5abf307a1e4ae62d6ddeb099ced0e9f5bd8b41fe59171ad7b63623541acd272a4c6b700";
    const DEMO_MSG_ID: &str = "71a3dc2387b9aad8e15719f107ba5a11b164e2f0f8fb39a02cd55182aa3dd9c0";

    #[test]
    fn test_bundled_vectors_are_conformant() {
        let report = ConformanceVectors::bundled().unwrap().run_all();
        assert!(report.is_conformant(), "{report}");
    }

    #[tokio::test]
    async fn test_demo_envelope_crosses_the_fabric_intact() {
        let vectors = ConformanceVectors::bundled().unwrap();
        let demo = &vectors.envelopes.as_ref().unwrap().tests[0];
        assert_eq!(hex::encode(&demo.secret_key), DEMO_SECRET);

        let identity = SigningIdentity::from_secret_bytes(&demo.secret_key).unwrap();
        let builder = EnvelopeBuilder::new(Arc::new(identity));
        let nonce: [u8; 24] = demo.nonce.as_slice().try_into().unwrap();
        let envelope = builder
            .seal_with_nonce(nonce, "demo.messages", b"Hello from Python!", &SendOptions::new())
            .unwrap();

        assert_eq!(envelope.seq(), 1);
        assert_eq!(envelope.msg_id(), DEMO_MSG_ID);
        assert_eq!(envelope.msg_id(), demo.msg_id);
        assert_eq!(envelope.sig(), demo.sig.as_slice());

        let fabric = fabric();
        let wire = connect(&fabric);
        let receiver = FabricClient::new(connect(&fabric), SigningIdentity::generate());
        let mut sub = receiver.subscribe("demo.messages").await.unwrap();
        wire.send(envelope).await.unwrap();

        let verified = next(&mut sub).await.unwrap();
        assert_eq!(verified.payload(), b"Hello from Python!");
        assert_eq!(verified.msg_id().to_hex(), DEMO_MSG_ID);
    }

    #[test]
    fn test_plaintext_envelope_vectors_reproduce_after_resume() {
        let vectors = ConformanceVectors::bundled().unwrap();
        for vector in &vectors.envelopes.as_ref().unwrap().tests {
            if vector.encryption_key.is_some() {
                continue;
            }
            let identity = SigningIdentity::from_secret_bytes(&vector.secret_key)
                .unwrap()
                .with_sequence(SequenceCounter::resume_after(vector.seq - 1));
            let nonce: [u8; 24] = vector.nonce.as_slice().try_into().unwrap();
            let mut options = SendOptions::new();
            if let Some(tenant) = &vector.tenant_id {
                options = options.tenant_id(tenant.clone());
            }
            if let Some(content_type) = &vector.content_type {
                options = options.content_type(content_type.clone());
            }
            let envelope = EnvelopeBuilder::new(Arc::new(identity))
                .seal_with_nonce(nonce, &vector.topic, &vector.payload, &options)
                .unwrap();
            assert_eq!(envelope.seq(), vector.seq, "{}", vector.description);
            assert_eq!(hex::encode(envelope.sig()), hex::encode(&vector.sig));
        }
    }

    #[test]
    fn test_demo_signature_constant_matches_vector_file() {
        let vectors = ConformanceVectors::bundled().unwrap();
        let demo = &vectors.envelopes.as_ref().unwrap().tests[0];
        assert_eq!(hex::encode(&demo.sig), DEMO_SIG);
    }
}
