//! # Integration Tests
//!
//! Every test runs full `FabricClient`s over an `InMemoryFabric`, so the
//! builder, transport, verifier and replay windows are exercised together.

pub mod attacks;
pub mod conformance;
pub mod flows;

#[cfg(test)]
pub(crate) mod support {
    use fabric_bus::{FabricConnection, InMemoryFabric, TransportConfig, TransportSecurity};
    use fabric_envelope::{
        EnvelopeError, FabricClient, SigningIdentity, VerifiedEnvelope, VerifiedSubscription,
    };
    use std::time::Duration;
    use tokio::time::timeout;

    pub const TOKEN: &str = "integration-token";

    /// Fabric accepting [`TOKEN`].
    pub fn fabric() -> InMemoryFabric {
        let fabric = InMemoryFabric::new();
        fabric.authorize_token(TOKEN);
        fabric
    }

    pub fn plaintext_config() -> TransportConfig {
        TransportConfig::new("http://127.0.0.1:50051", TOKEN, TransportSecurity::Plaintext)
            .expect("valid config")
    }

    pub fn connect(fabric: &InMemoryFabric) -> FabricConnection {
        fabric.connect(&plaintext_config()).expect("connect")
    }

    /// Client with a fresh identity on its own connection.
    pub fn client(fabric: &InMemoryFabric) -> FabricClient<FabricConnection> {
        FabricClient::new(connect(fabric), SigningIdentity::generate())
    }

    /// Next delivery, failing the test after 500ms.
    pub async fn next(
        sub: &mut VerifiedSubscription,
    ) -> Result<VerifiedEnvelope, EnvelopeError> {
        timeout(Duration::from_millis(500), sub.recv())
            .await
            .expect("timed out waiting for delivery")
            .expect("subscription closed")
    }

    /// Assert nothing arrives within 50ms.
    pub async fn assert_idle(sub: &mut VerifiedSubscription) {
        assert!(
            timeout(Duration::from_millis(50), sub.recv()).await.is_err(),
            "unexpected delivery"
        );
    }
}
