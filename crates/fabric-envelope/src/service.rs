//! # Fabric Client Service
//!
//! Application service that implements the `MessagingApi` trait.
//!
//! ## Architecture
//!
//! - Implements the inbound port (`MessagingApi`)
//! - Publishes through the outbound port (`FabricTransport`)
//! - Delegates sealing and verification to the domain layer

use crate::domain::builder::{EnvelopeBuilder, SendOptions};
use crate::domain::envelope::Envelope;
use crate::domain::errors::EnvelopeError;
use crate::domain::identity::SigningIdentity;
use crate::domain::keys::ContentKey;
use crate::domain::verifier::{EnvelopeVerifier, ReceiverConfig};
use crate::ports::inbound::MessagingApi;
use crate::ports::outbound::{EnvelopeMetrics, FabricStats, FabricTransport, NoOpMetrics};
use crate::subscription::VerifiedSubscription;
use async_trait::async_trait;
use fabric_crypto::Ed25519PublicKey;
use std::sync::Arc;
use tracing::{debug, info};

/// SecureFabric client bound to one signing identity and one transport.
///
/// Each subscription gets its own verifier, so replay windows are kept per
/// (sender, subscription) pair.
pub struct FabricClient<T: FabricTransport> {
    transport: Arc<T>,
    builder: EnvelopeBuilder,
    receiver: ReceiverConfig,
    trusted_senders: Option<Vec<Ed25519PublicKey>>,
    metrics: Arc<dyn EnvelopeMetrics>,
}

impl<T: FabricTransport> FabricClient<T> {
    /// Create a client signing as `identity`.
    pub fn new(transport: T, identity: SigningIdentity) -> Self {
        Self::with_shared(Arc::new(transport), Arc::new(identity))
    }

    /// Create a client over a shared transport and identity.
    pub fn with_shared(transport: Arc<T>, identity: Arc<SigningIdentity>) -> Self {
        info!(sender = %identity.public_key(), "Fabric client created");
        Self {
            transport,
            builder: EnvelopeBuilder::new(identity),
            receiver: ReceiverConfig::default(),
            trusted_senders: None,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Receiver settings for new subscriptions.
    #[must_use]
    pub fn with_receiver_config(mut self, receiver: ReceiverConfig) -> Self {
        self.receiver = receiver;
        self
    }

    /// Only accept envelopes signed by `keys` on new subscriptions.
    #[must_use]
    pub fn with_trusted_senders(mut self, keys: impl IntoIterator<Item = Ed25519PublicKey>) -> Self {
        self.trusted_senders = Some(keys.into_iter().collect());
        self
    }

    /// Record outcomes into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn EnvelopeMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Sender public key as hex.
    pub fn public_key_hex(&self) -> String {
        self.builder.identity().public_key_hex()
    }

    /// The signing identity.
    pub fn identity(&self) -> &Arc<SigningIdentity> {
        self.builder.identity()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Builder used for outgoing envelopes.
    pub fn builder(&self) -> &EnvelopeBuilder {
        &self.builder
    }

    fn new_verifier(&self) -> EnvelopeVerifier {
        let verifier = EnvelopeVerifier::new(self.receiver);
        match &self.trusted_senders {
            Some(keys) => verifier.with_trusted_senders(keys.iter().copied()),
            None => verifier,
        }
    }

    async fn publish(&self, envelope: Envelope) -> Result<String, EnvelopeError> {
        self.metrics.record_built(envelope.topic());
        let topic = envelope.topic().to_string();
        let seq = envelope.seq();

        let ack = self.transport.send(envelope).await.map_err(|e| {
            self.metrics.record_rejected("transport");
            EnvelopeError::Transport(e.to_string())
        })?;

        debug!(
            topic = %topic,
            seq,
            msg_id = %ack.msg_id,
            delivered_to = ack.delivered_to,
            "Envelope published"
        );
        Ok(ack.msg_id)
    }
}

#[async_trait]
impl<T: FabricTransport> MessagingApi for FabricClient<T> {
    async fn send(
        &self,
        topic: &str,
        payload: &[u8],
        options: SendOptions,
    ) -> Result<String, EnvelopeError> {
        let envelope = self.builder.seal(topic, payload, &options)?;
        self.publish(envelope).await
    }

    async fn send_encrypted(
        &self,
        topic: &str,
        payload: &[u8],
        options: SendOptions,
        key: &ContentKey,
    ) -> Result<String, EnvelopeError> {
        let envelope = self.builder.seal_encrypted(topic, payload, &options, key)?;
        self.publish(envelope).await
    }

    async fn subscribe(&self, topic: &str) -> Result<VerifiedSubscription, EnvelopeError> {
        let stream = self
            .transport
            .subscribe(topic)
            .await
            .map_err(|e| EnvelopeError::Transport(e.to_string()))?;

        info!(topic = %topic, window_size = self.receiver.window_size.get(), "Subscribed");
        Ok(VerifiedSubscription::new(
            topic.to_string(),
            stream,
            self.new_verifier(),
            Arc::clone(&self.metrics),
        ))
    }

    async fn stats(&self) -> Result<FabricStats, EnvelopeError> {
        self.transport
            .stats()
            .await
            .map_err(|e| EnvelopeError::Transport(e.to_string()))
    }
}
