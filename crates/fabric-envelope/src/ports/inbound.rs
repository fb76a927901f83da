//! # Inbound Ports (Driving Ports / API)
//!
//! The messaging API applications call.

use crate::domain::builder::SendOptions;
use crate::domain::errors::EnvelopeError;
use crate::domain::keys::ContentKey;
use crate::ports::outbound::FabricStats;
use crate::subscription::VerifiedSubscription;
use async_trait::async_trait;

/// Primary SecureFabric messaging API.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Seal `payload` for `topic` and publish it.
    ///
    /// Returns the hex message id.
    async fn send(
        &self,
        topic: &str,
        payload: &[u8],
        options: SendOptions,
    ) -> Result<String, EnvelopeError>;

    /// Encrypt `payload` under `key`, seal and publish it.
    async fn send_encrypted(
        &self,
        topic: &str,
        payload: &[u8],
        options: SendOptions,
        key: &ContentKey,
    ) -> Result<String, EnvelopeError>;

    /// Subscribe to `topic`; every delivered envelope is verified before it
    /// is yielded.
    async fn subscribe(&self, topic: &str) -> Result<VerifiedSubscription, EnvelopeError>;

    /// Transport counters.
    async fn stats(&self) -> Result<FabricStats, EnvelopeError>;
}
