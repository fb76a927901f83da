//! # Outbound Ports (Driven Ports / SPI)
//!
//! Dependencies this crate needs: a transport carrying envelopes, and an
//! optional metrics sink. The envelope protocol never depends on a concrete
//! transport, so it can be exercised against an in-memory one.

use crate::domain::envelope::Envelope;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

/// Errors reported by a transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Bearer token missing, wrong or revoked
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The transport has shut down
    #[error("Transport closed")]
    Closed,

    /// The transport refused the envelope
    #[error("Envelope rejected by transport: {0}")]
    Rejected(String),

    /// Transport could not be reached
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// Acknowledgement of a published envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendAck {
    /// Message id of the published envelope
    pub msg_id: String,
    /// Subscribers the envelope was handed to
    pub delivered_to: usize,
}

/// Transport-level counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FabricStats {
    /// Connected peers
    pub peers: u64,
    /// Envelopes accepted for publication
    pub envelopes_published: u64,
    /// Envelope deliveries to subscribers
    pub envelopes_delivered: u64,
    /// 95th percentile publish-to-delivery latency
    pub p95_latency_ms: f64,
    /// Transport version string
    pub version: String,
}

/// Stream of raw envelopes for one topic.
pub type EnvelopeStream = Pin<Box<dyn Stream<Item = Result<Envelope, TransportError>> + Send>>;

/// Channel carrying envelopes between peers.
///
/// Authentication of the channel itself (bearer token, TLS) belongs to the
/// implementation.
#[async_trait]
pub trait FabricTransport: Send + Sync {
    /// Publish one envelope.
    async fn send(&self, envelope: Envelope) -> Result<SendAck, TransportError>;

    /// Receive envelopes published on `topic` from now on.
    async fn subscribe(&self, topic: &str) -> Result<EnvelopeStream, TransportError>;

    /// Transport counters.
    async fn stats(&self) -> Result<FabricStats, TransportError>;
}

/// Metrics sink for envelope outcomes.
///
/// Implement this trait to integrate with an external metrics system.
pub trait EnvelopeMetrics: Send + Sync {
    /// An envelope was sealed.
    fn record_built(&self, topic: &str);

    /// An envelope passed verification.
    fn record_accepted(&self, topic: &str);

    /// An envelope was rejected; `reason` is a stable label.
    fn record_rejected(&self, reason: &str);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpMetrics;

impl EnvelopeMetrics for NoOpMetrics {
    fn record_built(&self, _: &str) {}
    fn record_accepted(&self, _: &str) {}
    fn record_rejected(&self, _: &str) {}
}
