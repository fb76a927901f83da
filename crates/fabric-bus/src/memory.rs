//! # In-Memory Fabric
//!
//! Single-process implementation of the `FabricTransport` port.
//!
//! Uses `tokio::sync::broadcast` for multi-producer, multi-consumer delivery;
//! subscribers filter by topic. Every call re-checks the connection's bearer
//! token, so revoking a token cuts off an existing connection.

use crate::config::TransportConfig;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use fabric_envelope::{
    Envelope, EnvelopeStream, FabricStats, FabricTransport, SendAck, TransportError,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Latency samples kept for the p95 estimate.
const LATENCY_SAMPLES: usize = 1024;

/// Version string reported in [`FabricStats`].
pub const FABRIC_VERSION: &str = concat!("fabric-bus/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
struct Delivery {
    envelope: Envelope,
    published_at: Instant,
}

struct FabricState {
    sender: broadcast::Sender<Delivery>,
    tokens: RwLock<HashSet<String>>,
    peers: AtomicU64,
    published: AtomicU64,
    delivered: AtomicU64,
    latencies: Mutex<VecDeque<Duration>>,
}

impl FabricState {
    fn authorize(&self, token: &str) -> Result<(), TransportError> {
        if self.tokens.read().contains(token) {
            Ok(())
        } else {
            Err(TransportError::Unauthorized(
                "bearer token not recognised".to_string(),
            ))
        }
    }

    fn record_delivery(&self, published_at: Instant) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        let mut latencies = self.latencies.lock();
        if latencies.len() == LATENCY_SAMPLES {
            latencies.pop_front();
        }
        latencies.push_back(published_at.elapsed());
    }

    fn p95_latency_ms(&self) -> f64 {
        let mut samples: Vec<Duration> = self.latencies.lock().iter().copied().collect();
        if samples.is_empty() {
            return 0.0;
        }
        samples.sort_unstable();
        // nearest-rank percentile
        let rank = (samples.len() * 95).div_ceil(100).max(1);
        samples[rank - 1].as_secs_f64() * 1000.0
    }
}

/// In-process message fabric.
///
/// Cheap to clone; clones share the same channel and counters.
#[derive(Clone)]
pub struct InMemoryFabric {
    state: Arc<FabricState>,
    capacity: NonZeroUsize,
}

impl InMemoryFabric {
    /// Create a fabric with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(NonZeroUsize::MIN.saturating_add(DEFAULT_CHANNEL_CAPACITY - 1))
    }

    /// Create a fabric whose subscribers may lag at most `capacity` envelopes.
    #[must_use]
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        let (sender, _) = broadcast::channel(capacity.get());
        Self {
            state: Arc::new(FabricState {
                sender,
                tokens: RwLock::new(HashSet::new()),
                peers: AtomicU64::new(0),
                published: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
                latencies: Mutex::new(VecDeque::with_capacity(LATENCY_SAMPLES)),
            }),
            capacity,
        }
    }

    /// Accept connections presenting `token`.
    pub fn authorize_token(&self, token: impl Into<String>) {
        self.state.tokens.write().insert(token.into());
    }

    /// Stop accepting `token`; returns whether it was known.
    pub fn revoke_token(&self, token: &str) -> bool {
        let removed = self.state.tokens.write().remove(token);
        if removed {
            info!("Bearer token revoked");
        }
        removed
    }

    /// Open a connection.
    ///
    /// The in-memory fabric has no channel to secure; TLS settings are
    /// accepted as validated by [`TransportConfig`] and otherwise unused.
    pub fn connect(&self, config: &TransportConfig) -> Result<FabricConnection, TransportError> {
        self.state.authorize(config.bearer_token())?;
        self.state.peers.fetch_add(1, Ordering::Relaxed);
        debug!(
            endpoint = %config.endpoint(),
            tls = config.security().is_tls(),
            "Peer connected"
        );
        Ok(FabricConnection {
            state: Arc::clone(&self.state),
            token: config.bearer_token().to_string(),
        })
    }

    /// Number of live subscription streams.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.sender.receiver_count()
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl Default for InMemoryFabric {
    fn default() -> Self {
        Self::new()
    }
}

/// One authenticated peer's handle on an [`InMemoryFabric`].
pub struct FabricConnection {
    state: Arc<FabricState>,
    token: String,
}

impl Drop for FabricConnection {
    fn drop(&mut self) {
        self.state.peers.fetch_sub(1, Ordering::Relaxed);
        debug!("Peer disconnected");
    }
}

#[async_trait]
impl FabricTransport for FabricConnection {
    async fn send(&self, envelope: Envelope) -> Result<SendAck, TransportError> {
        self.state.authorize(&self.token)?;
        self.state.published.fetch_add(1, Ordering::Relaxed);

        let msg_id = envelope.msg_id().to_string();
        let topic = envelope.topic().to_string();
        let delivery = Delivery {
            envelope,
            published_at: Instant::now(),
        };

        let delivered_to = match self.state.sender.send(delivery) {
            Ok(count) => count,
            Err(_) => {
                // No receivers; publishing into the void is not an error
                debug!(topic = %topic, msg_id = %msg_id, "No subscribers for envelope");
                0
            }
        };
        Ok(SendAck {
            msg_id,
            delivered_to,
        })
    }

    async fn subscribe(&self, topic: &str) -> Result<EnvelopeStream, TransportError> {
        self.state.authorize(&self.token)?;

        let state = Arc::clone(&self.state);
        let topic = topic.to_string();
        debug!(topic = %topic, "Subscription created");

        let stream = BroadcastStream::new(self.state.sender.subscribe()).filter_map(move |item| {
            match item {
                Ok(delivery) if delivery.envelope.topic() == topic => {
                    state.record_delivery(delivery.published_at);
                    Some(Ok(delivery.envelope))
                }
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(count)) => {
                    warn!(topic = %topic, lagged = count, "Subscriber lagged, envelopes dropped");
                    None
                }
            }
        });
        Ok(Box::pin(stream))
    }

    async fn stats(&self) -> Result<FabricStats, TransportError> {
        self.state.authorize(&self.token)?;
        Ok(FabricStats {
            peers: self.state.peers.load(Ordering::Relaxed),
            envelopes_published: self.state.published.load(Ordering::Relaxed),
            envelopes_delivered: self.state.delivered.load(Ordering::Relaxed),
            p95_latency_ms: self.state.p95_latency_ms(),
            version: FABRIC_VERSION.to_string(),
        })
    }
}
