//! Prometheus metrics for envelope outcomes.
//!
//! All metrics follow the naming convention: `fabric_<metric>_<unit>`
//!
//! - `fabric_envelopes_built_total`: envelopes sealed by this process
//! - `fabric_envelopes_accepted_total`: envelopes that passed verification
//! - `fabric_envelopes_rejected_total{reason}`: rejections by stable reason label

use crate::TelemetryError;
use fabric_envelope::EnvelopeMetrics;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// [`EnvelopeMetrics`] backed by a private Prometheus registry.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    built: IntCounter,
    accepted: IntCounter,
    rejected: IntCounterVec,
}

impl PrometheusMetrics {
    /// Create and register all envelope metrics.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let built = IntCounter::new(
            "fabric_envelopes_built_total",
            "Total number of envelopes sealed",
        )
        .map_err(metrics_err)?;
        let accepted = IntCounter::new(
            "fabric_envelopes_accepted_total",
            "Total number of envelopes that passed verification",
        )
        .map_err(metrics_err)?;
        let rejected = IntCounterVec::new(
            Opts::new(
                "fabric_envelopes_rejected_total",
                "Total number of envelopes rejected by the verifier",
            ),
            &["reason"],
        )
        .map_err(metrics_err)?;

        registry
            .register(Box::new(built.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(accepted.clone()))
            .map_err(metrics_err)?;
        registry
            .register(Box::new(rejected.clone()))
            .map_err(metrics_err)?;

        Ok(Self {
            registry,
            built,
            accepted,
            rejected,
        })
    }

    /// Registry holding the envelope metrics, for merging into an exporter.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_err)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }

    /// Envelopes sealed so far.
    pub fn built_total(&self) -> u64 {
        self.built.get()
    }

    /// Envelopes accepted so far.
    pub fn accepted_total(&self) -> u64 {
        self.accepted.get()
    }

    /// Rejections recorded under `reason`.
    pub fn rejected_total(&self, reason: &str) -> u64 {
        self.rejected.with_label_values(&[reason]).get()
    }
}

impl EnvelopeMetrics for PrometheusMetrics {
    fn record_built(&self, _topic: &str) {
        self.built.inc();
    }

    fn record_accepted(&self, _topic: &str) {
        self.accepted.inc();
    }

    fn record_rejected(&self, reason: &str) {
        self.rejected.with_label_values(&[reason]).inc();
    }
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics")
            .field("built", &self.built.get())
            .field("accepted", &self.accepted.get())
            .finish_non_exhaustive()
    }
}

fn metrics_err(e: prometheus::Error) -> TelemetryError {
    TelemetryError::MetricsInit(e.to_string())
}
