//! # Fabric Telemetry
//!
//! Observability for SecureFabric processes.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter` and a
//!   human-readable or JSON formatter
//! - **Metrics**: [`PrometheusMetrics`], an `EnvelopeMetrics` recorder
//!   exposing envelope counters in Prometheus text format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fabric_telemetry::{init_logging, PrometheusMetrics, TelemetryConfig};
//!
//! init_logging(&TelemetryConfig::from_env())?;
//! let metrics = std::sync::Arc::new(PrometheusMetrics::new()?);
//! let client = FabricClient::new(transport, identity).with_metrics(metrics.clone());
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FABRIC_SERVICE_NAME` | `securefabric` | Service name in the startup log |
//! | `FABRIC_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `FABRIC_JSON_LOGS` | `false` | JSON log lines |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::PrometheusMetrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
