//! # Fabric Envelope
//!
//! Issues and verifies tamper-evident, replay-resistant envelopes for the
//! SecureFabric pub/sub message fabric.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): AAD, sequence counter, builder, verifier,
//!   replay window; no I/O
//! - **Ports Layer** (`ports/`): `MessagingApi` inbound, `FabricTransport` and
//!   `EnvelopeMetrics` outbound
//! - **Service Layer** (`service.rs`): `FabricClient` wiring domain to ports
//!
//! ## Data Flow
//!
//! ```text
//! send:    payload -> AAD -> [XChaCha20-Poly1305] -> Ed25519(aad || body)
//!                  -> msg_id = BLAKE3(pubkey || le64(seq) || nonce) -> transport
//! receive: transport -> msg_id / AAD checks -> replay check -> signature
//!                  -> replay commit -> [decrypt]
//! ```
//!
//! ## Security Notes
//!
//! - Fail closed: every malformed or inconclusive check is a rejection
//! - A failed build never consumes a sequence number
//! - Forged envelopes never reach the replay window

pub mod domain;
pub mod ports;
pub mod service;
pub mod subscription;

// Re-export public API
pub use domain::aad::{Aad, CanonicalFormatter};
pub use domain::builder::{EnvelopeBuilder, SendOptions};
pub use domain::envelope::{Envelope, EnvelopeParts};
pub use domain::errors::{AuthFailure, EnvelopeError, ReplayReason};
pub use domain::identity::SigningIdentity;
pub use domain::keys::{ContentKey, ContentKeyring};
pub use domain::replay::{ReplayFilter, DEFAULT_WINDOW_SIZE};
pub use domain::sequence::SequenceCounter;
pub use domain::verifier::{
    EnvelopeVerifier, ReceiverConfig, VerifiedEnvelope, DEFAULT_MAX_SENDERS,
};
pub use ports::inbound::MessagingApi;
pub use ports::outbound::{
    EnvelopeMetrics, EnvelopeStream, FabricStats, FabricTransport, NoOpMetrics, SendAck,
    TransportError,
};
pub use service::FabricClient;
pub use subscription::VerifiedSubscription;
