//! # Fabric Bus - Transport Side of SecureFabric
//!
//! Provides [`TransportConfig`] (endpoint, bearer token, channel security)
//! and [`InMemoryFabric`], a single-process implementation of the
//! `FabricTransport` port used by tests, demos and the CLI.
//!
//! ```text
//! ┌──────────────┐  send()   ┌──────────────┐  subscribe()  ┌──────────────┐
//! │ FabricClient │ ────────► │ InMemory     │ ────────────► │ FabricClient │
//! │  (sender)    │           │ Fabric       │   per topic   │  (receiver)  │
//! └──────────────┘           └──────────────┘               └──────────────┘
//! ```
//!
//! The bus never inspects or verifies envelopes; authenticity is enforced
//! end to end by `fabric-envelope`.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod memory;

pub use config::{ConfigError, TransportConfig, TransportSecurity, DEFAULT_ENDPOINT};
pub use memory::{FabricConnection, InMemoryFabric, FABRIC_VERSION};

/// Envelopes a subscriber may fall behind before it starts losing them.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
