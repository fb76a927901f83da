//! # SecureFabric Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks: seal, verify, replay window
//! └── src/integration/  # Cross-crate flows over the in-memory fabric
//!     ├── flows.rs      # send -> subscribe -> verify -> decrypt
//!     ├── attacks.rs    # replay, forgery, relabelling, untrusted senders
//!     └── conformance.rs# bundled vectors through the public API
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fabric-tests
//! cargo test -p fabric-tests integration::attacks::
//! cargo bench -p fabric-tests
//! ```

pub mod integration;
