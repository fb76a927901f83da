//! # Fabric Conformance
//!
//! Fixed-vector harness for SecureFabric implementations.
//!
//! The vector file carries five suites:
//! - `encryption.xchacha20_poly1305`: AEAD known answers
//! - `signatures.ed25519`: signing known answers
//! - `replay_protection.tests`: accept/reject sequences for the replay window
//! - `tamper_detection.tests`: AEAD opens that must fail (or succeed)
//! - `envelopes.tests` (optional): full envelope construction from fixed
//!   key, sequence and nonce
//!
//! An implementation is conformant only if it reproduces every output byte
//! for byte and every accept/reject decision exactly.
//!
//! ```rust,ignore
//! let report = ConformanceVectors::bundled()?.run_all();
//! assert!(report.is_conformant(), "{report}");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod report;
mod runner;
pub mod vectors;

pub use report::{CaseResult, ConformanceReport, SuiteReport};
pub use vectors::ConformanceVectors;

use thiserror::Error;

/// Vector loading errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConformanceError {
    #[error("Failed to parse conformance vectors: {0}")]
    Parse(String),

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}
