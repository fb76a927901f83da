//! # Domain Layer
//!
//! Envelope protocol logic with no I/O: canonical AAD, sequence discipline,
//! building, verifying and the replay window.

pub mod aad;
pub mod builder;
pub mod envelope;
pub mod errors;
pub mod identity;
pub mod keys;
pub mod replay;
pub mod sequence;
pub mod verifier;
