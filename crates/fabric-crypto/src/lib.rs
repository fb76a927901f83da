//! # Fabric Crypto - Envelope Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | XChaCha20-Poly1305 | End-to-end payload encryption (detached tag) |
//! | `hashing` | BLAKE3 | Message identifiers |
//! | `signatures` | Ed25519 | Envelope authentication |
//!
//! ## Security Properties
//!
//! - **XChaCha20**: 192-bit nonce, safe to draw at random per message
//! - **Ed25519**: Deterministic nonces, strict verification (no malleable signatures)
//! - **BLAKE3**: `msg_id = BLAKE3(pubkey || le64(seq) || nonce)`
//!
//! All operations are synchronous and perform no I/O, except
//! [`Ed25519KeyPair::from_file`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{derive_msg_id, MessageId, MSG_ID_LEN};
pub use signatures::{
    sign, verify, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, PUBLIC_KEY_LEN, SEED_LEN,
    SIGNATURE_LEN,
};
pub use symmetric::{decrypt, encrypt, Nonce, SecretKey, KEY_LEN, NONCE_LEN, TAG_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
