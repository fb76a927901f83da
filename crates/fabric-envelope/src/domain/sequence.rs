//! # Sequence Counter
//!
//! Per-identity monotonic counter. The first value issued is 1; 0 is never
//! issued and never accepted by a receiver.

use super::errors::EnvelopeError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free monotonic sequence counter.
///
/// Concurrent callers sharing one counter never observe the same value.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    last_issued: AtomicU64,
}

impl SequenceCounter {
    /// Fresh counter; the first `next()` returns 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue after a persisted value; the first `next()` returns
    /// `last_issued + 1`.
    pub fn resume_after(last_issued: u64) -> Self {
        Self {
            last_issued: AtomicU64::new(last_issued),
        }
    }

    /// Issue the next sequence number.
    ///
    /// # Errors
    ///
    /// `SequenceViolation` once `u64::MAX` has been issued.
    pub fn next(&self) -> Result<u64, EnvelopeError> {
        self.last_issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                last.checked_add(1)
            })
            .map(|last| last + 1)
            .map_err(|_| EnvelopeError::SequenceViolation("sequence space exhausted".to_string()))
    }

    /// Most recently issued value, 0 if none.
    pub fn last_issued(&self) -> u64 {
        self.last_issued.load(Ordering::Acquire)
    }
}
