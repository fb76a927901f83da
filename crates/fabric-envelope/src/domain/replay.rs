//! # Replay Filter
//!
//! Receiver-side sliding window over one sender's sequence numbers.
//!
//! With high-water mark `M` and window `W`, an incoming counter `c` is:
//! - accepted if `c > M` (window slides forward, `M = c`)
//! - rejected as too old if `M - c >= W`
//! - rejected as duplicate if already seen, otherwise accepted
//!
//! Counter 0 is never valid. Memory is `W` bits regardless of traffic.

use super::errors::ReplayReason;
use bitvec::prelude::*;
use std::num::NonZeroUsize;

/// Default window size (counters tracked below the high-water mark).
pub const DEFAULT_WINDOW_SIZE: usize = 64;

/// Sliding-window duplicate and staleness detector.
///
/// Seen-bits live in a ring indexed by `c % W`. Slot `i` describes the unique
/// counter in `(M - W, M]` congruent to `i`.
#[derive(Debug, Clone)]
pub struct ReplayFilter {
    window: NonZeroUsize,
    high_water: u64,
    seen: BitVec<u64, Lsb0>,
}

impl ReplayFilter {
    /// Create an empty filter tracking `window` counters.
    pub fn new(window: NonZeroUsize) -> Self {
        Self {
            window,
            high_water: 0,
            seen: bitvec![u64, Lsb0; 0; window.get()],
        }
    }

    /// Number of counters tracked.
    pub fn window_size(&self) -> usize {
        self.window.get()
    }

    /// Highest counter accepted so far, 0 if none.
    pub fn high_water_mark(&self) -> u64 {
        self.high_water
    }

    fn slot(&self, counter: u64) -> usize {
        (counter % self.window.get() as u64) as usize
    }

    /// Decide without recording.
    pub fn check(&self, counter: u64) -> Result<(), ReplayReason> {
        if counter == 0 {
            return Err(ReplayReason::TooOld);
        }
        if counter > self.high_water {
            return Ok(());
        }
        if self.high_water - counter >= self.window.get() as u64 {
            return Err(ReplayReason::TooOld);
        }
        if self.seen[self.slot(counter)] {
            Err(ReplayReason::Duplicate)
        } else {
            Ok(())
        }
    }

    /// Decide and, on acceptance, record `counter` as seen.
    pub fn accept(&mut self, counter: u64) -> Result<(), ReplayReason> {
        self.check(counter)?;

        if counter > self.high_water {
            let advance = counter - self.high_water;
            if advance >= self.window.get() as u64 {
                self.seen.fill(false);
            } else {
                // slots of (M, c] held counters that just fell out of the window
                for dropped in (self.high_water + 1)..=counter {
                    let slot = self.slot(dropped);
                    self.seen.set(slot, false);
                }
            }
            self.high_water = counter;
        }

        let slot = self.slot(counter);
        self.seen.set(slot, true);
        Ok(())
    }
}

impl Default for ReplayFilter {
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN.saturating_add(DEFAULT_WINDOW_SIZE - 1))
    }
}
