//! Nullable clock: deterministic time for testing.

use ballot_types::{Clock, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to, or by `step` on every read when
/// constructed with [`NullClock::ticking`].
pub struct NullClock {
    current: AtomicU64,
    step: u64,
}

impl NullClock {
    pub fn new(initial_millis: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_millis),
            step: 0,
        }
    }

    /// A clock that advances by `step` milliseconds after every reading.
    pub fn ticking(initial_millis: u64, step: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_millis),
            step,
        }
    }

    /// Advance time by a number of milliseconds.
    pub fn advance(&self, millis: u64) {
        self.current.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.current.fetch_add(self.step, Ordering::SeqCst))
    }
}
