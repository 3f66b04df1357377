// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::hint;

/// Exponential backoff for loops waiting on another thread to finish an operation.
///
/// [`spin`](Self::spin) only ever issues spin loop hints, [`snooze`](Self::snooze) additionally
/// yields the thread to the OS once spinning stopped paying off (when the `std` feature is enabled).
#[derive(Debug, Copy, Clone)]
pub struct Backoff {
    step: u8,
}

// === impl Backoff ===

impl Backoff {
    /// Spinning stops growing after `2^SPIN_LIMIT` hints.
    const SPIN_LIMIT: u8 = 6;
    /// Past this step `snooze` yields instead of spinning.
    const YIELD_LIMIT: u8 = 10;

    #[must_use]
    pub const fn new() -> Self {
        Self { step: 0 }
    }

    /// Issues `2^step` spin loop hints, doubling the count on every call up to a limit.
    #[inline]
    pub fn spin(&mut self) {
        for _ in 0..1_u32 << self.step.min(Self::SPIN_LIMIT) {
            hint::spin_loop();
        }

        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Like [`spin`](Self::spin), but yields the current thread once the spin limit has been
    /// reached.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            for _ in 0..1_u32 << self.step {
                hint::spin_loop();
            }
        } else {
            #[cfg(feature = "std")]
            crate::loom::thread_yield();
            #[cfg(not(feature = "std"))]
            for _ in 0..1_u32 << Self::SPIN_LIMIT {
                hint::spin_loop();
            }
        }

        if self.step <= Self::YIELD_LIMIT {
            self.step += 1;
        }
    }

    /// Returns `true` once spinning has stopped paying off and callers should consider blocking.
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.step > Self::YIELD_LIMIT
    }

    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
