// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A minimal executor driving futures to completion on the calling thread.
//!
//! The [`Runtime`] alternates between two phases: it first polls every outstanding future for a
//! bounded number of rounds, issuing a spin loop hint in between, and once that budget is spent
//! it blocks on a condition variable until either one of the futures wakes it or the configured
//! sleep duration elapses. Waking is only a hint to re-poll early, so futures that never call
//! their waker still complete, just with up to one sleep duration of added latency.

use crate::future::{FutureState, Runnable};
use crate::loom::sync::{Condvar, Mutex};
use core::fmt;
use core::hint;
use core::pin::Pin;
use core::task::Waker;
use core::time::Duration;
use static_assertions::assert_impl_all;
use std::sync::{Arc, PoisonError};
use std::task::Wake;

/// Tunables of a [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// The number of polling rounds before the runtime goes to sleep.
    pub spins_before_sleep: u32,
    /// The longest the runtime sleeps before polling again when no waker fired.
    pub sleep_duration: Duration,
}

/// Drives one or more futures to completion.
///
/// The runtime does not own the futures it waits on, they are passed in per call and borrowed
/// for the duration of it.
pub struct Runtime {
    signal: Arc<Signal>,
    waker: Waker,
    config: RuntimeConfig,
}

/// The wake-up signal shared between a [`Runtime`] and the wakers it hands out.
struct Signal {
    woken: Mutex<bool>,
    cond: Condvar,
}

assert_impl_all!(Runtime: Send, Sync);

// === impl RuntimeConfig ===

impl RuntimeConfig {
    pub const DEFAULT_SPINS_BEFORE_SLEEP: u32 = 1000;
    pub const DEFAULT_SLEEP_DURATION: Duration = Duration::from_millis(1);

    pub const fn new() -> Self {
        Self {
            spins_before_sleep: Self::DEFAULT_SPINS_BEFORE_SLEEP,
            sleep_duration: Self::DEFAULT_SLEEP_DURATION,
        }
    }

    /// Sets the number of polling rounds before sleeping. A value of zero is treated as one.
    #[must_use]
    pub const fn with_spins_before_sleep(mut self, spins: u32) -> Self {
        self.spins_before_sleep = spins;
        self
    }

    #[must_use]
    pub const fn with_sleep_duration(mut self, duration: Duration) -> Self {
        self.sleep_duration = duration;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

// === impl Runtime ===

impl Runtime {
    /// Creates a runtime with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        let signal = Arc::new(Signal::new());
        let waker = Waker::from(signal.clone());

        Self {
            signal,
            waker,
            config,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The waker passed to every future this runtime polls.
    pub fn waker(&self) -> &Waker {
        &self.waker
    }

    /// Blocks until `future` is complete.
    pub fn wait<F: Runnable>(&self, future: Pin<&mut F>) {
        self.wait_multiple(&mut [future as Pin<&mut dyn Runnable>]);
    }

    /// Blocks until every future in `futures` is complete.
    ///
    /// Futures are polled in slice order, but no ordering between their completions is implied.
    /// Futures that are already complete are not polled again.
    #[tracing::instrument(level = "debug", skip_all, fields(futures = futures.len()))]
    pub fn wait_multiple(&self, futures: &mut [Pin<&mut dyn Runnable>]) {
        let spins = self.config.spins_before_sleep.max(1);

        loop {
            for _ in 0..spins {
                if self.poll_all(futures) {
                    tracing::debug!("all futures complete");
                    return;
                }
                hint::spin_loop();
            }

            tracing::trace!(
                sleep_duration = ?self.config.sleep_duration,
                "spin budget exhausted, sleeping"
            );
            self.signal.sleep(self.config.sleep_duration);
        }
    }

    /// Polls every incomplete future once, returning `true` if all of them are complete.
    fn poll_all(&self, futures: &mut [Pin<&mut dyn Runnable>]) -> bool {
        let mut all_complete = true;

        for future in &mut *futures {
            if future.state().is_complete() {
                continue;
            }

            if future.as_mut().poll(&self.waker) != FutureState::Complete {
                all_complete = false;
            }
        }

        all_complete
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// === impl Signal ===

impl Signal {
    fn new() -> Self {
        Self {
            woken: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn notify(&self) {
        let mut woken = self.woken.lock().unwrap_or_else(PoisonError::into_inner);
        *woken = true;
        self.cond.notify_one();
    }

    /// Blocks until notified or `timeout` elapses, consuming any pending notification.
    #[cfg(not(loom))]
    fn sleep(&self, timeout: Duration) {
        let mut woken = self.woken.lock().unwrap_or_else(PoisonError::into_inner);
        if !*woken {
            (woken, _) = self
                .cond
                .wait_timeout(woken, timeout)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *woken = false;
    }

    // loom doesn't model timeouts, every sleep must be ended by a notification
    #[cfg(loom)]
    fn sleep(&self, _timeout: Duration) {
        let mut woken = self.woken.lock().unwrap_or_else(PoisonError::into_inner);
        while !*woken {
            woken = self.cond.wait(woken).unwrap_or_else(PoisonError::into_inner);
        }
        *woken = false;
    }
}

impl Wake for Signal {
    fn wake(self: Arc<Self>) {
        self.notify();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        tracing::trace!("runtime woken");
        self.notify();
    }
}
