// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::Error;
use crate::runner::{Completion, Job, Runner};
use bitflags::bitflags;
use core::fmt;
use core::pin::Pin;
use core::ptr;
use core::task::Waker;
use miniasync::{Backoff, Future, FutureContext, FutureProperty, FutureState};
use pin_project::{pin_project, pinned_drop};

bitflags! {
    /// Hints passed through to the [`MemcpyFn`](crate::MemcpyFn) of a runner.
    ///
    /// The engine itself never interprets these.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemcpyFlags: u64 {
        /// The destination is persistent memory and should be made durable.
        const DURABLE = 1 << 0;
        /// The destination will not be read soon, bypass the cache where possible.
        const NO_CACHE_HINT = 1 << 1;
    }
}

/// A memory copy operation: `len` bytes from `src` to `dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Memcpy {
    pub dst: *mut u8,
    pub src: *const u8,
    pub len: usize,
    pub flags: MemcpyFlags,
}

/// The data of a [`MemcpyFuture`].
///
/// Read when the operation is started, so the map of a preceding chain entry may still rewrite
/// it.
pub type MemcpyData = Memcpy;

/// The output of a [`MemcpyFuture`], valid once the future is complete.
#[derive(Debug)]
pub struct MemcpyOutput {
    /// The destination of the copy.
    pub dest: *mut u8,
    /// Whether the copy was carried out.
    pub result: Result<(), Error>,
}

pub type MemcpyContext = FutureContext<MemcpyData, MemcpyOutput>;

/// A memory copy executed by a [`Runner`].
///
/// Created by [`Mover::memcpy`](crate::Mover::memcpy). The first poll hands the operation to
/// the runner, later polls check its completion flag.
///
/// Dropping a future whose operation was started but has not completed yet blocks until the
/// runner is done with it.
#[pin_project(PinnedDrop)]
#[must_use = "futures do nothing unless polled"]
pub struct MemcpyFuture<'r> {
    #[pin]
    context: MemcpyContext,
    runner: &'r dyn Runner,
    started: bool,
    #[pin]
    completion: Completion,
}

// === impl Memcpy ===

impl Memcpy {
    pub const fn new(dst: *mut u8, src: *const u8, len: usize, flags: MemcpyFlags) -> Self {
        Self {
            dst,
            src,
            len,
            flags,
        }
    }
}

// === impl MemcpyOutput ===

impl Default for MemcpyOutput {
    fn default() -> Self {
        Self {
            dest: ptr::null_mut(),
            result: Ok(()),
        }
    }
}

// === impl MemcpyFuture ===

impl<'r> MemcpyFuture<'r> {
    pub(crate) fn new(runner: &'r dyn Runner, op: Memcpy) -> Self {
        Self {
            context: FutureContext::new(op, MemcpyOutput::default()),
            runner,
            started: false,
            completion: Completion::new(),
        }
    }

    /// Returns `true` once the operation has been handed to the runner.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Future for MemcpyFuture<'_> {
    type Data = MemcpyData;
    type Output = MemcpyOutput;

    fn context(&self) -> &MemcpyContext {
        &self.context
    }

    fn context_mut(self: Pin<&mut Self>) -> Pin<&mut MemcpyContext> {
        self.project().context
    }

    fn poll_task(self: Pin<&mut Self>, waker: &Waker) -> FutureState {
        let this = self.project();
        let cx = this.context.get_mut();

        if !*this.started {
            let op = *cx.data();
            this.completion.reset();

            // Safety: the completion is pinned and our destructor waits for started jobs
            let job = unsafe { Job::new(op, this.completion.as_ref(), waker.clone()) };

            match this.runner.start(job) {
                Ok(()) => {
                    tracing::trace!(len = op.len, "memcpy started");
                    *this.started = true;
                }
                Err(Error::Busy) => {
                    tracing::trace!("runner busy, retrying on next poll");
                    return FutureState::Running;
                }
                Err(err) => {
                    tracing::warn!(%err, "failed to start memcpy");
                    let output = cx.output_mut();
                    output.dest = op.dst;
                    output.result = Err(err);
                    return FutureState::Complete;
                }
            }
        }

        match this.completion.outcome() {
            None => FutureState::Running,
            Some(result) => {
                let dst = cx.data().dst;
                let output = cx.output_mut();
                output.dest = dst;
                output.result = result;
                FutureState::Complete
            }
        }
    }

    fn has_property(&self, property: FutureProperty) -> bool {
        match property {
            FutureProperty::Async => self.runner.is_async(),
            _ => false,
        }
    }
}

#[pinned_drop]
impl PinnedDrop for MemcpyFuture<'_> {
    fn drop(self: Pin<&mut Self>) {
        if !self.started || self.completion.is_complete() {
            return;
        }

        tracing::debug!("memcpy future dropped while in flight, waiting for runner");
        let mut backoff = Backoff::new();
        while !self.completion.is_complete() {
            backoff.snooze();
        }
    }
}

impl fmt::Debug for MemcpyFuture<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemcpyFuture")
            .field("context", &self.context)
            .field("started", &self.started)
            .field("completion", &self.completion)
            .finish_non_exhaustive()
    }
}
