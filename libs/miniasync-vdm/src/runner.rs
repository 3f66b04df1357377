// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::Error;
use crate::loom::sync::atomic::{AtomicU8, Ordering};
use crate::memcpy::{Memcpy, MemcpyFlags};
use core::fmt;
use core::marker::PhantomPinned;
use core::pin::Pin;
use core::ptr::{self, NonNull};
use core::task::Waker;

/// A routine performing the actual copy of a [`Memcpy`] operation.
///
/// # Safety
///
/// Callers must uphold the same requirements as for [`ptr::copy_nonoverlapping`]: `src` must be
/// valid for reads and `dst` valid for writes of `len` bytes, and the two regions must not
/// overlap.
pub type MemcpyFn = unsafe fn(dst: *mut u8, src: *const u8, len: usize, flags: MemcpyFlags);

/// The default [`MemcpyFn`], a plain non-overlapping copy. The flags are ignored.
///
/// # Safety
///
/// See [`MemcpyFn`].
pub unsafe fn default_memcpy(dst: *mut u8, src: *const u8, len: usize, _flags: MemcpyFlags) {
    if len == 0 {
        return;
    }

    // Safety: ensured by caller
    unsafe { ptr::copy_nonoverlapping(src, dst, len) };
}

/// An execution backend for memory operations.
///
/// A runner receives a [`Job`] for every operation started through a
/// [`Mover`](crate::Mover) and decides where and when the copy is performed.
///
/// When [`start`](Self::start) returns `Ok` the runner takes responsibility for the job: it must
/// eventually call [`Job::run`] or [`Job::finish`] exactly once, from whichever thread does the
/// work. A job that is dropped instead completes its operation with [`Error::Closed`].
/// A runner that cannot accept the job right now hands it back with [`Job::defer`] and returns
/// [`Error::Busy`], which asks the caller to start the operation again on its next poll.
pub trait Runner: Send + Sync {
    /// Hands `job` to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if the job should be retried later, after passing it to
    /// [`Job::defer`]. Any other error fails the operation.
    fn start(&self, job: Job) -> Result<(), Error>;

    /// Returns `true` if jobs may complete after `start` returned, i.e. on another thread.
    fn is_async(&self) -> bool;
}

/// A started memory operation, handed to a [`Runner`].
#[must_use = "dropping a job fails its operation"]
pub struct Job {
    op: Memcpy,
    completion: NonNull<Completion>,
    waker: Waker,
    finished: bool,
}

/// The completion flag shared between an operation's future and the job executing it.
///
/// The backend flips the flag with `Release` ordering after the operation finished, the future
/// observes it with `Acquire` ordering, which makes every write of the operation visible to the
/// polling thread.
pub struct Completion {
    state: AtomicU8,
    _pin: PhantomPinned,
}

// Safety: the completion flag is only accessed atomically and outlives the job (the owning future
// blocks in its destructor while a job is in flight). The buffers are the responsibility of
// whoever created the operation, see `Mover::memcpy`.
unsafe impl Send for Job {}

// === impl Job ===

impl Job {
    /// # Safety
    ///
    /// `completion` must stay valid until the job has been finished or dropped.
    pub(crate) unsafe fn new(op: Memcpy, completion: Pin<&Completion>, waker: Waker) -> Self {
        Self {
            op,
            completion: NonNull::from(completion.get_ref()),
            waker,
            finished: false,
        }
    }

    /// The operation this job executes.
    pub fn op(&self) -> &Memcpy {
        &self.op
    }

    /// Performs the copy using `memcpy`, then marks the operation complete and wakes its waker.
    pub fn run(self, memcpy: MemcpyFn) {
        let Memcpy {
            dst,
            src,
            len,
            flags,
        } = self.op;

        tracing::trace!(?dst, ?src, len, ?flags, "executing memcpy");
        // Safety: `Mover::memcpy` requires the caller to keep both buffers valid and
        // non-overlapping until the operation completed.
        unsafe { memcpy(dst, src, len, flags) };

        self.finish();
    }

    /// Marks the operation complete without copying and wakes its waker.
    ///
    /// For runners whose engine performed the copy by other means.
    pub fn finish(mut self) {
        self.signal(Completion::COMPLETE);
    }

    /// Gives the job back without executing or completing it.
    ///
    /// The operation stays pending and its waker is not woken, so the caller is expected to
    /// retry the start. Runners call this before returning [`Error::Busy`].
    pub fn defer(mut self) {
        tracing::trace!(len = self.op.len, "job deferred");
        self.finished = true;
    }

    fn signal(&mut self, state: u8) {
        self.finished = true;
        // Safety: the completion outlives the job, see `Job::new`. It must not be touched after
        // this store, the future may be dropped as soon as it observes the new state.
        unsafe { self.completion.as_ref().state.store(state, Ordering::Release) };
        self.waker.wake_by_ref();
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("job dropped before it ran, failing operation");
            self.signal(Completion::ABANDONED);
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("op", &self.op)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

// === impl Completion ===

impl Completion {
    const PENDING: u8 = 0;
    const COMPLETE: u8 = 1;
    const ABANDONED: u8 = 2;

    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(Self::PENDING),
            _pin: PhantomPinned,
        }
    }

    /// Returns the outcome of the operation, or `None` while it is still in flight.
    pub fn outcome(&self) -> Option<Result<(), Error>> {
        match self.state.load(Ordering::Acquire) {
            Self::PENDING => None,
            Self::COMPLETE => Some(Ok(())),
            _ => Some(Err(Error::Closed)),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.outcome().is_some()
    }

    /// Resets the flag before a (re-)start. Must not be called while a job is in flight.
    pub(crate) fn reset(&self) {
        self.state.store(Self::PENDING, Ordering::Relaxed);
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("state", &self.state.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
