// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::memcpy::{Memcpy, MemcpyFlags, MemcpyFuture};
use crate::runner::Runner;
use core::fmt;

/// A handle for starting memory operations on a [`Runner`].
///
/// The mover holds no per-operation state, every operation's state lives in its future. Movers
/// are `Copy` and can be handed out freely.
#[derive(Clone, Copy)]
pub struct Mover<'r> {
    runner: &'r dyn Runner,
}

impl<'r> Mover<'r> {
    pub const fn new(runner: &'r dyn Runner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &'r dyn Runner {
        self.runner
    }

    /// Returns a future copying `len` bytes from `src` to `dst`.
    ///
    /// Nothing happens until the future is polled.
    ///
    /// # Safety
    ///
    /// From the first poll of the returned future until it completes (or is dropped), `src` must
    /// be valid for reads and `dst` valid for writes of `len` bytes, and the two regions must not
    /// overlap. The same applies to any pointers written into the future's data before it is
    /// first polled. The copy may happen on another thread.
    pub unsafe fn memcpy(
        &self,
        dst: *mut u8,
        src: *const u8,
        len: usize,
        flags: MemcpyFlags,
    ) -> MemcpyFuture<'r> {
        MemcpyFuture::new(self.runner, Memcpy::new(dst, src, len, flags))
    }
}

impl fmt::Debug for Mover<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mover")
            .field("is_async", &self.runner.is_async())
            .finish_non_exhaustive()
    }
}
