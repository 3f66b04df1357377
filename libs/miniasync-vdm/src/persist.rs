// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::memcpy::MemcpyFuture;
use miniasync::{Future, Runnable};

/// Makes a range of persistent memory durable.
///
/// The engine never persists on its own, callers do so explicitly once an operation completed,
/// usually through [`persist_memcpy`].
pub trait Persist {
    fn persist(&self, addr: *const u8, len: usize);
}

impl<F> Persist for F
where
    F: Fn(*const u8, usize),
{
    fn persist(&self, addr: *const u8, len: usize) {
        self(addr, len);
    }
}

/// Persists the destination range of a completed, successful memcpy.
///
/// Returns `false` without calling `persist` if the future has not completed, its operation
/// failed or it copied nothing.
pub fn persist_memcpy<P>(persist: &P, future: &MemcpyFuture<'_>) -> bool
where
    P: Persist + ?Sized,
{
    if !future.state().is_complete() {
        return false;
    }

    let cx = future.context();
    let output = cx.output();
    if output.result.is_err() || cx.data().len == 0 {
        return false;
    }

    tracing::trace!(dest = ?output.dest, len = cx.data().len, "persisting memcpy destination");
    persist.persist(output.dest.cast_const(), cx.data().len);
    true
}
