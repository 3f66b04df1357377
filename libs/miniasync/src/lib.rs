// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Allocation-free cooperative futures for asynchronous memory operations.
//!
//! A [`Future`] here is a small, self-contained state machine: a [`FutureContext`] holding the
//! current [`FutureState`] followed inline by the operation's data and output. Futures are driven
//! by polling them with a [`Waker`](core::task::Waker) until they report
//! [`FutureState::Complete`], either by hand ([`busy_poll`]) or through the spin-then-sleep
//! [`Runtime`](runtime::Runtime).
//!
//! Futures can be composed with the [`Chain`](chain::Chain) combinator, which executes a
//! statically-typed list of futures strictly in order and lets a map callback feed the state of
//! one entry into the next.
//!
//! Nothing in this crate allocates; where futures and their buffers live is entirely up to the
//! caller.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod backoff;
pub mod chain;
mod future;
#[cfg(feature = "std")]
mod loom;
#[cfg(feature = "std")]
pub mod runtime;
#[cfg(test)]
mod test_util;

pub use backoff::Backoff;
pub use future::{
    FnFuture, Future, FutureContext, FutureProperty, FutureState, Ready, Runnable, busy_poll,
    from_fn, ready,
};
