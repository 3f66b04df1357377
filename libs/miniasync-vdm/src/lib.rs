// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Memory mover backends for [`miniasync`] futures.
//!
//! A [`Mover`] starts memory operations as [`MemcpyFuture`]s on a [`Runner`], the backend
//! deciding where the copy actually happens:
//!
//! - [`SyncRunner`] copies inline, the future completes on its first poll.
//! - [`ThreadRunner`] spawns one OS thread per operation.
//! - [`ThreadPool`] hands operations to a fixed set of workers through a bounded queue.
//!
//! Backends signal completion through an atomic flag inside the future and then wake the waker
//! passed to the poll that started the operation. Later polls with a different waker are not
//! observed, so a future should keep being polled by the same driver, such as
//! [`miniasync::runtime::Runtime`], or busy-polled by hand.
//!
//! ```
//! # use core::pin::pin;
//! use miniasync::busy_poll;
//! use miniasync_vdm::{MemcpyFlags, Mover, ThreadRunner};
//!
//! let runner = ThreadRunner::new();
//! let mover = Mover::new(&runner);
//!
//! let src = *b"hello world";
//! let mut dst = [0_u8; 11];
//!
//! // Safety: both buffers outlive the future
//! let mut fut = pin!(unsafe {
//!     mover.memcpy(dst.as_mut_ptr(), src.as_ptr(), src.len(), MemcpyFlags::empty())
//! });
//! busy_poll(fut.as_mut());
//!
//! assert_eq!(&dst, b"hello world");
//! ```

mod error;
mod loom;
mod memcpy;
mod mover;
mod persist;
mod pool;
mod runner;
mod sync;
mod thread;

pub use error::Error;
pub use memcpy::{Memcpy, MemcpyContext, MemcpyData, MemcpyFlags, MemcpyFuture, MemcpyOutput};
pub use mover::Mover;
pub use persist::{Persist, persist_memcpy};
pub use pool::{PoolConfig, ThreadPool};
pub use runner::{Completion, Job, MemcpyFn, Runner, default_memcpy};
pub use sync::SyncRunner;
pub use thread::ThreadRunner;

use static_assertions::{assert_impl_all, assert_not_impl_any};

assert_impl_all!(Job: Send);
assert_impl_all!(SyncRunner: Runner, Send, Sync);
assert_impl_all!(ThreadRunner: Runner, Send, Sync);
assert_impl_all!(ThreadPool: Runner, Send, Sync);
assert_impl_all!(Mover<'static>: Copy);
assert_not_impl_any!(MemcpyFuture<'static>: Unpin);
