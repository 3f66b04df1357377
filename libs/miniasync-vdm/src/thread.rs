// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::Error;
use crate::runner::{Job, MemcpyFn, Runner, default_memcpy};
use std::thread;

/// A runner spawning a new OS thread for every operation.
///
/// The future of an operation observes `Running` until the worker is done, and the worker wakes
/// the future's waker once the copy completed. Failure to spawn a worker completes the future with
/// [`Error::Spawn`].
#[derive(Debug, Clone, Copy)]
pub struct ThreadRunner {
    memcpy: MemcpyFn,
}

impl ThreadRunner {
    pub const fn new() -> Self {
        Self::with_memcpy_fn(default_memcpy)
    }

    /// Creates a runner performing copies with `memcpy` instead of the default routine.
    pub const fn with_memcpy_fn(memcpy: MemcpyFn) -> Self {
        Self { memcpy }
    }
}

impl Default for ThreadRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner for ThreadRunner {
    #[tracing::instrument(level = "trace", skip_all, fields(len = job.op().len))]
    fn start(&self, job: Job) -> Result<(), Error> {
        let memcpy = self.memcpy;

        thread::Builder::new()
            .name("vdm-worker".into())
            .spawn(move || job.run(memcpy))?;

        tracing::trace!("spawned memcpy worker");
        Ok(())
    }

    fn is_async(&self) -> bool {
        true
    }
}
