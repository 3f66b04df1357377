// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::Error;
use crate::runner::{Job, MemcpyFn, Runner, default_memcpy};

/// A runner executing every operation inline, on the thread polling its future.
///
/// Futures of this runner complete on their first poll.
#[derive(Debug, Clone, Copy)]
pub struct SyncRunner {
    memcpy: MemcpyFn,
}

impl SyncRunner {
    pub const fn new() -> Self {
        Self::with_memcpy_fn(default_memcpy)
    }

    /// Creates a runner performing copies with `memcpy` instead of the default routine.
    pub const fn with_memcpy_fn(memcpy: MemcpyFn) -> Self {
        Self { memcpy }
    }
}

impl Default for SyncRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner for SyncRunner {
    fn start(&self, job: Job) -> Result<(), Error> {
        job.run(self.memcpy);
        Ok(())
    }

    fn is_async(&self) -> bool {
        false
    }
}
