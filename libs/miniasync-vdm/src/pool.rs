// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::error::Error;
use crate::runner::{Job, MemcpyFn, Runner, default_memcpy};
use core::fmt;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Configuration of a [`ThreadPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// The number of worker threads.
    pub threads: usize,
    /// The number of operations that may be queued before the pool reports [`Error::Busy`].
    pub queue_depth: usize,
}

/// A runner executing operations on a fixed set of worker threads fed by a bounded queue.
///
/// When the queue is full, the job is deferred and starting the operation fails with
/// [`Error::Busy`]. Its future stays `Running` without waking its waker and retries on the next
/// poll. Dropping the pool lets the workers drain the queue and then
/// joins them.
pub struct ThreadPool {
    sender: Option<SyncSender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

// === impl PoolConfig ===

impl PoolConfig {
    pub const DEFAULT_THREADS: usize = 12;
    pub const DEFAULT_QUEUE_DEPTH: usize = 128;

    pub const fn new() -> Self {
        Self {
            threads: Self::DEFAULT_THREADS,
            queue_depth: Self::DEFAULT_QUEUE_DEPTH,
        }
    }

    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub const fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be non-zero"));
        }
        if self.queue_depth == 0 {
            return Err(Error::InvalidConfig("queue_depth must be non-zero"));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

// === impl ThreadPool ===

impl ThreadPool {
    /// Starts a pool using the default copy routine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` has zero threads or a zero queue depth, and
    /// [`Error::Spawn`] if a worker thread could not be created.
    pub fn new(config: PoolConfig) -> Result<Self, Error> {
        Self::with_memcpy_fn(config, default_memcpy)
    }

    /// Starts a pool whose workers perform copies with `memcpy`.
    ///
    /// # Errors
    ///
    /// See [`ThreadPool::new`].
    #[tracing::instrument(level = "debug", skip(memcpy))]
    pub fn with_memcpy_fn(config: PoolConfig, memcpy: MemcpyFn) -> Result<Self, Error> {
        config.validate()?;

        let (sender, receiver) = mpsc::sync_channel(config.queue_depth);
        let receiver = Arc::new(Mutex::new(receiver));

        let mut pool = Self {
            sender: Some(sender),
            workers: Vec::with_capacity(config.threads),
        };

        for id in 0..config.threads {
            let receiver = receiver.clone();
            // on error `pool` is dropped, which shuts down the workers spawned so far
            let handle = thread::Builder::new()
                .name(format!("vdm-pool-{id}"))
                .spawn(move || worker(id, &receiver, memcpy))?;
            pool.workers.push(handle);
        }

        tracing::debug!("thread pool started");
        Ok(pool)
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }
}

fn worker(id: usize, receiver: &Mutex<Receiver<Job>>, memcpy: MemcpyFn) {
    loop {
        let job = {
            let receiver = receiver.lock().unwrap_or_else(PoisonError::into_inner);
            receiver.recv()
        };

        match job {
            Ok(job) => job.run(memcpy),
            Err(_) => break,
        }
    }

    tracing::trace!(id, "pool worker exiting");
}

impl Runner for ThreadPool {
    fn start(&self, job: Job) -> Result<(), Error> {
        let sender = self.sender.as_ref().ok_or(Error::Closed)?;

        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                job.defer();
                Err(Error::Busy)
            }
            Err(TrySendError::Disconnected(_)) => Err(Error::Closed),
        }
    }

    fn is_async(&self) -> bool {
        true
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        tracing::debug!("shutting down thread pool");
        drop(self.sender.take());

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("pool worker panicked");
            }
        }
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("threads", &self.workers.len())
            .field("closed", &self.sender.is_none())
            .finish()
    }
}
