// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::fmt;
use std::io;

/// Errors reported by memory mover backends.
///
/// Returned from [`Runner::start`](crate::Runner::start) and stored in the
/// [`MemcpyOutput`](crate::MemcpyOutput) of an operation that could not be carried out.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The runner cannot accept more work right now. The operation is retried on the next poll.
    Busy,
    /// The runner has shut down, or dropped the operation without executing it.
    Closed,
    /// A worker thread could not be created.
    Spawn(io::Error),
    /// A runner was configured with an unusable value.
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Busy => f.write_str("runner is busy"),
            Error::Closed => f.write_str("runner was closed"),
            Error::Spawn(err) => write!(f, "failed to spawn worker thread: {err}"),
            Error::InvalidConfig(msg) => write!(f, "invalid runner configuration: {msg}"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Spawn(err)
    }
}
