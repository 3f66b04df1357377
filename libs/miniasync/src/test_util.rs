// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::{FnFuture, FutureContext, FutureState, from_fn};
use core::pin::Pin;
use core::task::Waker;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a thread-local `tracing` subscriber honoring `RUST_LOG` for the duration of a test.
pub(crate) fn trace_init() -> DefaultGuard {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_thread_names(true)
        .with_test_writer()
        .set_default()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CountUp {
    pub counter: u32,
    pub max: u32,
}

pub(crate) type CountUpContext = FutureContext<CountUp, u32>;

/// A future that needs `max` polls to complete and then adds one to its output.
pub(crate) fn count_up(
    max: u32,
) -> FnFuture<
    CountUp,
    u32,
    impl FnMut(Pin<&mut CountUpContext>, &Waker) -> FutureState,
> {
    from_fn(CountUp { counter: 0, max }, 0, |mut cx: Pin<&mut CountUpContext>, _| {
        let data = cx.data_mut();
        data.counter += 1;
        if data.counter >= data.max {
            *cx.output_mut() += 1;
            FutureState::Complete
        } else {
            FutureState::Running
        }
    })
}
