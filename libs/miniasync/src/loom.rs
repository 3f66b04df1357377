// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(loom)] {
        pub(crate) use loom::sync;
        #[cfg(test)]
        pub(crate) use loom::thread;
        #[cfg(test)]
        pub(crate) use loom::model;

        #[inline(always)]
        pub(crate) fn thread_yield() {
            loom::thread::yield_now();
        }
    } else {
        #[cfg(test)]
        pub(crate) use std::thread;

        #[cfg(test)]
        #[inline(always)]
        pub(crate) fn model<R>(f: impl FnOnce() -> R) -> R {
            f()
        }

        #[inline(always)]
        pub(crate) fn thread_yield() {
            std::thread::yield_now();
        }

        pub(crate) mod sync {
            pub(crate) use std::sync::*;
        }
    }
}
