// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Sequential composition of futures.
//!
//! A [`Chain`] executes a list of futures strictly in order. The list is a statically-typed,
//! inline sequence of [`Link`]s terminated by [`End`], usually built with the [`entries!`] macro,
//! so the whole chain is one contiguous value whose layout is fixed at compile time. No entry is
//! reached through a pointer and nothing is allocated.
//!
//! Each [`ChainEntry`] can carry a map callback. Once the entry's future completes, the map is
//! invoked exactly once with the entry's context and the context of the *next* entry (or the
//! chain's own output for the last entry) so that results can be fed forward. Only then is the
//! next entry polled for the first time.
//!
//! ```
//! # use core::pin::pin;
//! # use miniasync::{busy_poll, from_fn, FutureContext, FutureState};
//! use miniasync::chain::{Chain, ChainEntry};
//! use miniasync::entries;
//!
//! type Cx = FutureContext<u32, u32>;
//!
//! let double = |cx: core::pin::Pin<&mut Cx>, _: &core::task::Waker| {
//!     let cx = cx.get_mut();
//!     *cx.output_mut() = *cx.data() * 2;
//!     FutureState::Complete
//! };
//!
//! let mut chain = pin!(Chain::new(
//!     entries![
//!         ChainEntry::new(from_fn(1, 0, double)).map(|a: &mut Cx, b: &mut Cx| {
//!             *b.data_mut() = *a.output();
//!         }),
//!         ChainEntry::new(from_fn(0, 0, double)).map(|b: &mut Cx, out: &mut u32| {
//!             *out = *b.output();
//!         }),
//!     ],
//!     0_u32,
//! ));
//!
//! busy_poll(chain.as_mut());
//! assert_eq!(*chain.output(), 4);
//! ```

use crate::future::{Future, FutureContext, FutureProperty, FutureState, Runnable};
use core::fmt;
use core::pin::Pin;
use core::task::Waker;
use pin_project::pin_project;

/// Builds the entry list of a [`Chain`] from a comma separated list of [`ChainEntry`]s.
///
/// `entries![a, b, c]` expands to `Link::new(a, Link::new(b, Link::new(c, End)))` and
/// `entries![]` to `End`.
#[macro_export]
macro_rules! entries {
    () => { $crate::chain::End };
    ($head:expr $(, $tail:expr)* $(,)?) => {
        $crate::chain::Link::new($head, $crate::entries!($($tail),*))
    };
}

/// A future executing a list of futures in order.
///
/// The chain's data is its entry list and its output is written by the map of the last entry.
/// The chain completes once every entry has completed and its map has run.
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct Chain<E, O> {
    #[pin]
    context: FutureContext<E, O>,
}

/// The end of a chain's entry list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct End;

/// A non-empty entry list: an entry followed by the rest of the list.
#[pin_project]
#[derive(Debug)]
pub struct Link<H, T> {
    #[pin]
    head: H,
    #[pin]
    tail: T,
}

/// A single entry of a [`Chain`]: a future (or a [`Lazy`] constructor for one) and an optional
/// map callback.
#[pin_project]
pub struct ChainEntry<S, M = NoMap> {
    #[pin]
    slot: S,
    map: Option<M>,
    processed: bool,
}

/// A chain entry whose future is constructed only when the chain reaches it.
///
/// The initializer receives the context of the preceding entry (or `&()` for the first entry of a
/// chain) and runs once that entry completed, right before its map is invoked. The first entry
/// is constructed on the chain's first poll.
#[pin_project(project = LazyProj)]
pub enum Lazy<F, I> {
    Pending(Option<I>),
    Ready(#[pin] F),
}

/// Marker for an entry without a map callback; the completed entry's output is left untouched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoMap;

/// Something that can be stored in a [`ChainEntry`].
pub trait EntrySlot {
    type Future: Future;

    /// Returns the future, or `None` if it has not been constructed yet.
    fn future(&self) -> Option<&Self::Future>;

    /// Returns the future.
    ///
    /// # Panics
    ///
    /// Panics if the future has not been constructed yet, see [`EntryInit::init`].
    fn future_mut(self: Pin<&mut Self>) -> Pin<&mut Self::Future>;
}

/// An [`EntrySlot`] that can follow an entry with context `P`.
pub trait EntryInit<P>: EntrySlot {
    /// Constructs the future from the preceding entry's context if that has not happened yet.
    fn init(self: Pin<&mut Self>, prev: &P);
}

/// A map callback, feeding the context of a completed entry (`L`) forward into `R`.
///
/// `R` is the context of the next entry or, for the last entry, the output of the chain.
/// Closures taking `(&mut L, &mut R)` implement this when both sides are [`Unpin`].
pub trait MapFn<L, R> {
    fn map(self, lhs: Pin<&mut L>, rhs: Pin<&mut R>);
}

/// The entry list of a [`Chain`] producing an output of type `O`, following an entry with
/// context `P`.
///
/// Implemented for [`End`] and for [`Link`]s of [`ChainEntry`]s whose map callbacks fit the
/// neighbouring entries.
pub trait Entries<O, P = ()> {
    /// What the map of the entry *preceding* this list writes into.
    type Target;

    /// The number of entries in this list.
    const LEN: usize;

    #[doc(hidden)]
    fn target<'a>(self: Pin<&'a mut Self>, output: Pin<&'a mut O>) -> Pin<&'a mut Self::Target>;

    /// Constructs the first entry of this list from the preceding entry's context.
    #[doc(hidden)]
    fn prepare(self: Pin<&mut Self>, prev: &P);

    #[doc(hidden)]
    fn poll_entries(self: Pin<&mut Self>, output: Pin<&mut O>, waker: &Waker) -> FutureState;

    /// Returns `true` if the first entry that has not been processed yet has `property`.
    ///
    /// A lazy entry that has not been constructed yet reports no properties. That is only the case
    /// for the first entry before the chain was polled, every later entry is constructed as soon
    /// as its predecessor completes.
    fn has_property(&self, property: FutureProperty) -> bool;

    /// The number of entries that have completed and had their map invoked.
    fn processed(&self) -> usize;
}

type ContextOf<F> = FutureContext<<F as Future>::Data, <F as Future>::Output>;

// === impl Chain ===

impl<E, O> Chain<E, O> {
    /// Creates a new chain over `entries`, with `output` as the initial chain output.
    pub const fn new(entries: E, output: O) -> Self {
        Self {
            context: FutureContext::new(entries, output),
        }
    }

    pub fn entries(&self) -> &E {
        self.context.data()
    }

    pub fn output(&self) -> &O {
        self.context.output()
    }

    /// Consumes the chain, returning its output.
    pub fn into_output(self) -> O {
        self.context.into_output()
    }
}

impl<E: Entries<O>, O> Chain<E, O> {
    /// The number of entries in this chain.
    #[must_use]
    pub fn len(&self) -> usize {
        E::LEN
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        E::LEN == 0
    }

    /// The number of entries that have completed and been advanced past.
    pub fn processed(&self) -> usize {
        self.context.data().processed()
    }
}

impl<E: Entries<O>, O> Future for Chain<E, O> {
    type Data = E;
    type Output = O;

    fn context(&self) -> &FutureContext<E, O> {
        &self.context
    }

    fn context_mut(self: Pin<&mut Self>) -> Pin<&mut FutureContext<E, O>> {
        self.project().context
    }

    fn poll_task(self: Pin<&mut Self>, waker: &Waker) -> FutureState {
        let (mut entries, output) = self.project().context.split_pinned();
        entries.as_mut().prepare(&());
        entries.poll_entries(output, waker)
    }

    fn has_property(&self, property: FutureProperty) -> bool {
        self.context.data().has_property(property)
    }
}

impl<E: fmt::Debug, O: fmt::Debug> fmt::Debug for Chain<E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("context", &self.context)
            .finish()
    }
}

// === impl End ===

impl<O, P> Entries<O, P> for End {
    type Target = O;
    const LEN: usize = 0;

    fn target<'a>(self: Pin<&'a mut Self>, output: Pin<&'a mut O>) -> Pin<&'a mut O> {
        output
    }

    fn prepare(self: Pin<&mut Self>, _prev: &P) {}

    fn poll_entries(self: Pin<&mut Self>, _output: Pin<&mut O>, _waker: &Waker) -> FutureState {
        FutureState::Complete
    }

    fn has_property(&self, _property: FutureProperty) -> bool {
        false
    }

    fn processed(&self) -> usize {
        0
    }
}

// === impl Link ===

impl<H, T> Link<H, T> {
    pub const fn new(head: H, tail: T) -> Self {
        Self { head, tail }
    }

    pub fn head(&self) -> &H {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut H {
        &mut self.head
    }

    pub fn tail(&self) -> &T {
        &self.tail
    }

    pub fn tail_mut(&mut self) -> &mut T {
        &mut self.tail
    }
}

impl<O, P, S, M, T> Entries<O, P> for Link<ChainEntry<S, M>, T>
where
    S: EntryInit<P>,
    M: MapFn<ContextOf<S::Future>, T::Target>,
    T: Entries<O, ContextOf<S::Future>>,
{
    type Target = ContextOf<S::Future>;
    const LEN: usize = 1 + T::LEN;

    fn target<'a>(
        self: Pin<&'a mut Self>,
        _output: Pin<&'a mut O>,
    ) -> Pin<&'a mut Self::Target> {
        self.project()
            .head
            .project()
            .slot
            .future_mut()
            .context_mut()
    }

    fn prepare(self: Pin<&mut Self>, prev: &P) {
        self.project().head.project().slot.init(prev);
    }

    fn poll_entries(self: Pin<&mut Self>, mut output: Pin<&mut O>, waker: &Waker) -> FutureState {
        let this = self.project();
        let head = this.head.project();
        let mut tail = this.tail;

        if !*head.processed {
            let mut future = head.slot.future_mut();
            if future.as_mut().poll(waker) != FutureState::Complete {
                return FutureState::Running;
            }

            tail.as_mut().prepare(future.context());
            if let Some(map) = head.map.take() {
                tracing::trace!(remaining = T::LEN, "chain entry complete, mapping");
                map.map(future.context_mut(), tail.as_mut().target(output.as_mut()));
            }
            *head.processed = true;
        }

        tail.poll_entries(output, waker)
    }

    fn has_property(&self, property: FutureProperty) -> bool {
        if self.head.processed {
            self.tail.has_property(property)
        } else {
            self.head
                .slot
                .future()
                .is_some_and(|future| future.has_property(property))
        }
    }

    fn processed(&self) -> usize {
        if self.head.processed {
            1 + self.tail.processed()
        } else {
            0
        }
    }
}

// === impl ChainEntry ===

impl<S> ChainEntry<S, NoMap> {
    /// Creates a new entry without a map callback.
    pub const fn new(slot: S) -> Self {
        Self {
            slot,
            map: None,
            processed: false,
        }
    }
}

impl<F, I> ChainEntry<Lazy<F, I>, NoMap> {
    /// Creates a new entry whose future is constructed by `init` once the chain reaches it.
    ///
    /// `init` is passed the context of the preceding entry, after that entry completed but before
    /// its map runs. The first entry of a chain is passed `&()`. The argument type has to be
    /// spelled out on the closure.
    pub const fn lazy<P>(init: I) -> Self
    where
        I: FnOnce(&P) -> F,
    {
        Self::new(Lazy::new(init))
    }
}

impl<S, M> ChainEntry<S, M> {
    /// Sets the map callback of this entry, replacing any previous one.
    pub fn map<M2>(self, map: M2) -> ChainEntry<S, M2> {
        ChainEntry {
            slot: self.slot,
            map: Some(map),
            processed: self.processed,
        }
    }

    /// Returns `true` once the entry has completed and its map has been invoked.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }
}

impl<S: EntrySlot, M> ChainEntry<S, M> {
    /// Returns the entry's future, or `None` if it is lazy and has not been constructed yet.
    pub fn future(&self) -> Option<&S::Future> {
        self.slot.future()
    }

    /// Returns `true` if the entry's future has been constructed.
    pub fn is_initialized(&self) -> bool {
        self.slot.future().is_some()
    }
}

impl<S: fmt::Debug, M> fmt::Debug for ChainEntry<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainEntry")
            .field("slot", &self.slot)
            .field("has_map", &self.map.is_some())
            .field("processed", &self.processed)
            .finish()
    }
}

// === impl EntrySlot ===

impl<F: Future> EntrySlot for F {
    type Future = F;

    fn future(&self) -> Option<&F> {
        Some(self)
    }

    fn future_mut(self: Pin<&mut Self>) -> Pin<&mut F> {
        self
    }
}

impl<F: Future, P> EntryInit<P> for F {
    fn init(self: Pin<&mut Self>, _prev: &P) {}
}

// === impl Lazy ===

impl<F, I> Lazy<F, I> {
    pub const fn new(init: I) -> Self {
        Lazy::Pending(Some(init))
    }
}

impl<F: Future, I> EntrySlot for Lazy<F, I> {
    type Future = F;

    fn future(&self) -> Option<&F> {
        match self {
            Lazy::Ready(future) => Some(future),
            Lazy::Pending(_) => None,
        }
    }

    fn future_mut(self: Pin<&mut Self>) -> Pin<&mut F> {
        match self.project() {
            LazyProj::Ready(future) => future,
            LazyProj::Pending(_) => unreachable!("lazy chain entry used before it was initialized"),
        }
    }
}

impl<F, I, P> EntryInit<P> for Lazy<F, I>
where
    F: Future,
    I: FnOnce(&P) -> F,
{
    fn init(mut self: Pin<&mut Self>, prev: &P) {
        if let LazyProj::Pending(init) = self.as_mut().project() {
            let Some(init) = init.take() else {
                unreachable!("lazy chain entry lost its initializer");
            };
            tracing::trace!("initializing lazy chain entry");
            self.set(Lazy::Ready(init(prev)));
        }
    }
}

impl<F: fmt::Debug, I> fmt::Debug for Lazy<F, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lazy::Pending(_) => f.write_str("Lazy::Pending"),
            Lazy::Ready(future) => f.debug_tuple("Lazy::Ready").field(future).finish(),
        }
    }
}

// === impl MapFn ===

impl<L, R, F> MapFn<L, R> for F
where
    L: Unpin,
    R: Unpin,
    F: FnOnce(&mut L, &mut R),
{
    fn map(self, lhs: Pin<&mut L>, rhs: Pin<&mut R>) {
        self(Pin::into_inner(lhs), Pin::into_inner(rhs));
    }
}

impl<L, R> MapFn<L, R> for NoMap {
    fn map(self, _lhs: Pin<&mut L>, _rhs: Pin<&mut R>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{CountUpContext, count_up, trace_init};
    use crate::{busy_poll, from_fn, ready};
    use core::cell::RefCell;
    use core::pin::pin;
    use proptest::prelude::*;

    type CountDownContext = FutureContext<u32, u32>;

    fn count_down(
        counter: u32,
    ) -> crate::FnFuture<
        u32,
        u32,
        impl FnMut(Pin<&mut CountDownContext>, &Waker) -> FutureState,
    > {
        from_fn(counter, 0, |mut cx: Pin<&mut CountDownContext>, _| {
            let counter = cx.data_mut();
            *counter = counter.saturating_sub(1);
            if *counter == 0 {
                *cx.output_mut() += 1;
                FutureState::Complete
            } else {
                FutureState::Running
            }
        })
    }

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    struct UpDown {
        result_sum: u32,
    }

    #[test]
    fn up_down_chain() {
        const MAX: u32 = 10;
        let _trace = trace_init();

        let mut chain = pin!(Chain::new(
            entries![
                ChainEntry::new(count_up(MAX)).map(
                    |up: &mut CountUpContext, down: &mut CountDownContext| {
                        *down.data_mut() = up.data().counter;
                        *down.output_mut() += *up.output();
                    }
                ),
                ChainEntry::new(count_down(0)).map(
                    |down: &mut CountDownContext, out: &mut UpDown| {
                        assert_eq!(*down.data(), 0);
                        out.result_sum = *down.output();
                    }
                ),
            ],
            UpDown::default(),
        ));
        assert_eq!(chain.state(), FutureState::Idle);
        assert_eq!(chain.len(), 2);

        for _ in 0..MAX * 2 {
            chain.as_mut().poll(Waker::noop());
        }

        assert_eq!(chain.state(), FutureState::Complete);
        assert_eq!(chain.processed(), 2);
        assert_eq!(chain.output().result_sum, 2);
    }

    #[test]
    fn entries_advance_within_a_single_poll() {
        let mut chain = pin!(Chain::new(
            entries![
                ChainEntry::new(ready((), 1_u32)),
                ChainEntry::new(ready((), 2_u32)),
                ChainEntry::new(count_up(2)),
            ],
            (),
        ));

        assert_eq!(chain.as_mut().poll(Waker::noop()), FutureState::Running);
        assert_eq!(chain.processed(), 2);
        assert_eq!(chain.as_mut().poll(Waker::noop()), FutureState::Complete);
        assert_eq!(chain.processed(), 3);
    }

    #[test]
    fn empty_chain_completes_immediately() {
        let mut chain = pin!(Chain::new(entries![], 7_u32));
        assert!(chain.is_empty());
        assert_eq!(chain.state(), FutureState::Idle);

        assert_eq!(chain.as_mut().poll(Waker::noop()), FutureState::Complete);
        assert_eq!(*chain.output(), 7);
    }

    #[test]
    fn missing_map_leaves_output_untouched() {
        let mut chain = pin!(Chain::new(
            entries![
                ChainEntry::new(count_up(3)),
                ChainEntry::new(count_up(2)),
            ],
            42_u32,
        ));
        busy_poll(chain.as_mut());

        assert_eq!(chain.processed(), 2);
        assert_eq!(*chain.output(), 42);
        let first = chain.entries().head().future().unwrap();
        assert_eq!(*first.context().output(), 1);
        assert!(!chain.entries().head().has_map());
    }

    /// Copies the output of a nested up/down chain into the outer chain's output.
    fn up_down_to_output<E>(up_down: &mut FutureContext<E, UpDown>, out: &mut UpDown) {
        *out = *up_down.output();
    }

    #[test]
    fn lazy_entries() {
        let _trace = trace_init();

        let mut chain = pin!(Chain::new(
            entries![
                ChainEntry::lazy(|_: &()| ready((5_u32, 5_u32), 25_u32)),
                ChainEntry::lazy(|mul: &FutureContext<(u32, u32), u32>| {
                    Chain::new(
                        entries![
                            ChainEntry::new(count_up(*mul.output())).map(
                                |up: &mut CountUpContext, down: &mut CountDownContext| {
                                    *down.data_mut() = up.data().counter;
                                    *down.output_mut() += *up.output();
                                }
                            ),
                            ChainEntry::new(count_down(0)).map(
                                |down: &mut CountDownContext, out: &mut UpDown| {
                                    out.result_sum = *down.output();
                                }
                            ),
                        ],
                        UpDown::default(),
                    )
                })
                .map(up_down_to_output),
            ],
            UpDown::default(),
        ));

        assert!(!chain.entries().head().is_initialized());
        assert!(!chain.entries().tail().head().is_initialized());

        busy_poll(chain.as_mut());

        assert!(chain.entries().head().is_initialized());
        assert!(chain.entries().tail().head().is_initialized());
        assert_eq!(chain.output().result_sum, 2);

        let up_down = chain.entries().tail().head().future().unwrap();
        let up = up_down.entries().head().future().unwrap();
        assert_eq!(up.context().data().counter, 25);
    }

    #[test]
    fn lazy_entry_is_only_built_when_reached() {
        let built = RefCell::new(Vec::new());

        let mut chain = pin!(Chain::new(
            entries![
                ChainEntry::new(count_up(3)),
                ChainEntry::lazy(|prev: &CountUpContext| {
                    built.borrow_mut().push(prev.data().counter);
                    count_up(1)
                }),
            ],
            (),
        ));

        chain.as_mut().poll(Waker::noop());
        chain.as_mut().poll(Waker::noop());
        assert!(built.borrow().is_empty());

        assert_eq!(chain.as_mut().poll(Waker::noop()), FutureState::Complete);
        chain.as_mut().poll(Waker::noop());
        // built exactly once, from the completed predecessor
        assert_eq!(*built.borrow(), [3_u32]);
    }

    /// Multiplies the output of a nested chain by ten.
    fn times_ten<E>(inner: &mut FutureContext<E, u32>, out: &mut u32) {
        *out = *inner.output() * 10;
    }

    #[test]
    fn nested_chain() {
        let inner = Chain::new(
            entries![
                ChainEntry::new(count_up(3)).map(
                    |up: &mut CountUpContext, next: &mut CountUpContext| {
                        *next.output_mut() += up.data().counter;
                    }
                ),
                ChainEntry::new(count_up(2)).map(|up: &mut CountUpContext, out: &mut u32| {
                    *out = *up.output();
                }),
            ],
            0_u32,
        );

        let mut outer = pin!(Chain::new(
            entries![ChainEntry::new(inner).map(times_ten)],
            0_u32,
        ));

        busy_poll(outer.as_mut());

        // 3 fed forward by the first map plus 1 on completion of the second entry
        assert_eq!(*outer.output(), 40);
        let inner = outer.entries().head().future().unwrap();
        assert_eq!(inner.processed(), 2);
    }

    struct AsyncStub {
        context: FutureContext<u32, ()>,
    }

    impl Future for AsyncStub {
        type Data = u32;
        type Output = ();

        fn context(&self) -> &FutureContext<u32, ()> {
            &self.context
        }

        fn context_mut(self: Pin<&mut Self>) -> Pin<&mut FutureContext<u32, ()>> {
            Pin::new(&mut self.get_mut().context)
        }

        fn poll_task(self: Pin<&mut Self>, _waker: &Waker) -> FutureState {
            let polls = self.get_mut().context.data_mut();
            *polls += 1;
            if *polls == 2 {
                FutureState::Complete
            } else {
                FutureState::Running
            }
        }

        fn has_property(&self, property: FutureProperty) -> bool {
            property == FutureProperty::Async
        }
    }

    #[test]
    fn property_follows_current_entry() {
        let mut chain = pin!(Chain::new(
            entries![
                ChainEntry::new(count_up(2)),
                ChainEntry::new(AsyncStub {
                    context: FutureContext::new(0, ()),
                }),
            ],
            (),
        ));

        assert!(!chain.has_property(FutureProperty::Async));
        chain.as_mut().poll(Waker::noop());
        assert!(!chain.has_property(FutureProperty::Async));
        chain.as_mut().poll(Waker::noop());
        assert!(chain.has_property(FutureProperty::Async));
        assert_eq!(chain.as_mut().poll(Waker::noop()), FutureState::Complete);
        assert!(!chain.has_property(FutureProperty::Async));
    }

    #[test]
    fn property_of_lazy_entries() {
        let mut chain = pin!(Chain::new(
            entries![
                ChainEntry::lazy(|_: &()| AsyncStub {
                    context: FutureContext::new(0, ()),
                }),
                ChainEntry::lazy(|_: &FutureContext<u32, ()>| count_up(1)),
            ],
            (),
        ));

        // the first entry is only constructed by the first poll
        assert!(!chain.has_property(FutureProperty::Async));
        assert_eq!(chain.as_mut().poll(Waker::noop()), FutureState::Running);
        assert!(chain.entries().head().is_initialized());
        assert!(chain.has_property(FutureProperty::Async));

        assert_eq!(chain.as_mut().poll(Waker::noop()), FutureState::Complete);
        assert!(chain.entries().tail().head().is_initialized());
        assert!(!chain.has_property(FutureProperty::Async));
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Poll(usize),
        Map(usize),
    }

    type StepContext = FutureContext<u32, ()>;

    fn step<'a>(
        index: usize,
        polls: u32,
        log: &'a RefCell<Vec<Event>>,
    ) -> crate::FnFuture<u32, (), impl FnMut(Pin<&mut StepContext>, &Waker) -> FutureState>
    {
        from_fn(0, (), move |mut cx: Pin<&mut StepContext>, _| {
            log.borrow_mut().push(Event::Poll(index));
            *cx.data_mut() += 1;
            if *cx.data() >= polls {
                FutureState::Complete
            } else {
                FutureState::Running
            }
        })
    }

    proptest! {
        #[test]
        fn maps_run_once_between_entries(a in 1_u32..16, b in 1_u32..16, c in 1_u32..16) {
            let log = RefCell::new(Vec::new());

            let mut chain = pin!(Chain::new(
                entries![
                    ChainEntry::new(step(0, a, &log)).map(|_: &mut StepContext, _: &mut StepContext| {
                        log.borrow_mut().push(Event::Map(0));
                    }),
                    ChainEntry::new(step(1, b, &log)).map(|_: &mut StepContext, _: &mut StepContext| {
                        log.borrow_mut().push(Event::Map(1));
                    }),
                    ChainEntry::new(step(2, c, &log)).map(|_: &mut StepContext, _: &mut ()| {
                        log.borrow_mut().push(Event::Map(2));
                    }),
                ],
                (),
            ));

            let mut processed = 0;
            while chain.as_mut().poll(Waker::noop()) != FutureState::Complete {
                // a running chain never claims all entries are done
                prop_assert!(chain.processed() < 3);
                prop_assert!(chain.processed() >= processed);
                processed = chain.processed();
            }
            prop_assert_eq!(chain.processed(), 3);

            let mut expected = Vec::new();
            for (index, polls) in [a, b, c].into_iter().enumerate() {
                expected.extend((0..polls).map(|_| Event::Poll(index)));
                expected.push(Event::Map(index));
            }
            prop_assert_eq!(log.borrow().clone(), expected);
        }
    }
}
