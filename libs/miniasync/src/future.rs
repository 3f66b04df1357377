// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::pin::Pin;
use core::task::Waker;
use core::{fmt, hint, mem};
use pin_project::pin_project;
use static_assertions::assert_impl_all;

/// The state of execution of a [`Future`].
///
/// States only ever move forward: `Idle -> Running -> Complete` or `Idle -> Complete`.
/// Once a future is `Complete` it stays `Complete` and its task is never invoked again.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum FutureState {
    /// The future has not been polled yet.
    Idle,
    /// The future has been polled at least once but has not finished.
    Running,
    /// The future has finished, its output is ready.
    Complete,
}

/// Optional properties a [`Future`] can report about itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FutureProperty {
    /// The future's work progresses on its own (e.g. on another thread) once started, it does not
    /// need to be polled to make progress.
    Async,
}

/// The state header of every [`Future`], followed inline by its data and output.
///
/// The sizes of the data and output are fixed by the type parameters and never change after
/// construction. Both are structurally pinned: a pinned context only hands out pinned references
/// to them, unless they are [`Unpin`].
#[pin_project]
#[repr(C)]
pub struct FutureContext<D, O> {
    state: FutureState,
    #[pin]
    data: D,
    #[pin]
    output: O,
}

/// A single asynchronous operation, driven to completion by repeated polling.
///
/// Implementors provide the *task*: [`poll_task`](Future::poll_task) performs one step of the
/// operation and reports the resulting state. Callers never invoke the task directly, they go
/// through [`Runnable::poll`], which skips completed futures and records the state in the
/// future's [`FutureContext`].
///
/// State that must not move while the operation is in flight (e.g. a completion flag written by
/// another thread) belongs in the implementing type itself, not in the context's data, since map
/// callbacks of a [`Chain`](crate::chain::Chain) get mutable access to the data of `Unpin`
/// contexts.
pub trait Future {
    /// The inputs of the operation.
    type Data;
    /// The results of the operation.
    type Output;

    /// Returns the context of this future.
    fn context(&self) -> &FutureContext<Self::Data, Self::Output>;

    /// Returns the pinned context of this future.
    fn context_mut(self: Pin<&mut Self>) -> Pin<&mut FutureContext<Self::Data, Self::Output>>;

    /// Performs one step of the operation.
    ///
    /// This is only ever called while the future is not yet `Complete`. It must not block, must
    /// not move the state backwards and may be called any number of times while the future is
    /// `Running`. The `waker` should be woken once the operation can make progress again.
    fn poll_task(self: Pin<&mut Self>, waker: &Waker) -> FutureState;

    /// Returns `true` if the future has the given property.
    fn has_property(&self, property: FutureProperty) -> bool {
        let _ = property;
        false
    }
}

/// The object safe view of a [`Future`] used by executors.
///
/// This is implemented for every [`Future`], so heterogeneous futures can be driven together
/// as `Pin<&mut dyn Runnable>`.
pub trait Runnable {
    /// Polls the future once, returning its (possibly unchanged) state.
    ///
    /// Polling a `Complete` future is a no-op.
    fn poll(self: Pin<&mut Self>, waker: &Waker) -> FutureState;

    /// Returns the current state of the future without polling it.
    fn state(&self) -> FutureState;
}

/// A [`Future`] whose task is a closure operating on the context.
///
/// Created by [`from_fn`].
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct FnFuture<D, O, F> {
    #[pin]
    context: FutureContext<D, O>,
    task: F,
}

/// A [`Future`] that is already complete.
///
/// Created by [`ready`].
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct Ready<D, O> {
    #[pin]
    context: FutureContext<D, O>,
}

assert_impl_all!(FutureContext<u64, u64>: Send, Sync, Unpin);

/// Creates a new, idle future running the given task over `data` and `output`.
///
/// The task is invoked on every poll until it returns [`FutureState::Complete`].
pub fn from_fn<D, O, F>(data: D, output: O, task: F) -> FnFuture<D, O, F>
where
    F: FnMut(Pin<&mut FutureContext<D, O>>, &Waker) -> FutureState,
{
    FnFuture {
        context: FutureContext::new(data, output),
        task,
    }
}

/// Creates a future that is complete from the start and whose output is `output`.
pub fn ready<D, O>(data: D, output: O) -> Ready<D, O> {
    Ready {
        context: FutureContext::completed(data, output),
    }
}

/// Polls `future` with a no-op waker until it completes, issuing a spin loop hint between polls.
pub fn busy_poll<F>(mut future: Pin<&mut F>)
where
    F: Runnable + ?Sized,
{
    let waker = Waker::noop();
    while future.as_mut().poll(waker) != FutureState::Complete {
        hint::spin_loop();
    }
}

// === impl FutureState ===

impl FutureState {
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, FutureState::Complete)
    }

    /// Returns `true` if a future in this state may move to `next` when polled.
    #[must_use]
    pub const fn can_transition_to(self, next: FutureState) -> bool {
        matches!(
            (self, next),
            (
                FutureState::Idle | FutureState::Running,
                FutureState::Running | FutureState::Complete
            ) | (FutureState::Complete, FutureState::Complete)
        )
    }

    /// The state a future polled in `self` ends up in when its task reported `next`.
    ///
    /// States never move backwards and a polled future is never `Idle`.
    fn advance(self, next: FutureState) -> FutureState {
        self.max(next).max(FutureState::Running)
    }
}

impl fmt::Display for FutureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FutureState::Idle => f.pad("idle"),
            FutureState::Running => f.pad("running"),
            FutureState::Complete => f.pad("complete"),
        }
    }
}

// === impl FutureContext ===

impl<D, O> FutureContext<D, O> {
    /// Creates a new, idle context.
    pub const fn new(data: D, output: O) -> Self {
        Self {
            state: FutureState::Idle,
            data,
            output,
        }
    }

    /// Creates a context that is already complete.
    pub const fn completed(data: D, output: O) -> Self {
        Self {
            state: FutureState::Complete,
            data,
            output,
        }
    }

    #[inline]
    pub fn state(&self) -> FutureState {
        self.state
    }

    #[inline]
    pub fn data(&self) -> &D {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    #[inline]
    pub fn output(&self) -> &O {
        &self.output
    }

    #[inline]
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Returns a pinned reference to the data.
    #[inline]
    pub fn data_pinned(self: Pin<&mut Self>) -> Pin<&mut D> {
        self.project().data
    }

    /// Returns a pinned reference to the output.
    #[inline]
    pub fn output_pinned(self: Pin<&mut Self>) -> Pin<&mut O> {
        self.project().output
    }

    /// Splits a pinned context into its data and output.
    #[inline]
    pub fn split_pinned(self: Pin<&mut Self>) -> (Pin<&mut D>, Pin<&mut O>) {
        let this = self.project();
        (this.data, this.output)
    }

    /// The size of the data in bytes.
    #[inline]
    pub const fn data_size(&self) -> usize {
        mem::size_of::<D>()
    }

    /// The size of the output in bytes.
    #[inline]
    pub const fn output_size(&self) -> usize {
        mem::size_of::<O>()
    }

    /// The combined size of data and output in bytes.
    #[inline]
    pub const fn size(&self) -> usize {
        self.data_size() + self.output_size()
    }

    /// Consumes the context, returning the data and the output.
    pub fn into_parts(self) -> (D, O) {
        (self.data, self.output)
    }

    /// Consumes the context, returning the output.
    pub fn into_output(self) -> O {
        self.output
    }

    fn set_state(self: Pin<&mut Self>, state: FutureState) {
        *self.project().state = state;
    }
}

impl<D: fmt::Debug, O: fmt::Debug> fmt::Debug for FutureContext<D, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureContext")
            .field("state", &self.state)
            .field("data", &self.data)
            .field("output", &self.output)
            .finish()
    }
}

// === impl Runnable ===

impl<F> Runnable for F
where
    F: Future + ?Sized,
{
    fn poll(mut self: Pin<&mut Self>, waker: &Waker) -> FutureState {
        let prev = self.context().state();
        if prev.is_complete() {
            return prev;
        }

        let reported = self.as_mut().poll_task(waker);
        debug_assert!(
            prev.can_transition_to(reported),
            "invalid future state transition {prev} -> {reported}"
        );

        let next = prev.advance(reported);
        self.context_mut().set_state(next);
        next
    }

    fn state(&self) -> FutureState {
        self.context().state()
    }
}

// === impl FnFuture ===

impl<D, O, F> FnFuture<D, O, F> {
    /// Consumes the future, returning its context.
    pub fn into_context(self) -> FutureContext<D, O> {
        self.context
    }
}

impl<D, O, F> Future for FnFuture<D, O, F>
where
    F: FnMut(Pin<&mut FutureContext<D, O>>, &Waker) -> FutureState,
{
    type Data = D;
    type Output = O;

    fn context(&self) -> &FutureContext<D, O> {
        &self.context
    }

    fn context_mut(self: Pin<&mut Self>) -> Pin<&mut FutureContext<D, O>> {
        self.project().context
    }

    fn poll_task(self: Pin<&mut Self>, waker: &Waker) -> FutureState {
        let this = self.project();
        (this.task)(this.context, waker)
    }
}

impl<D: fmt::Debug, O: fmt::Debug, F> fmt::Debug for FnFuture<D, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFuture")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

// === impl Ready ===

impl<D, O> Ready<D, O> {
    /// Consumes the future, returning its context.
    pub fn into_context(self) -> FutureContext<D, O> {
        self.context
    }
}

impl<D, O> Future for Ready<D, O> {
    type Data = D;
    type Output = O;

    fn context(&self) -> &FutureContext<D, O> {
        &self.context
    }

    fn context_mut(self: Pin<&mut Self>) -> Pin<&mut FutureContext<D, O>> {
        self.project().context
    }

    fn poll_task(self: Pin<&mut Self>, _waker: &Waker) -> FutureState {
        // `Runnable::poll` never invokes the task of a complete future
        unreachable!("ready future was polled in state {}", self.context.state);
    }
}

impl<D: fmt::Debug, O: fmt::Debug> fmt::Debug for Ready<D, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ready")
            .field("context", &self.context)
            .finish()
    }
}
