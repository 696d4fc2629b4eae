//! Debounced: trailing-edge call coalescing
//!
//! Every `call` cancels the pending timer and schedules a fresh one, so a
//! burst of calls collapses into a single invocation `delay_ms` after the
//! last call, carrying that last call's argument.

use std::cell::Cell;
use std::rc::Rc;

use crate::host::{Scheduler, TimerId};

struct DebounceInner<A> {
    scheduler: Rc<dyn Scheduler>,
    delay_ms: u32,
    callback: Box<dyn Fn(A)>,
    pending: Cell<Option<TimerId>>,
}

/// Trailing-edge debounced wrapper around a callback.
///
/// Dropping the wrapper cancels any pending invocation.
pub struct Debounced<A: 'static> {
    inner: Rc<DebounceInner<A>>,
}

impl<A: 'static> Debounced<A> {
    pub fn new(scheduler: Rc<dyn Scheduler>, delay_ms: u32, callback: impl Fn(A) + 'static) -> Self {
        Self {
            inner: Rc::new(DebounceInner {
                scheduler,
                delay_ms,
                callback: Box::new(callback),
                pending: Cell::new(None),
            }),
        }
    }

    /// Restart the quiet window; `args` replaces any earlier pending argument
    pub fn call(&self, args: A) {
        if let Some(id) = self.inner.pending.take() {
            self.inner.scheduler.cancel(id);
        }
        let weak = Rc::downgrade(&self.inner);
        let id = self.inner.scheduler.schedule(
            self.inner.delay_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.pending.set(None);
                    (inner.callback)(args);
                }
            }),
        );
        self.inner.pending.set(Some(id));
    }

    /// Discard the pending invocation, if any
    pub fn cancel(&self) {
        if let Some(id) = self.inner.pending.take() {
            self.inner.scheduler.cancel(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }
}

impl<A: 'static> Drop for Debounced<A> {
    fn drop(&mut self) {
        self.cancel();
    }
}
