//! Retry: bounded exponential backoff over timer callbacks
//!
//! Attempt `n` (zero-indexed) runs the probe; on a miss it waits
//! `base_delay * 2^n` before attempt `n + 1`. Once `max_attempts` probes have
//! missed and their waits have elapsed, `done(None)` is called. Attempts are
//! strictly sequential; the next probe is only scheduled from the previous
//! wait's expiry.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::NavigatorConfig;
use crate::error::Result;
use crate::host::{Scheduler, TimerId};
use crate::logging::Logger;

/// Backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub base_delay_ms: u32,
}

impl Backoff {
    pub fn from_config(config: &NavigatorConfig) -> Self {
        Self {
            max_attempts: config.max_retry_attempts,
            base_delay_ms: config.retry_base_delay_ms,
        }
    }

    /// Wait after the zero-indexed failed `attempt`
    pub fn delay_ms(&self, attempt: u32) -> u32 {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay_ms.saturating_mul(factor)
    }
}

type Probe<T> = Box<dyn Fn() -> Result<Option<T>>>;
type Done<T> = Box<dyn FnOnce(Option<T>)>;

struct RetryLoop<T> {
    scheduler: Rc<dyn Scheduler>,
    backoff: Backoff,
    log: Logger,
    probe: Probe<T>,
    done: RefCell<Option<Done<T>>>,
    pending: Cell<Option<TimerId>>,
}

impl<T: 'static> RetryLoop<T> {
    fn step(this: &Rc<Self>, attempt: u32) {
        let max = this.backoff.max_attempts;
        if attempt >= max {
            this.finish(None);
            return;
        }

        match (this.probe)() {
            Ok(Some(found)) => {
                this.finish(Some(found));
                return;
            }
            Ok(None) => {}
            // A failing probe counts as a miss
            Err(e) => this.log.error("findChatContainer", &e),
        }

        let delay = this.backoff.delay_ms(attempt);
        this.log.info(&format!(
            "Chat container not found, retrying in {}ms (attempt {}/{})",
            delay,
            attempt + 1,
            max
        ));
        let weak = Rc::downgrade(this);
        let id = this.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(this) = weak.upgrade() {
                    this.pending.set(None);
                    RetryLoop::step(&this, attempt + 1);
                }
            }),
        );
        this.pending.set(Some(id));
    }

    fn finish(&self, result: Option<T>) {
        let done = self.done.borrow_mut().take();
        if let Some(done) = done {
            done(result);
        }
    }
}

/// Handle to a running retry loop. Dropping it cancels the loop.
pub struct Retry<T: 'static> {
    state: Rc<RetryLoop<T>>,
}

impl<T: 'static> Retry<T> {
    /// Run the first probe now; later probes follow the backoff schedule.
    ///
    /// `done` is called exactly once unless the loop is cancelled first. It
    /// may run before `start` returns when the first probe hits.
    pub fn start(
        scheduler: Rc<dyn Scheduler>,
        backoff: Backoff,
        log: Logger,
        probe: impl Fn() -> Result<Option<T>> + 'static,
        done: impl FnOnce(Option<T>) + 'static,
    ) -> Self {
        let state = Rc::new(RetryLoop {
            scheduler,
            backoff,
            log,
            probe: Box::new(probe),
            done: RefCell::new(Some(Box::new(done))),
            pending: Cell::new(None),
        });
        RetryLoop::step(&state, 0);
        Self { state }
    }

    /// True until `done` has run or the loop was cancelled
    pub fn is_pending(&self) -> bool {
        self.state.done.borrow().is_some()
    }

    /// Stop waiting; `done` will never run. Idempotent.
    pub fn cancel(&self) {
        if let Some(id) = self.state.pending.take() {
            self.state.scheduler.cancel(id);
        }
        self.state.done.borrow_mut().take();
    }
}

impl<T: 'static> Drop for Retry<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
