//! `Scheduler` over browser timeouts

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

use crate::host::{Scheduler, TimerId};

/// Timer source backed by `setTimeout`.
///
/// A `Timeout` owns its JS closure, so it must outlive the callback. Fired
/// ids are queued and their handles released on the next `schedule` or
/// `cancel` call, never from inside the callback itself.
#[derive(Default)]
pub struct BrowserScheduler {
    next_id: Cell<u64>,
    timers: RefCell<HashMap<TimerId, Timeout>>,
    fired: Rc<RefCell<Vec<TimerId>>>,
    running: Rc<Cell<Option<TimerId>>>,
}

impl BrowserScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn active(&self) -> usize {
        self.sweep();
        self.timers.borrow().len()
    }

    fn sweep(&self) {
        let fired = std::mem::take(&mut *self.fired.borrow_mut());
        let mut timers = self.timers.borrow_mut();
        for id in fired {
            timers.remove(&id);
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerId {
        self.sweep();
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let fired = Rc::clone(&self.fired);
        let running = Rc::clone(&self.running);
        let timeout = Timeout::new(delay_ms, move || {
            running.set(Some(id));
            task();
            running.set(None);
            fired.borrow_mut().push(id);
        });
        self.timers.borrow_mut().insert(id, timeout);
        id
    }

    fn cancel(&self, id: TimerId) {
        // The running task's closure cannot be released from inside itself
        if self.running.get() == Some(id) {
            return;
        }
        self.sweep();
        let timeout = self.timers.borrow_mut().remove(&id);
        if let Some(timeout) = timeout {
            timeout.cancel();
        }
    }
}
