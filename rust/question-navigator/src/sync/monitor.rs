//! ChangeMonitor: debounced subtree mutation watching
//!
//! Each raw notification batch is only a trigger; its records are never
//! inspected. Triggers feed a [`Debounced`] so a streaming response that
//! touches the DOM hundreds of times produces one refresh.
//!
//! # Lifecycle
//! - `start_observing` replaces any existing subscription
//! - `stop_observing` is idempotent
//! - After `stop_observing`, no `on_change` runs, including for notifications
//!   the host queued before the disconnect landed. A shared `live` flag is
//!   cleared first so late deliveries fall through.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::Result;
use crate::host::{Document, MutationWatch, Scheduler};
use crate::sync::debounce::Debounced;

struct Subscription<W: MutationWatch> {
    watch: W,
    debounced: Rc<Debounced<()>>,
    live: Rc<Cell<bool>>,
}

impl<W: MutationWatch> Subscription<W> {
    fn teardown(mut self) {
        self.live.set(false);
        self.watch.disconnect();
        self.debounced.cancel();
    }
}

/// One-subscription-at-a-time mutation monitor
pub struct ChangeMonitor<D: Document> {
    document: Rc<D>,
    scheduler: Rc<dyn Scheduler>,
    debounce_ms: u32,
    active: RefCell<Option<Subscription<D::Watch>>>,
}

impl<D: Document> ChangeMonitor<D> {
    pub fn new(document: Rc<D>, scheduler: Rc<dyn Scheduler>, debounce_ms: u32) -> Self {
        Self {
            document,
            scheduler,
            debounce_ms,
            active: RefCell::new(None),
        }
    }

    /// Watch `container`, calling `on_change` once per quiet period after mutations.
    ///
    /// On error the monitor is left stopped.
    pub fn start_observing(&self, container: &D::Node, on_change: impl Fn() + 'static) -> Result<()> {
        self.stop_observing();

        let debounced = Rc::new(Debounced::new(
            Rc::clone(&self.scheduler),
            self.debounce_ms,
            move |()| on_change(),
        ));
        let live = Rc::new(Cell::new(true));

        let trigger: Rc<dyn Fn()> = {
            let live = Rc::clone(&live);
            let debounced = Rc::clone(&debounced);
            Rc::new(move || {
                if live.get() {
                    debounced.call(());
                }
            })
        };

        let watch = self.document.observe_subtree(container, trigger)?;
        *self.active.borrow_mut() = Some(Subscription {
            watch,
            debounced,
            live,
        });
        Ok(())
    }

    pub fn stop_observing(&self) {
        let previous = self.active.borrow_mut().take();
        if let Some(subscription) = previous {
            subscription.teardown();
        }
    }

    pub fn is_observing(&self) -> bool {
        self.active.borrow().is_some()
    }

    /// True while a debounced refresh is waiting for its quiet period
    pub fn has_pending_change(&self) -> bool {
        self.active
            .borrow()
            .as_ref()
            .is_some_and(|s| s.debounced.is_pending())
    }
}

impl<D: Document> Drop for ChangeMonitor<D> {
    fn drop(&mut self) {
        self.stop_observing();
    }
}
