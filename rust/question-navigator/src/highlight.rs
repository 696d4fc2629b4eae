//! Highlighter: scroll to a message and flash it
//!
//! At most one element carries the highlight class. A new highlight clears
//! the previous one synchronously (class removed, expiry cancelled) before
//! marking its target. Targets that left the document are skipped silently.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::{NavigatorConfig, ScrollStrategy};
use crate::error::Result;
use crate::extract::Entity;
use crate::host::{Document, Scheduler, TimerId};
use crate::logging::Logger;

struct Active<N> {
    node: N,
    expiry: TimerId,
}

struct HighlightInner<D: Document> {
    document: Rc<D>,
    scheduler: Rc<dyn Scheduler>,
    log: Logger,
    class: String,
    duration_ms: u32,
    settle_ms: u32,
    strategy: ScrollStrategy,
    default_offset_px: f64,
    current: RefCell<Option<Active<D::Node>>>,
    pending_settle: Cell<Option<TimerId>>,
}

/// Scroll/highlight controller
pub struct Highlighter<D: Document> {
    inner: Rc<HighlightInner<D>>,
}

impl<D: Document> Highlighter<D> {
    pub fn new(document: Rc<D>, scheduler: Rc<dyn Scheduler>, config: &NavigatorConfig, log: Logger) -> Self {
        Self {
            inner: Rc::new(HighlightInner {
                document,
                scheduler,
                log,
                class: config.highlight_class.clone(),
                duration_ms: config.highlight_duration_ms,
                settle_ms: config.scroll_settle_ms,
                strategy: config.scroll_strategy,
                default_offset_px: config.scroll_offset_px,
                current: RefCell::new(None),
                pending_settle: Cell::new(None),
            }),
        }
    }

    /// Scroll the entity's message into view, then highlight it once the
    /// scroll has had `scroll_settle_ms` to get going.
    ///
    /// `offset_px` only applies to [`ScrollStrategy::Offset`]; `None` uses the
    /// configured offset. A detached message is a silent no-op.
    pub fn scroll_to_entity(&self, entity: &Entity<D::Node>, offset_px: Option<f64>) -> Result<()> {
        let inner = &self.inner;
        let node = &entity.source;
        if !inner.document.is_connected(node) {
            return Ok(());
        }

        match inner.strategy {
            ScrollStrategy::IntoView => inner.document.scroll_into_view(node)?,
            ScrollStrategy::Offset => {
                let offset = offset_px.unwrap_or(inner.default_offset_px);
                let y = inner.document.scroll_y() + inner.document.viewport_top(node) - offset;
                inner.document.scroll_to(y.max(0.0))?;
            }
        }

        if let Some(id) = inner.pending_settle.take() {
            inner.scheduler.cancel(id);
        }
        let weak = Rc::downgrade(inner);
        let target = node.clone();
        let id = inner.scheduler.schedule(
            inner.settle_ms,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.pending_settle.set(None);
                if !inner.document.is_connected(&target) {
                    return;
                }
                if let Err(e) = HighlightInner::highlight(&inner, &target) {
                    inner.log.error("highlightElement", &e);
                }
            }),
        );
        inner.pending_settle.set(Some(id));
        Ok(())
    }

    /// Highlight `node` now, replacing any current highlight
    pub fn highlight(&self, node: &D::Node) -> Result<()> {
        HighlightInner::highlight(&self.inner, node)
    }

    /// Remove the current highlight and cancel every pending timer
    pub fn clear(&self) {
        if let Some(id) = self.inner.pending_settle.take() {
            self.inner.scheduler.cancel(id);
        }
        self.inner.clear_current();
    }

    pub fn current(&self) -> Option<D::Node> {
        self.inner.current.borrow().as_ref().map(|a| a.node.clone())
    }

    pub fn has_pending_scroll(&self) -> bool {
        self.inner.pending_settle.get().is_some()
    }
}

impl<D: Document> HighlightInner<D> {
    fn clear_current(&self) {
        let previous = self.current.borrow_mut().take();
        if let Some(active) = previous {
            self.scheduler.cancel(active.expiry);
            // Class removal works on detached nodes too
            if let Err(e) = self.document.remove_class(&active.node, &self.class) {
                self.log.error("removeCurrentHighlight", &e);
            }
        }
    }

    fn highlight(inner: &Rc<Self>, node: &D::Node) -> Result<()> {
        inner.clear_current();
        inner.document.add_class(node, &inner.class)?;

        let weak = Rc::downgrade(inner);
        let target = node.clone();
        let expiry = inner.scheduler.schedule(
            inner.duration_ms,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let is_current = inner
                    .current
                    .borrow()
                    .as_ref()
                    .is_some_and(|a| a.node == target);
                if is_current {
                    *inner.current.borrow_mut() = None;
                }
                if let Err(e) = inner.document.remove_class(&target, &inner.class) {
                    inner.log.error("highlightExpiry", &e);
                }
            }),
        );
        *inner.current.borrow_mut() = Some(Active {
            node: node.clone(),
            expiry,
        });
        Ok(())
    }
}

impl<D: Document> Drop for Highlighter<D> {
    fn drop(&mut self) {
        self.clear();
    }
}
