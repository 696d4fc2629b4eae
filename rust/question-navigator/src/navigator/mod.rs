//! Navigator: lifecycle owner for one page
//!
//! Ties the components together:
//! 1. Locate the conversation container with bounded backoff
//! 2. Mount the panel and render one extraction pass
//! 3. Watch the container; every debounced change re-extracts and re-renders,
//!    carrying the selection across when its identity survives
//! 4. Watch the whole document for URL changes; on navigation tear down,
//!    wait for the new page to settle, and start over
//!
//! Every externally triggered entry point (initialization stages, the refresh
//! callback, item clicks) runs inside [`Logger::guard`], so failures are logged
//! with context and never escape into the host's event loop.
//!
//! # Phases
//! `Idle -> Locating -> Ready`. `initialize` only runs from `Idle`; a second
//! call while locating or ready is a logged no-op, which is what keeps two
//! close navigation signals from initializing twice.

mod retry;


pub use retry::{Backoff, Retry};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use instant::Instant;
use serde::Serialize;

use crate::config::NavigatorConfig;
use crate::error::Result;
use crate::extract::{Entity, Extractor};
use crate::highlight::Highlighter;
use crate::host::{Document, MutationWatch, PanelSpec, PanelView, PreferenceStore, Scheduler, TimerId};
use crate::logging::{LogSink, Logger};
use crate::panel::Panel;
use crate::preference::WidthPreference;
use crate::sync::ChangeMonitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Locating,
    Ready,
}

/// Counters for the sync loop
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncStats {
    /// Successful initializations (first load plus each navigation)
    pub initializations: u64,
    /// Refresh passes that rendered
    pub refreshes: u64,
    /// Refresh passes that failed and were logged
    pub failed_refreshes: u64,
    /// Detected URL changes
    pub navigations: u64,
    /// Entities rendered by the latest pass
    pub last_entity_count: usize,
    /// Wall time of the latest successful refresh
    pub last_refresh_ms: f64,
}

struct Inner<D: Document> {
    document: Rc<D>,
    scheduler: Rc<dyn Scheduler>,
    store: Rc<dyn PreferenceStore>,
    config: NavigatorConfig,
    log: Logger,

    extractor: Extractor<D>,
    monitor: ChangeMonitor<D>,
    highlighter: Highlighter<D>,
    width: WidthPreference,

    phase: Cell<Phase>,
    locate: RefCell<Option<Retry<D::Node>>>,
    panel: RefCell<Option<Panel<D::Panel, D::Node>>>,
    panel_width: Cell<u32>,

    navigation: RefCell<Option<D::Watch>>,
    last_location: RefCell<String>,
    settle_timers: RefCell<Vec<(u64, TimerId)>>,
    next_settle: Cell<u64>,

    stats: RefCell<SyncStats>,
}

/// Question navigator bound to one document
pub struct Navigator<D: Document> {
    inner: Rc<Inner<D>>,
}

impl<D: Document> Navigator<D> {
    /// Build an idle navigator. Nothing touches the document until
    /// [`start`](Self::start) or [`initialize`](Self::initialize).
    pub fn new(
        document: Rc<D>,
        scheduler: Rc<dyn Scheduler>,
        store: Rc<dyn PreferenceStore>,
        sink: Rc<dyn LogSink>,
        config: NavigatorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let log = Logger::new(&config.log_prefix, sink);

        let inner = Inner {
            extractor: Extractor::new(Rc::clone(&document), &config),
            monitor: ChangeMonitor::new(Rc::clone(&document), Rc::clone(&scheduler), config.debounce_ms),
            highlighter: Highlighter::new(Rc::clone(&document), Rc::clone(&scheduler), &config, log.clone()),
            width: WidthPreference::new(&config),
            phase: Cell::new(Phase::Idle),
            locate: RefCell::new(None),
            panel: RefCell::new(None),
            panel_width: Cell::new(config.panel_width_px),
            navigation: RefCell::new(None),
            last_location: RefCell::new(document.location()),
            settle_timers: RefCell::new(Vec::new()),
            next_settle: Cell::new(0),
            stats: RefCell::new(SyncStats::default()),
            document,
            scheduler,
            store,
            config,
            log,
        };
        Ok(Self { inner: Rc::new(inner) })
    }

    /// Initialize now and re-initialize on every later URL change
    pub fn start(&self) {
        Inner::initialize(&self.inner);
        self.inner
            .log
            .guard("setupNavigationWatch", (), || Inner::watch_navigation(&self.inner));
    }

    /// Locate the container, mount the panel, render, and start watching.
    /// No-op with a warning unless idle.
    pub fn initialize(&self) {
        Inner::initialize(&self.inner);
    }

    /// Re-extract and re-render now, outside the debounce window
    pub fn refresh(&self) {
        Inner::refresh(&self.inner);
    }

    /// Activate an item as if it had been clicked; false if not rendered
    pub fn select(&self, identity: &str) -> bool {
        let panel = self.inner.panel.borrow();
        panel.as_ref().is_some_and(|p| p.activate(identity))
    }

    /// Clamp, persist, and apply a panel width; returns the applied width
    pub fn set_panel_width(&self, width_px: u32) -> u32 {
        let inner = &self.inner;
        let width = inner.width.clamp(width_px);
        inner.log.guard("savePanelWidth", (), || {
            inner.width.save(inner.store.as_ref(), width).map(|_| ())
        });
        inner.panel_width.set(width);
        if let Some(panel) = inner.panel.borrow().as_ref() {
            inner
                .log
                .guard("applyPanelWidth", (), || panel.view().set_width(width));
        }
        width
    }

    /// Tear everything down: watches, timers, highlight, and the panel.
    /// The navigator can be started again afterwards.
    pub fn shutdown(&self) {
        Inner::release(&self.inner);
        self.inner.log.info("Question navigator shut down");
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.inner.phase.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.phase.get() == Phase::Ready
    }

    pub fn is_observing(&self) -> bool {
        self.inner.monitor.is_observing()
    }

    /// Entities as currently rendered
    pub fn entities(&self) -> Vec<Entity<D::Node>> {
        self.inner
            .panel
            .borrow()
            .as_ref()
            .map(|p| p.entities())
            .unwrap_or_default()
    }

    pub fn selected(&self) -> Option<String> {
        self.inner.panel.borrow().as_ref().and_then(|p| p.selected())
    }

    pub fn panel_width(&self) -> u32 {
        self.inner.panel_width.get()
    }

    pub fn highlighted(&self) -> Option<D::Node> {
        self.inner.highlighter.current()
    }

    pub fn stats(&self) -> SyncStats {
        self.inner.stats.borrow().clone()
    }
}

impl<D: Document> Drop for Navigator<D> {
    fn drop(&mut self) {
        Inner::release(&self.inner);
    }
}

impl<D: Document> Inner<D> {
    // -------------------------------------------------------------------------
    // Initialization
    // -------------------------------------------------------------------------

    fn initialize(inner: &Rc<Self>) {
        if inner.phase.get() != Phase::Idle {
            inner.log.warn("initialize", "Navigator already initialized");
            return;
        }
        inner.phase.set(Phase::Locating);
        inner.log.info("Initializing question navigator...");

        let probe = {
            let weak = Rc::downgrade(inner);
            move || match weak.upgrade() {
                Some(inner) => inner.extractor.find_container(),
                None => Ok(None),
            }
        };
        let done = {
            let weak = Rc::downgrade(inner);
            move |found: Option<D::Node>| {
                if let Some(inner) = weak.upgrade() {
                    Inner::on_container(&inner, found);
                }
            }
        };
        let retry = Retry::start(
            Rc::clone(&inner.scheduler),
            Backoff::from_config(&inner.config),
            inner.log.clone(),
            probe,
            done,
        );
        // A first-probe hit has already finished synchronously
        if retry.is_pending() {
            *inner.locate.borrow_mut() = Some(retry);
        }
    }

    fn on_container(inner: &Rc<Self>, found: Option<D::Node>) {
        let finished = inner.locate.borrow_mut().take();
        drop(finished);

        let Some(container) = found else {
            inner.phase.set(Phase::Idle);
            inner
                .log
                .warn("initialize", "Chat container not found after retries. Navigator disabled.");
            return;
        };
        inner.log.info("Chat container found");

        inner.log.guard("createPanel", (), || Inner::mount_panel(inner));

        inner.log.guard("extractInitialQuestions", (), || {
            let entities = inner.extractor.extract()?;
            let count = entities.len();
            if let Some(panel) = inner.panel.borrow().as_ref() {
                panel.update_entities(entities)?;
            }
            inner.stats.borrow_mut().last_entity_count = count;
            inner.log.info(&format!("Found {} initial questions", count));
            Ok(())
        });

        inner.log.guard("setupDOMObserver", (), || {
            let weak = Rc::downgrade(inner);
            inner.monitor.start_observing(&container, move || {
                if let Some(inner) = weak.upgrade() {
                    Inner::refresh(&inner);
                }
            })?;
            inner.log.info("DOM observer initialized");
            Ok(())
        });

        inner.phase.set(Phase::Ready);
        inner.stats.borrow_mut().initializations += 1;
        inner.log.info("Question navigator initialized successfully");
    }

    /// Mount a fresh panel, tearing down any previous one first
    fn mount_panel(inner: &Rc<Self>) -> Result<()> {
        let previous = inner.panel.borrow_mut().take();
        if let Some(previous) = previous {
            previous.destroy();
        }

        let width = inner.width.load(inner.store.as_ref());
        inner.panel_width.set(width);
        let view = inner.document.mount_panel(&PanelSpec {
            title: inner.config.panel_title.clone(),
            width_px: width,
            z_index: inner.config.panel_z_index,
        })?;

        let panel = Panel::new(view, inner.config.empty_text.clone(), inner.log.clone())?;
        let weak = Rc::downgrade(inner);
        panel.set_on_select(move |entity| {
            if let Some(inner) = weak.upgrade() {
                inner.log.guard("handleQuestionClick", (), || {
                    inner.highlighter.scroll_to_entity(entity, None)
                });
            }
        });
        *inner.panel.borrow_mut() = Some(panel);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Sync
    // -------------------------------------------------------------------------

    fn refresh(inner: &Rc<Self>) {
        if inner.panel.borrow().is_none() {
            return;
        }
        let started = Instant::now();
        let rendered = inner.log.guard("refreshQuestionList", None, || {
            let entities = inner.extractor.extract()?;
            let count = entities.len();
            if let Some(panel) = inner.panel.borrow().as_ref() {
                panel.replace_preserving_selection(entities)?;
            }
            Ok(Some(count))
        });

        let mut stats = inner.stats.borrow_mut();
        match rendered {
            Some(count) => {
                stats.refreshes += 1;
                stats.last_entity_count = count;
                stats.last_refresh_ms = started.elapsed().as_secs_f64() * 1000.0;
            }
            None => stats.failed_refreshes += 1,
        }
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    fn watch_navigation(inner: &Rc<Self>) -> Result<()> {
        if inner.navigation.borrow().is_some() {
            return Ok(());
        }
        let Some(body) = inner.document.body() else {
            inner.log.warn("setupNavigationWatch", "document has no body");
            return Ok(());
        };
        *inner.last_location.borrow_mut() = inner.document.location();

        let weak = Rc::downgrade(inner);
        let watch = inner.document.observe_subtree(
            &body,
            Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Inner::check_location(&inner);
                }
            }),
        )?;
        *inner.navigation.borrow_mut() = Some(watch);
        Ok(())
    }

    fn check_location(inner: &Rc<Self>) {
        let href = inner.document.location();
        if *inner.last_location.borrow() == href {
            return;
        }
        *inner.last_location.borrow_mut() = href;
        inner.log.info("URL changed, re-initializing...");
        Inner::on_navigate(inner);
    }

    fn on_navigate(inner: &Rc<Self>) {
        Inner::teardown_page(inner);
        if let Some(panel) = inner.panel.borrow().as_ref() {
            panel.reset();
        }
        inner.stats.borrow_mut().navigations += 1;

        let token = inner.next_settle.get();
        inner.next_settle.set(token + 1);
        let weak = Rc::downgrade(inner);
        let id = inner.scheduler.schedule(
            inner.config.navigation_settle_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.settle_timers.borrow_mut().retain(|(t, _)| *t != token);
                    Inner::initialize(&inner);
                }
            }),
        );
        inner.settle_timers.borrow_mut().push((token, id));
    }

    fn release(inner: &Rc<Self>) {
        let navigation = inner.navigation.borrow_mut().take();
        if let Some(mut watch) = navigation {
            watch.disconnect();
        }
        let timers = std::mem::take(&mut *inner.settle_timers.borrow_mut());
        for (_, id) in timers {
            inner.scheduler.cancel(id);
        }
        Inner::teardown_page(inner);
        let panel = inner.panel.borrow_mut().take();
        if let Some(panel) = panel {
            panel.destroy();
        }
    }

    /// Stop per-page work: monitor, container search, highlight
    fn teardown_page(inner: &Rc<Self>) {
        inner.monitor.stop_observing();
        let locate = inner.locate.borrow_mut().take();
        if let Some(locate) = locate {
            locate.cancel();
        }
        inner.highlighter.clear();
        inner.phase.set(Phase::Idle);
    }
}
