//! In-memory host used by the unit and end-to-end tests.
//!
//! `FakeDocument` is a flat list of nodes in document order with a tiny
//! selector matcher (`tag`, `[attr]`, `[attr="value"]`). Mutation delivery is
//! explicit: `notify` fires every live watch now, `queue_notification` takes a
//! snapshot of the live watches for a later `flush`, which is how a browser
//! hands over records that were queued before `disconnect`.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use super::{Document, ItemSpec, MutationWatch, PanelSpec, PanelView, PreferenceStore, Scheduler, TimerId};
use crate::error::{NavError, Result};
use crate::logging::{Level, LogSink};

// =============================================================================
// ManualScheduler
// =============================================================================

struct PendingTask {
    due: u64,
    id: TimerId,
    task: Box<dyn FnOnce()>,
}

/// Virtual-time scheduler. Nothing runs until `advance`.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<u64>,
    next_id: Cell<u64>,
    tasks: RefCell<Vec<PendingTask>>,
}

impl ManualScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Move time forward, running due tasks in (due, scheduling) order.
    /// Tasks scheduled while advancing run too if they fall inside the window.
    pub fn advance(&self, ms: u64) {
        let target = self.now.get() + ms;
        loop {
            let next = {
                let mut tasks = self.tasks.borrow_mut();
                let index = tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                index.map(|i| tasks.remove(i))
            };
            match next {
                Some(pending) => {
                    self.now.set(pending.due);
                    (pending.task)();
                }
                None => break,
            }
        }
        self.now.set(target);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.tasks.borrow_mut().push(PendingTask {
            due: self.now.get() + u64::from(delay_ms),
            id,
            task,
        });
        id
    }

    fn cancel(&self, id: TimerId) {
        self.tasks.borrow_mut().retain(|t| t.id != id);
    }
}

// =============================================================================
// FakeDocument
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollCall {
    IntoView(NodeId),
    To(f64),
}

struct NodeData {
    id: NodeId,
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    connected: bool,
    classes: BTreeSet<String>,
    top: f64,
}

type WatchList = Rc<RefCell<Vec<(u64, Rc<dyn Fn()>)>>>;

pub struct FakeDocument {
    nodes: RefCell<Vec<NodeData>>,
    body: NodeId,
    href: RefCell<String>,
    watches: WatchList,
    next_watch: Cell<u64>,
    queued: RefCell<Vec<Rc<dyn Fn()>>>,
    scroll_y: Cell<f64>,
    scroll_log: RefCell<Vec<ScrollCall>>,
    panels: RefCell<Vec<FakePanel>>,
    fail_mount: Cell<bool>,
}

impl FakeDocument {
    pub fn new() -> Rc<Self> {
        let body = NodeData {
            id: NodeId(0),
            tag: "body".into(),
            attrs: Vec::new(),
            text: String::new(),
            connected: true,
            classes: BTreeSet::new(),
            top: 0.0,
        };
        Rc::new(Self {
            nodes: RefCell::new(vec![body]),
            body: NodeId(0),
            href: RefCell::new("https://chat.example.com/c/first".into()),
            watches: Rc::new(RefCell::new(Vec::new())),
            next_watch: Cell::new(0),
            queued: RefCell::new(Vec::new()),
            scroll_y: Cell::new(0.0),
            scroll_log: RefCell::new(Vec::new()),
            panels: RefCell::new(Vec::new()),
            fail_mount: Cell::new(false),
        })
    }

    /// Append an element at the end of the document. Does not notify watches.
    pub fn add_element(&self, tag: &str, attrs: &[(&str, &str)], text: &str) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len() as u64);
        nodes.push(NodeData {
            id,
            tag: tag.into(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: text.into(),
            connected: true,
            classes: BTreeSet::new(),
            top: 100.0 * id.0 as f64,
        });
        id
    }

    pub fn add_container(&self) -> NodeId {
        self.add_element("div", &[("role", "presentation")], "")
    }

    pub fn add_message(&self, role: &str, text: &str) -> NodeId {
        self.add_element("div", &[("data-message-author-role", role)], text)
    }

    pub fn add_user_message(&self, text: &str) -> NodeId {
        self.add_message("user", text)
    }

    /// Remove a node from the document; handles to it stay valid but disconnected
    pub fn detach(&self, id: NodeId) {
        if let Some(node) = self.nodes.borrow_mut().iter_mut().find(|n| n.id == id) {
            node.connected = false;
        }
    }

    pub fn set_href(&self, href: &str) {
        *self.href.borrow_mut() = href.into();
    }

    pub fn set_top(&self, id: NodeId, top: f64) {
        if let Some(node) = self.nodes.borrow_mut().iter_mut().find(|n| n.id == id) {
            node.top = top;
        }
    }

    pub fn set_scroll_y(&self, y: f64) {
        self.scroll_y.set(y);
    }

    pub fn set_fail_mount(&self, fail: bool) {
        self.fail_mount.set(fail);
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes
            .borrow()
            .iter()
            .any(|n| n.id == id && n.classes.contains(class))
    }

    pub fn scroll_log(&self) -> Vec<ScrollCall> {
        self.scroll_log.borrow().clone()
    }

    pub fn watch_count(&self) -> usize {
        self.watches.borrow().len()
    }

    /// Most recently mounted panel
    pub fn panel(&self) -> Option<FakePanel> {
        self.panels.borrow().last().cloned()
    }

    pub fn panel_count(&self) -> usize {
        self.panels.borrow().len()
    }

    pub fn mounted_panel_count(&self) -> usize {
        self.panels.borrow().iter().filter(|p| p.is_mounted()).count()
    }

    /// Deliver a mutation notification to every live watch right now
    pub fn notify(&self) {
        let callbacks: Vec<Rc<dyn Fn()>> =
            self.watches.borrow().iter().map(|(_, cb)| Rc::clone(cb)).collect();
        for cb in callbacks {
            cb();
        }
    }

    /// Record a notification for every live watch, delivered on `flush`
    pub fn queue_notification(&self) {
        let callbacks: Vec<Rc<dyn Fn()>> =
            self.watches.borrow().iter().map(|(_, cb)| Rc::clone(cb)).collect();
        self.queued.borrow_mut().extend(callbacks);
    }

    pub fn flush(&self) {
        let queued = std::mem::take(&mut *self.queued.borrow_mut());
        for cb in queued {
            cb();
        }
    }

    fn with_node<T>(&self, id: NodeId, f: impl FnOnce(&mut NodeData) -> T) -> Result<T> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| NavError::host("node", format!("unknown node {:?}", id)))?;
        Ok(f(node))
    }
}

enum Matcher {
    Tag(String),
    Attr(String, Option<String>),
}

fn parse_selector(selector: &str) -> Result<Matcher> {
    let invalid = |reason: &str| NavError::Selector {
        selector: selector.to_string(),
        reason: reason.to_string(),
    };
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(invalid("empty selector"));
    }
    if let Some(inner) = selector.strip_prefix('[') {
        let inner = inner.strip_suffix(']').ok_or_else(|| invalid("unclosed attribute"))?;
        return Ok(match inner.split_once('=') {
            Some((name, value)) => Matcher::Attr(
                name.trim().to_string(),
                Some(value.trim().trim_matches('"').to_string()),
            ),
            None => Matcher::Attr(inner.trim().to_string(), None),
        });
    }
    if selector.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Ok(Matcher::Tag(selector.to_string()));
    }
    Err(invalid("unsupported selector"))
}

fn matches(node: &NodeData, matcher: &Matcher) -> bool {
    match matcher {
        Matcher::Tag(tag) => node.tag == *tag,
        Matcher::Attr(name, value) => node.attrs.iter().any(|(k, v)| {
            k == name && value.as_ref().map_or(true, |expected| v == expected)
        }),
    }
}

pub struct FakeWatch {
    id: u64,
    watches: WatchList,
}

impl MutationWatch for FakeWatch {
    fn disconnect(&mut self) {
        let id = self.id;
        self.watches.borrow_mut().retain(|(w, _)| *w != id);
    }
}

impl Document for FakeDocument {
    type Node = NodeId;
    type Watch = FakeWatch;
    type Panel = FakePanel;

    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let matcher = parse_selector(selector)?;
        Ok(self
            .nodes
            .borrow()
            .iter()
            .filter(|n| n.connected && matches(n, &matcher))
            .map(|n| n.id)
            .collect())
    }

    fn query(&self, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn text_content(&self, node: &NodeId) -> String {
        self.with_node(*node, |n| n.text.clone()).unwrap_or_default()
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.with_node(*node, |n| n.connected).unwrap_or(false)
    }

    fn location(&self) -> String {
        self.href.borrow().clone()
    }

    fn add_class(&self, node: &NodeId, class: &str) -> Result<()> {
        self.with_node(*node, |n| {
            n.classes.insert(class.to_string());
        })
    }

    fn remove_class(&self, node: &NodeId, class: &str) -> Result<()> {
        self.with_node(*node, |n| {
            n.classes.remove(class);
        })
    }

    fn scroll_into_view(&self, node: &NodeId) -> Result<()> {
        self.scroll_log.borrow_mut().push(ScrollCall::IntoView(*node));
        Ok(())
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn viewport_top(&self, node: &NodeId) -> f64 {
        let top = self.with_node(*node, |n| n.top).unwrap_or(0.0);
        top - self.scroll_y.get()
    }

    fn scroll_to(&self, y: f64) -> Result<()> {
        self.scroll_y.set(y);
        self.scroll_log.borrow_mut().push(ScrollCall::To(y));
        Ok(())
    }

    fn observe_subtree(&self, node: &NodeId, on_mutation: Rc<dyn Fn()>) -> Result<FakeWatch> {
        if !self.is_connected(node) {
            return Err(NavError::host("observe", "target is not connected"));
        }
        let id = self.next_watch.get();
        self.next_watch.set(id + 1);
        self.watches.borrow_mut().push((id, on_mutation));
        Ok(FakeWatch {
            id,
            watches: Rc::clone(&self.watches),
        })
    }

    fn mount_panel(&self, spec: &PanelSpec) -> Result<FakePanel> {
        if self.fail_mount.get() {
            return Err(NavError::host("appendChild", "body rejected the panel"));
        }
        let panel = FakePanel::new(spec.clone());
        self.panels.borrow_mut().push(panel.clone());
        Ok(panel)
    }
}

// =============================================================================
// FakePanel
// =============================================================================

pub struct FakeItem {
    pub identity: String,
    pub label: String,
    pub text: String,
    pub title: String,
    pub selected: bool,
    on_activate: Rc<dyn Fn()>,
}

struct FakePanelState {
    spec: PanelSpec,
    width: Cell<u32>,
    items: RefCell<Vec<FakeItem>>,
    empty: RefCell<Option<String>>,
    mounted: Cell<bool>,
    /// Appends fail once this many items are rendered
    fail_append_at: Cell<Option<usize>>,
    fail_updates: Cell<bool>,
}

/// Recording panel view; clones share state
#[derive(Clone)]
pub struct FakePanel {
    state: Rc<FakePanelState>,
}

impl FakePanel {
    fn new(spec: PanelSpec) -> Self {
        Self {
            state: Rc::new(FakePanelState {
                width: Cell::new(spec.width_px),
                spec,
                items: RefCell::new(Vec::new()),
                empty: RefCell::new(None),
                mounted: Cell::new(true),
                fail_append_at: Cell::new(None),
                fail_updates: Cell::new(false),
            }),
        }
    }

    pub fn detached() -> Self {
        Self::new(PanelSpec {
            title: "Questions".into(),
            width_px: 240,
            z_index: 10000,
        })
    }

    pub fn spec(&self) -> PanelSpec {
        self.state.spec.clone()
    }

    pub fn width(&self) -> u32 {
        self.state.width.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.state.mounted.get()
    }

    pub fn item_count(&self) -> usize {
        self.state.items.borrow().len()
    }

    pub fn item_ids(&self) -> Vec<String> {
        self.state.items.borrow().iter().map(|i| i.identity.clone()).collect()
    }

    pub fn item_labels(&self) -> Vec<String> {
        self.state.items.borrow().iter().map(|i| i.label.clone()).collect()
    }

    pub fn item_texts(&self) -> Vec<String> {
        self.state.items.borrow().iter().map(|i| i.text.clone()).collect()
    }

    pub fn item_titles(&self) -> Vec<String> {
        self.state.items.borrow().iter().map(|i| i.title.clone()).collect()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.state
            .items
            .borrow()
            .iter()
            .filter(|i| i.selected)
            .map(|i| i.identity.clone())
            .collect()
    }

    pub fn empty_message(&self) -> Option<String> {
        self.state.empty.borrow().clone()
    }

    pub fn set_fail_append(&self, fail: bool) {
        self.state.fail_append_at.set(fail.then_some(0));
    }

    /// Let the first `rendered` appends succeed and fail every later one
    pub fn fail_append_after(&self, rendered: usize) {
        self.state.fail_append_at.set(Some(rendered));
    }

    /// Fail placeholder, selection marker, and width writes
    pub fn set_fail_updates(&self, fail: bool) {
        self.state.fail_updates.set(fail);
    }

    fn check_update(&self, op: &'static str) -> Result<()> {
        if self.state.fail_updates.get() {
            return Err(NavError::host(op, "node detached"));
        }
        Ok(())
    }

    /// Simulate a user click; false when no such item is rendered
    pub fn click(&self, identity: &str) -> bool {
        let handler = self
            .state
            .items
            .borrow()
            .iter()
            .find(|i| i.identity == identity)
            .map(|i| Rc::clone(&i.on_activate));
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

impl PanelView for FakePanel {
    fn clear(&self) {
        self.state.items.borrow_mut().clear();
        *self.state.empty.borrow_mut() = None;
    }

    fn show_empty(&self, message: &str) -> Result<()> {
        self.check_update("appendChild")?;
        *self.state.empty.borrow_mut() = Some(message.to_string());
        Ok(())
    }

    fn append_item(&self, item: ItemSpec<'_>, on_activate: Box<dyn Fn()>) -> Result<()> {
        if self
            .state
            .fail_append_at
            .get()
            .is_some_and(|at| self.state.items.borrow().len() >= at)
        {
            return Err(NavError::host("appendChild", "list detached"));
        }
        self.state.items.borrow_mut().push(FakeItem {
            identity: item.identity.to_string(),
            label: item.label.to_string(),
            text: item.text.to_string(),
            title: item.title.to_string(),
            selected: false,
            on_activate: Rc::from(on_activate),
        });
        Ok(())
    }

    fn set_item_selected(&self, identity: &str, selected: bool) -> Result<()> {
        self.check_update("classList.toggle")?;
        for item in self.state.items.borrow_mut().iter_mut() {
            if item.identity == identity {
                item.selected = selected;
            }
        }
        Ok(())
    }

    fn set_width(&self, width_px: u32) -> Result<()> {
        self.check_update("style")?;
        self.state.width.set(width_px);
        Ok(())
    }

    fn unmount(&self) {
        self.state.mounted.set(false);
        self.state.items.borrow_mut().clear();
        *self.state.empty.borrow_mut() = None;
    }
}

// =============================================================================
// Storage and Logging
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(NavError::Storage("quota exceeded".into()));
        }
        self.values.borrow_mut().insert(key.into(), value.into());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    lines: RefCell<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.borrow().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.lines.borrow().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|(_, line)| line.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn write(&self, level: Level, line: &str) {
        self.lines.borrow_mut().push((level, line.to_string()));
    }
}
