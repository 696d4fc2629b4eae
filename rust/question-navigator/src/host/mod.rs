//! Host seams: everything the core needs from the page it runs in.
//!
//! The core never touches `web_sys` directly. It talks to a [`Document`]
//! (queries, classes, scrolling, mutation watches, panel mounting), a
//! [`Scheduler`] (cancelable timers) and a [`PreferenceStore`] (durable
//! key-value storage). The browser implementations live in `crate::web`;
//! in-memory fakes back the tests.

use std::rc::Rc;

use crate::error::Result;

#[cfg(test)]
pub(crate) mod fake;

// =============================================================================
// Timers
// =============================================================================

/// Opaque handle for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Single-threaded timer source.
///
/// `cancel` must be idempotent: cancelling an id that already fired, was
/// already cancelled, or never existed does nothing.
pub trait Scheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerId;
    fn cancel(&self, id: TimerId);
}

// =============================================================================
// Document
// =============================================================================

/// Live mutation subscription returned by [`Document::observe_subtree`]
pub trait MutationWatch {
    /// Stop delivering notifications. Idempotent.
    fn disconnect(&mut self);
}

/// Parameters for mounting the side panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSpec {
    pub title: String,
    pub width_px: u32,
    pub z_index: i32,
}

/// Data bound to one rendered list item
#[derive(Debug, Clone, Copy)]
pub struct ItemSpec<'a> {
    pub identity: &'a str,
    pub label: &'a str,
    pub text: &'a str,
    /// Full text, shown as a tooltip
    pub title: &'a str,
}

/// The mounted panel's list surface.
///
/// Pure data binding: the view draws what it is told and reports
/// activations through the closure handed to `append_item`.
pub trait PanelView {
    /// Remove every item and placeholder
    fn clear(&self);
    fn show_empty(&self, message: &str) -> Result<()>;
    fn append_item(&self, item: ItemSpec<'_>, on_activate: Box<dyn Fn()>) -> Result<()>;
    /// Toggle the selected marker on the item carrying `identity`; unknown ids are ignored
    fn set_item_selected(&self, identity: &str, selected: bool) -> Result<()>;
    fn set_width(&self, width_px: u32) -> Result<()>;
    /// Remove the panel from the page and release its listeners
    fn unmount(&self);
}

/// The host page as seen by the core.
///
/// `Node` handles are non-owning: the page may detach them at any time, so
/// callers check [`Document::is_connected`] before acting on an old handle.
pub trait Document: 'static {
    type Node: Clone + PartialEq + 'static;
    type Watch: MutationWatch + 'static;
    type Panel: PanelView + 'static;

    /// All matches in document order
    fn query_all(&self, selector: &str) -> Result<Vec<Self::Node>>;
    /// First match in document order
    fn query(&self, selector: &str) -> Result<Option<Self::Node>>;
    fn body(&self) -> Option<Self::Node>;
    fn text_content(&self, node: &Self::Node) -> String;
    fn is_connected(&self, node: &Self::Node) -> bool;
    /// Current address, used to detect in-page navigation
    fn location(&self) -> String;

    fn add_class(&self, node: &Self::Node, class: &str) -> Result<()>;
    fn remove_class(&self, node: &Self::Node, class: &str) -> Result<()>;

    /// Smooth, top-aligned native scroll
    fn scroll_into_view(&self, node: &Self::Node) -> Result<()>;
    /// Current vertical scroll position of the viewport
    fn scroll_y(&self) -> f64;
    /// Distance from the viewport top to the node's top edge
    fn viewport_top(&self, node: &Self::Node) -> f64;
    /// Smooth scroll of the viewport to an absolute offset
    fn scroll_to(&self, y: f64) -> Result<()>;

    /// Watch `node` for child insertions/removals at any depth
    fn observe_subtree(&self, node: &Self::Node, on_mutation: Rc<dyn Fn()>) -> Result<Self::Watch>;

    fn mount_panel(&self, spec: &PanelSpec) -> Result<Self::Panel>;
}

// =============================================================================
// Preference Storage
// =============================================================================

/// Durable string key-value storage
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
