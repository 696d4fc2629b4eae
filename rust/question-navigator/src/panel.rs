//! Panel: list rendering and selection state
//!
//! The panel owns the rendered entity list and the selected identity. It is a
//! plain render primitive: `update_entities` always starts from a clean list
//! with nothing selected. Carrying a selection across a refresh is the
//! caller's job, see [`Panel::replace_preserving_selection`].
//!
//! The entity list only ever holds what the view actually rendered. A render
//! that fails partway falls back to the empty state before the error is
//! returned, so no unrendered entity can be selected or activated.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::Result;
use crate::extract::Entity;
use crate::host::{ItemSpec, PanelView};
use crate::logging::Logger;

type SelectCallback<N> = Rc<dyn Fn(&Entity<N>)>;

struct PanelInner<V: PanelView, N> {
    view: V,
    empty_text: String,
    entities: RefCell<Vec<Entity<N>>>,
    selected: RefCell<Option<String>>,
    on_select: RefCell<Option<SelectCallback<N>>>,
    mounted: Cell<bool>,
    log: Logger,
}

/// Rendered question list bound to a [`PanelView`]
pub struct Panel<V: PanelView + 'static, N: Clone + 'static> {
    inner: Rc<PanelInner<V, N>>,
}

impl<V: PanelView + 'static, N: Clone + 'static> Panel<V, N> {
    /// Wrap a freshly mounted view and show the empty state.
    ///
    /// If the placeholder cannot be drawn the view is unmounted again and the
    /// error returned.
    pub fn new(view: V, empty_text: impl Into<String>, log: Logger) -> Result<Self> {
        let empty_text = empty_text.into();
        if let Err(e) = view.show_empty(&empty_text) {
            view.unmount();
            return Err(e);
        }
        let inner = Rc::new(PanelInner {
            view,
            empty_text,
            entities: RefCell::new(Vec::new()),
            selected: RefCell::new(None),
            on_select: RefCell::new(None),
            mounted: Cell::new(true),
            log,
        });
        Ok(Self { inner })
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Replace the whole list. Clears the selection.
    pub fn update_entities(&self, entities: Vec<Entity<N>>) -> Result<()> {
        let inner = &self.inner;
        if !inner.mounted.get() {
            return Ok(());
        }

        inner.view.clear();
        *inner.selected.borrow_mut() = None;
        inner.entities.borrow_mut().clear();

        if entities.is_empty() {
            return inner.view.show_empty(&inner.empty_text);
        }

        if let Err(e) = PanelInner::render(inner, &entities) {
            inner.view.clear();
            inner.show_empty_logged();
            return Err(e);
        }
        *inner.entities.borrow_mut() = entities;
        Ok(())
    }

    /// Two-phase refresh: capture the selected identity, replace the list,
    /// reselect only if that identity is still present.
    pub fn replace_preserving_selection(&self, entities: Vec<Entity<N>>) -> Result<()> {
        let prior = self.selected();
        let still_present = prior
            .as_deref()
            .is_some_and(|id| entities.iter().any(|e| e.identity == id));
        self.update_entities(entities)?;
        if still_present {
            self.set_selected(prior.as_deref());
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Mark exactly one item, or none. Unknown identities leave nothing selected.
    pub fn set_selected(&self, identity: Option<&str>) {
        self.inner.set_selected(identity);
    }

    pub fn selected(&self) -> Option<String> {
        self.inner.selected.borrow().clone()
    }

    /// Register the activation callback, replacing any previous one
    pub fn set_on_select(&self, callback: impl Fn(&Entity<N>) + 'static) {
        *self.inner.on_select.borrow_mut() = Some(Rc::new(callback));
    }

    /// Same path as a user click on the item; false if no such item
    pub fn activate(&self, identity: &str) -> bool {
        PanelInner::activate(&self.inner, identity)
    }

    // -------------------------------------------------------------------------
    // Accessors and lifecycle
    // -------------------------------------------------------------------------

    pub fn entities(&self) -> Vec<Entity<N>> {
        self.inner.entities.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entities.borrow().is_empty()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    pub fn view(&self) -> &V {
        &self.inner.view
    }

    /// Back to the empty state without unmounting
    pub fn reset(&self) {
        if !self.inner.mounted.get() {
            return;
        }
        self.inner.view.clear();
        self.inner.entities.borrow_mut().clear();
        *self.inner.selected.borrow_mut() = None;
        self.inner.show_empty_logged();
    }

    /// Unmount the view and drop every held reference. Idempotent.
    pub fn destroy(&self) {
        if !self.inner.mounted.replace(false) {
            return;
        }
        self.inner.view.unmount();
        self.inner.entities.borrow_mut().clear();
        *self.inner.selected.borrow_mut() = None;
        *self.inner.on_select.borrow_mut() = None;
    }
}

impl<V: PanelView + 'static, N: Clone + 'static> PanelInner<V, N> {
    /// Append one item per entity, stopping at the first failure
    fn render(inner: &Rc<Self>, entities: &[Entity<N>]) -> Result<()> {
        for entity in entities {
            let weak: Weak<Self> = Rc::downgrade(inner);
            let identity = entity.identity.clone();
            inner.view.append_item(
                ItemSpec {
                    identity: &entity.identity,
                    label: &entity.label,
                    text: &entity.display_text,
                    title: &entity.full_text,
                },
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        PanelInner::activate(&inner, &identity);
                    }
                }),
            )?;
        }
        Ok(())
    }

    fn show_empty_logged(&self) {
        self.log
            .guard("showEmptyState", (), || self.view.show_empty(&self.empty_text));
    }

    /// The marker is cosmetic: a failed toggle is logged and the model still
    /// records the selection
    fn set_selected(&self, identity: Option<&str>) {
        let previous = self.selected.borrow_mut().take();
        if let Some(previous) = previous {
            self.log
                .guard("setSelected", (), || self.view.set_item_selected(&previous, false));
        }
        let Some(identity) = identity else {
            return;
        };
        let known = self.entities.borrow().iter().any(|e| e.identity == identity);
        if known {
            self.log
                .guard("setSelected", (), || self.view.set_item_selected(identity, true));
            *self.selected.borrow_mut() = Some(identity.to_string());
        }
    }

    fn activate(inner: &Rc<Self>, identity: &str) -> bool {
        if !inner.mounted.get() {
            return false;
        }
        let entity = inner
            .entities
            .borrow()
            .iter()
            .find(|e| e.identity == identity)
            .cloned();
        let Some(entity) = entity else {
            return false;
        };
        inner.set_selected(Some(identity));
        // Clone out of the cell so the callback may re-register itself
        let callback = inner.on_select.borrow().clone();
        if let Some(callback) = callback {
            callback(&entity);
        }
        true
    }
}
