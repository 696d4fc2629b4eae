//! `Document` over the live browser DOM

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, MutationObserver, MutationObserverInit, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition, ScrollToOptions,
};

use super::panel::DomPanel;
use crate::error::{NavError, Result};
use crate::host::{Document, MutationWatch, PanelSpec};

pub(crate) fn js_error(op: &'static str) -> impl Fn(JsValue) -> NavError {
    move |value| NavError::host(op, describe(&value))
}

pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{:?}", value))
}

pub struct BrowserDocument {
    window: web_sys::Window,
    document: web_sys::Document,
    highlight_class: String,
}

impl BrowserDocument {
    pub fn new(highlight_class: &str) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| NavError::host("window", "no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| NavError::host("document", "window has no document"))?;
        Ok(Self {
            window,
            document,
            highlight_class: highlight_class.to_string(),
        })
    }

    fn selector_error(selector: &str) -> impl Fn(JsValue) -> NavError + '_ {
        move |value| NavError::Selector {
            selector: selector.to_string(),
            reason: describe(&value),
        }
    }
}

/// Subtree observer; disconnects on drop
pub struct BrowserWatch {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl MutationWatch for BrowserWatch {
    fn disconnect(&mut self) {
        self.observer.disconnect();
    }
}

impl Drop for BrowserWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl Document for BrowserDocument {
    type Node = Element;
    type Watch = BrowserWatch;
    type Panel = DomPanel;

    fn query_all(&self, selector: &str) -> Result<Vec<Element>> {
        let list = self
            .document
            .query_selector_all(selector)
            .map_err(Self::selector_error(selector))?;
        Ok((0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect())
    }

    fn query(&self, selector: &str) -> Result<Option<Element>> {
        self.document
            .query_selector(selector)
            .map_err(Self::selector_error(selector))
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Into::into)
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn location(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn add_class(&self, node: &Element, class: &str) -> Result<()> {
        node.class_list().add_1(class).map_err(js_error("classList.add"))
    }

    fn remove_class(&self, node: &Element, class: &str) -> Result<()> {
        node.class_list()
            .remove_1(class)
            .map_err(js_error("classList.remove"))
    }

    fn scroll_into_view(&self, node: &Element) -> Result<()> {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Start);
        node.scroll_into_view_with_scroll_into_view_options(&options);
        Ok(())
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn viewport_top(&self, node: &Element) -> f64 {
        node.get_bounding_client_rect().top()
    }

    fn scroll_to(&self, y: f64) -> Result<()> {
        let options = ScrollToOptions::new();
        options.set_top(y);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
        Ok(())
    }

    fn observe_subtree(&self, node: &Element, on_mutation: Rc<dyn Fn()>) -> Result<BrowserWatch> {
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: MutationObserver| on_mutation(),
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(js_error("MutationObserver"))?;

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(node, &init)
            .map_err(js_error("MutationObserver.observe"))?;

        Ok(BrowserWatch {
            observer,
            _callback: callback,
        })
    }

    fn mount_panel(&self, spec: &PanelSpec) -> Result<DomPanel> {
        let body = self
            .document
            .body()
            .ok_or_else(|| NavError::host("appendChild", "document has no body"))?;
        DomPanel::mount(&self.document, &body, spec, &self.highlight_class)
    }
}
