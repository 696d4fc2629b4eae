//! `PanelView` as a fixed `<aside>` appended to the page body

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlElement};

use super::document::js_error;
use crate::error::{NavError, Result};
use crate::host::{ItemSpec, PanelSpec, PanelView};

const SIDEBAR: &str = "cgpt-nav-sidebar";
const HEADER: &str = "cgpt-nav-header";
const LIST: &str = "cgpt-nav-list";
const ITEM: &str = "cgpt-nav-item";
const ITEM_SELECTED: &str = "cgpt-nav-item--selected";
const LABEL: &str = "cgpt-nav-label";
const TEXT: &str = "cgpt-nav-text";
const EMPTY: &str = "cgpt-nav-empty";

fn stylesheet(highlight_class: &str) -> String {
    format!(
        r#".{SIDEBAR} {{ position: fixed; top: 0; right: 0; height: 100vh; display: flex; flex-direction: column; box-sizing: border-box; background: #fff; border-left: 1px solid rgba(0, 0, 0, 0.1); font: 13px/1.4 system-ui, sans-serif; }}
.{HEADER} {{ padding: 12px 16px; font-weight: 600; border-bottom: 1px solid rgba(0, 0, 0, 0.1); }}
.{LIST} {{ list-style: none; margin: 0; padding: 4px 0; overflow-y: auto; flex: 1; }}
.{ITEM} {{ display: flex; gap: 8px; padding: 8px 16px; cursor: pointer; }}
.{ITEM}:hover {{ background: rgba(0, 0, 0, 0.05); }}
.{ITEM_SELECTED} {{ background: rgba(16, 163, 127, 0.12); }}
.{LABEL} {{ flex: none; font-weight: 600; color: #10a37f; }}
.{TEXT} {{ overflow: hidden; text-overflow: ellipsis; }}
.{EMPTY} {{ padding: 16px; color: #8e8ea0; }}
.{highlight_class} {{ outline: 2px solid #10a37f; outline-offset: 4px; transition: outline-color 0.3s; }}"#
    )
}

struct RenderedItem {
    identity: String,
    element: Element,
    _on_click: Closure<dyn FnMut(Event)>,
}

pub struct DomPanel {
    document: web_sys::Document,
    root: HtmlElement,
    list: Element,
    items: RefCell<Vec<RenderedItem>>,
}

impl DomPanel {
    pub fn mount(
        document: &web_sys::Document,
        body: &HtmlElement,
        spec: &PanelSpec,
        highlight_class: &str,
    ) -> Result<Self> {
        let root: HtmlElement = document
            .create_element("aside")
            .map_err(js_error("createElement"))?
            .dyn_into()
            .map_err(|_| NavError::host("createElement", "aside is not an HtmlElement"))?;
        root.set_class_name(SIDEBAR);

        let style = root.style();
        style
            .set_property("width", &format!("{}px", spec.width_px))
            .map_err(js_error("style"))?;
        style
            .set_property("z-index", &spec.z_index.to_string())
            .map_err(js_error("style"))?;

        let css = document.create_element("style").map_err(js_error("createElement"))?;
        css.set_text_content(Some(&stylesheet(highlight_class)));
        root.append_child(&css).map_err(js_error("appendChild"))?;

        let header = document.create_element("header").map_err(js_error("createElement"))?;
        header.set_class_name(HEADER);
        header.set_text_content(Some(&spec.title));
        root.append_child(&header).map_err(js_error("appendChild"))?;

        let list = document.create_element("ul").map_err(js_error("createElement"))?;
        list.set_class_name(LIST);
        root.append_child(&list).map_err(js_error("appendChild"))?;

        body.append_child(&root).map_err(js_error("appendChild"))?;

        Ok(Self {
            document: document.clone(),
            root,
            list,
            items: RefCell::new(Vec::new()),
        })
    }

    fn span(&self, class: &str, text: &str) -> Result<Element> {
        let span = self
            .document
            .create_element("span")
            .map_err(js_error("createElement"))?;
        span.set_class_name(class);
        span.set_text_content(Some(text));
        Ok(span)
    }
}

impl PanelView for DomPanel {
    fn clear(&self) {
        self.list.set_inner_html("");
        self.items.borrow_mut().clear();
    }

    fn show_empty(&self, message: &str) -> Result<()> {
        let empty = self
            .document
            .create_element("li")
            .map_err(js_error("createElement"))?;
        empty.set_class_name(EMPTY);
        empty.set_text_content(Some(message));
        self.list
            .append_child(&empty)
            .map_err(js_error("appendChild"))?;
        Ok(())
    }

    fn append_item(&self, item: ItemSpec<'_>, on_activate: Box<dyn Fn()>) -> Result<()> {
        let element = self
            .document
            .create_element("li")
            .map_err(js_error("createElement"))?;
        element.set_class_name(ITEM);
        element
            .set_attribute("data-question-id", item.identity)
            .map_err(js_error("setAttribute"))?;
        element
            .set_attribute("title", item.title)
            .map_err(js_error("setAttribute"))?;
        element
            .append_child(&self.span(LABEL, item.label)?)
            .map_err(js_error("appendChild"))?;
        element
            .append_child(&self.span(TEXT, item.text)?)
            .map_err(js_error("appendChild"))?;

        let on_click = Closure::<dyn FnMut(Event)>::new(move |_event: Event| on_activate());
        element
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .map_err(js_error("addEventListener"))?;
        self.list
            .append_child(&element)
            .map_err(js_error("appendChild"))?;

        self.items.borrow_mut().push(RenderedItem {
            identity: item.identity.to_string(),
            element,
            _on_click: on_click,
        });
        Ok(())
    }

    fn set_item_selected(&self, identity: &str, selected: bool) -> Result<()> {
        for item in self.items.borrow().iter().filter(|i| i.identity == identity) {
            item.element
                .class_list()
                .toggle_with_force(ITEM_SELECTED, selected)
                .map_err(js_error("classList.toggle"))?;
        }
        Ok(())
    }

    fn set_width(&self, width_px: u32) -> Result<()> {
        self.root
            .style()
            .set_property("width", &format!("{}px", width_px))
            .map_err(js_error("style"))
    }

    fn unmount(&self) {
        self.root.remove();
        self.items.borrow_mut().clear();
    }
}
