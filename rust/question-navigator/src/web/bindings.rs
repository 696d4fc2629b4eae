//! JavaScript surface
//!
//! ```javascript,ignore
//! import init, { QuestionNavigator, boot, teardown } from 'question-navigator';
//!
//! await init();
//!
//! // Content script: start once the page is ready
//! boot({ debounce_ms: 250 });
//!
//! // Or drive it by hand
//! const nav = new QuestionNavigator({ scroll_strategy: 'offset' });
//! nav.start();
//! console.log(nav.questions()); // [{ identity: 'question-0', label: 'Q1', ... }]
//! console.log(nav.stats());     // { refreshes, initializations, ... }
//! nav.setPanelWidth(320);
//! nav.shutdown();
//!
//! // Release whatever `boot` started
//! teardown();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Event;

use super::{BrowserDocument, BrowserScheduler, ConsoleSink, LocalStore};
use crate::config::NavigatorConfig;
use crate::error::NavError;
use crate::navigator::Navigator;

#[wasm_bindgen]
pub struct QuestionNavigator {
    navigator: Navigator<BrowserDocument>,
}

#[wasm_bindgen]
impl QuestionNavigator {
    /// `config` is a partial `NavigatorConfig` object; missing fields use defaults
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<QuestionNavigator, JsValue> {
        let config: NavigatorConfig = if config.is_undefined() || config.is_null() {
            NavigatorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?
        };

        let document = Rc::new(BrowserDocument::new(&config.highlight_class)?);
        let navigator = Navigator::new(
            document,
            BrowserScheduler::new(),
            Rc::new(LocalStore),
            Rc::new(ConsoleSink),
            config,
        )?;
        Ok(Self { navigator })
    }

    /// Initialize and follow in-app navigation
    pub fn start(&self) {
        self.navigator.start();
    }

    /// Re-scan the conversation now
    pub fn refresh(&self) {
        self.navigator.refresh();
    }

    /// Rendered questions, without their element handles
    pub fn questions(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.navigator.entities()).unwrap_or(JsValue::NULL)
    }

    pub fn stats(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.navigator.stats()).unwrap_or(JsValue::NULL)
    }

    /// Scroll to and highlight a question as if its item was clicked
    pub fn select(&self, identity: &str) -> bool {
        self.navigator.select(identity)
    }

    #[wasm_bindgen(getter)]
    pub fn selected(&self) -> Option<String> {
        self.navigator.selected()
    }

    #[wasm_bindgen(js_name = isInitialized)]
    pub fn is_initialized(&self) -> bool {
        self.navigator.is_initialized()
    }

    /// Clamp, persist, and apply; returns the width actually applied
    #[wasm_bindgen(js_name = setPanelWidth)]
    pub fn set_panel_width(&self, width_px: u32) -> u32 {
        self.navigator.set_panel_width(width_px)
    }

    #[wasm_bindgen(js_name = panelWidth)]
    pub fn panel_width(&self) -> u32 {
        self.navigator.panel_width()
    }

    pub fn shutdown(&self) {
        self.navigator.shutdown();
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<QuestionNavigator>> = const { RefCell::new(None) };
    static READY_HANDLER: RefCell<Option<Closure<dyn FnMut(Event)>>> = const { RefCell::new(None) };
}

fn start_active() {
    ACTIVE.with(|slot| {
        if let Some(active) = slot.borrow().as_ref() {
            active.start();
        }
    });
}

/// Content-script entry point.
///
/// Replaces any navigator a previous `boot` created, then starts it when the
/// DOM is ready (immediately if it already is).
#[wasm_bindgen]
pub fn boot(config: JsValue) -> Result<(), JsValue> {
    let navigator = QuestionNavigator::new(config)?;
    // Dropping the previous navigator shuts it down
    let previous = ACTIVE.with(|slot| slot.borrow_mut().replace(navigator));
    drop(previous);

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| NavError::host("document", "window has no document"))?;

    if document.ready_state() != "loading" {
        start_active();
        return Ok(());
    }

    let handler = Closure::<dyn FnMut(Event)>::new(|_event: Event| start_active());
    document.add_event_listener_with_callback("DOMContentLoaded", handler.as_ref().unchecked_ref())?;
    let stale = READY_HANDLER.with(|slot| slot.borrow_mut().replace(handler));
    if let Some(stale) = stale {
        forget_ready_handler(&document, stale)?;
    }
    Ok(())
}

/// Shut down and release the navigator `boot` created, if any
#[wasm_bindgen]
pub fn teardown() -> Result<(), JsValue> {
    let active = ACTIVE.with(|slot| slot.borrow_mut().take());
    drop(active);

    let pending = READY_HANDLER.with(|slot| slot.borrow_mut().take());
    match (pending, web_sys::window().and_then(|w| w.document())) {
        (Some(handler), Some(document)) => forget_ready_handler(&document, handler),
        _ => Ok(()),
    }
}

fn forget_ready_handler(
    document: &web_sys::Document,
    handler: Closure<dyn FnMut(Event)>,
) -> Result<(), JsValue> {
    document.remove_event_listener_with_callback("DOMContentLoaded", handler.as_ref().unchecked_ref())
}
