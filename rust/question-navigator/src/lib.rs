//! Question Navigator: live outline of a chat conversation
//!
//! A Rust/WASM side panel that lists every user message of the current
//! conversation as `Q1..Qn`, keeps the list in sync while the page streams and
//! re-renders, and scrolls to and flashes a message when its item is clicked.
//!
//! # Architecture
//!
//! ## Core (host-agnostic, tested natively)
//! - `extract.rs` - Extractor: user-message scanning and display-text formatting
//! - `sync/debounce.rs` - Debounced: trailing-edge, cancelable invoker
//! - `sync/monitor.rs` - ChangeMonitor: debounced subtree mutation watching
//! - `panel.rs` - Panel: list rendering and selection state
//! - `highlight.rs` - Highlighter: scroll-then-flash with exclusive highlight
//! - `preference.rs` - WidthPreference: persisted panel width
//! - `navigator/` - Navigator: container retry, lifecycle, navigation re-init
//!
//! ## Seams
//! - `host/` - Document, Scheduler, PanelView, PreferenceStore traits
//! - `logging.rs` - prefixed Logger with a catch-and-log boundary
//! - `config.rs` - NavigatorConfig (serde, defaults, validation)
//!
//! ## Browser (wasm32)
//! - `web/` - DOM, timers, localStorage, console, and the JS bindings
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { boot } from 'question-navigator';
//!
//! await init();
//! boot({ max_display_length: 60 });
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod highlight;
pub mod host;
pub mod logging;
pub mod navigator;
pub mod panel;
pub mod preference;
pub mod sync;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{NavigatorConfig, ScrollStrategy, Selectors};
pub use error::{NavError, Result};
pub use extract::{format_display_text, Entity, Extractor};
pub use navigator::{Navigator, Phase, SyncStats};

#[cfg(target_arch = "wasm32")]
pub use web::{boot, teardown, QuestionNavigator};

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Install the panic hook so panics reach the browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("question-navigator v{}", env!("CARGO_PKG_VERSION"))
}
