//! Browser backend (wasm32 only)
//!
//! - `document.rs` - `BrowserDocument`: DOM queries, classes, scrolling, `MutationObserver`
//! - `panel.rs` - `DomPanel`: the fixed side panel
//! - `scheduler.rs` - `BrowserScheduler`: cancelable `setTimeout` via gloo-timers
//! - `storage.rs` - `LocalStore`: `localStorage` preferences
//! - `console.rs` - `ConsoleSink`: log lines to the browser console
//! - `bindings.rs` - `QuestionNavigator` class, `boot` and `teardown` entry points

mod bindings;
mod console;
mod document;
mod panel;
mod scheduler;
mod storage;

pub use bindings::{boot, teardown, QuestionNavigator};
pub use console::ConsoleSink;
pub use document::{BrowserDocument, BrowserWatch};
pub use panel::DomPanel;
pub use scheduler::BrowserScheduler;
pub use storage::LocalStore;
