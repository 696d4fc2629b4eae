//! Error types shared by the core and the browser backend.

use thiserror::Error;

/// Failures surfaced by navigator operations.
///
/// Absence (no container, no messages) is never an error; it is modelled as
/// `None` or an empty list. These variants cover invalid input and host
/// failures that the orchestrator catches and logs at its boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("host operation `{op}` failed: {reason}")]
    Host { op: &'static str, reason: String },

    #[error("preference storage failed: {0}")]
    Storage(String),
}

impl NavError {
    /// Shorthand for a failed host (DOM) call
    pub fn host(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Host {
            op,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NavError>;

#[cfg(target_arch = "wasm32")]
impl From<NavError> for wasm_bindgen::JsValue {
    fn from(error: NavError) -> Self {
        wasm_bindgen::JsValue::from_str(&error.to_string())
    }
}
