//! `PreferenceStore` over `window.localStorage`

use crate::error::{NavError, Result};
use crate::host::PreferenceStore;

/// Missing or blocked storage reads as empty; writes report why they failed
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

impl LocalStore {
    fn storage() -> Result<web_sys::Storage> {
        let window = web_sys::window().ok_or_else(|| NavError::Storage("window is unavailable".into()))?;
        window
            .local_storage()
            .map_err(|_| NavError::Storage("failed to access local storage".into()))?
            .ok_or_else(|| NavError::Storage("local storage is unavailable".into()))
    }
}

impl PreferenceStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().ok()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|_| NavError::Storage(format!("failed to persist {}", key)))
    }
}
