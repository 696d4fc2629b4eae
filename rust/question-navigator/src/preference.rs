//! Persisted panel width.
//!
//! The only value that survives a page load. Stored as a decimal string;
//! anything unparsable or outside `[min, max]` is ignored on load.

use crate::config::NavigatorConfig;
use crate::error::Result;
use crate::host::PreferenceStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidthPreference {
    key: String,
    default_px: u32,
    min_px: u32,
    max_px: u32,
}

impl WidthPreference {
    pub fn new(config: &NavigatorConfig) -> Self {
        Self {
            key: config.width_storage_key.clone(),
            default_px: config.panel_width_px,
            min_px: config.panel_min_width_px,
            max_px: config.panel_max_width_px,
        }
    }

    /// Stored width if present and in range, else the default
    pub fn load(&self, store: &dyn PreferenceStore) -> u32 {
        store
            .get(&self.key)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|px| (self.min_px..=self.max_px).contains(px))
            .unwrap_or(self.default_px)
    }

    /// Clamp, persist, and return the width actually stored
    pub fn save(&self, store: &dyn PreferenceStore, width_px: u32) -> Result<u32> {
        let clamped = self.clamp(width_px);
        store.set(&self.key, &clamped.to_string())?;
        Ok(clamped)
    }

    pub fn clamp(&self, width_px: u32) -> u32 {
        width_px.clamp(self.min_px, self.max_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::MemoryStore;

    fn pref() -> WidthPreference {
        WidthPreference::new(&NavigatorConfig::default())
    }

    #[test]
    fn test_absent_uses_default() {
        let store = MemoryStore::default();
        assert_eq!(pref().load(&store), 240);
    }

    #[test]
    fn test_valid_value_loaded() {
        let store = MemoryStore::default();
        store.set("cgpt-nav-sidebar-width", "320").unwrap();
        assert_eq!(pref().load(&store), 320);
    }

    #[test]
    fn test_out_of_range_or_garbage_ignored() {
        let store = MemoryStore::default();
        for raw in ["90", "9000", "wide", "", "-5"] {
            store.set("cgpt-nav-sidebar-width", raw).unwrap();
            assert_eq!(pref().load(&store), 240, "raw = {:?}", raw);
        }
    }

    #[test]
    fn test_save_clamps() {
        let store = MemoryStore::default();
        assert_eq!(pref().save(&store, 1000).unwrap(), 480);
        assert_eq!(store.get("cgpt-nav-sidebar-width").as_deref(), Some("480"));
        assert_eq!(pref().save(&store, 10).unwrap(), 180);
        assert_eq!(pref().load(&store), 180);
    }

    #[test]
    fn test_save_failure_propagates() {
        let store = MemoryStore::default();
        store.set_fail_writes(true);
        assert!(pref().save(&store, 300).is_err());
    }
}
