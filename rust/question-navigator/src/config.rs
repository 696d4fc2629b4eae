//! Configuration types and defaults for the navigator
//!
//! Every tunable lives in [`NavigatorConfig`]. Defaults match the values the
//! extension ships with; partial JSON or JS objects fill the rest from
//! `Default` via `#[serde(default)]`.

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};

// =============================================================================
// Scroll Strategy
// =============================================================================

/// How the scroll controller positions a target message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollStrategy {
    /// Native smooth `scrollIntoView`, top-aligned. Works with any scroll container.
    #[default]
    IntoView,
    /// Window scroll to `scrollY + rect.top - offset`, smooth.
    Offset,
}

// =============================================================================
// Host Selectors
// =============================================================================

/// Structural selectors for the host page.
///
/// Data/role attributes only, never styling classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// User-authored message nodes
    pub user_message: String,
    /// Primary conversation container
    pub container: String,
    /// Landmark used when the primary container is absent
    pub container_fallback: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            user_message: r#"[data-message-author-role="user"]"#.to_string(),
            container: r#"[role="presentation"]"#.to_string(),
            container_fallback: "main".to_string(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Navigator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Quiet period before a burst of mutations triggers a refresh. Default: 300
    pub debounce_ms: u32,
    /// Header clearance for the offset scroll strategy. Default: 80
    pub scroll_offset_px: f64,
    /// Maximum characters shown per list item. Default: 80
    pub max_display_length: usize,
    /// Appended to truncated text. Default: "..."
    pub ellipsis: String,
    pub scroll_strategy: ScrollStrategy,
    /// Class applied to a message while highlighted
    pub highlight_class: String,
    /// Default: 2000
    pub highlight_duration_ms: u32,
    /// Delay between starting a scroll and highlighting. Default: 300
    pub scroll_settle_ms: u32,
    /// Delay between a URL change and re-initialization. Default: 500
    pub navigation_settle_ms: u32,
    /// Container lookup attempts. Default: 3
    pub max_retry_attempts: u32,
    /// First backoff delay; doubles per attempt. Default: 500
    pub retry_base_delay_ms: u32,
    pub selectors: Selectors,
    pub panel_title: String,
    pub empty_text: String,
    /// Default: 240
    pub panel_width_px: u32,
    /// Default: 180
    pub panel_min_width_px: u32,
    /// Default: 480
    pub panel_max_width_px: u32,
    /// Default: 10000
    pub panel_z_index: i32,
    /// Storage key for the persisted panel width
    pub width_storage_key: String,
    /// Prefix tag on every log line
    pub log_prefix: String,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            scroll_offset_px: 80.0,
            max_display_length: 80,
            ellipsis: "...".to_string(),
            scroll_strategy: ScrollStrategy::IntoView,
            highlight_class: "cgpt-nav-highlight".to_string(),
            highlight_duration_ms: 2000,
            scroll_settle_ms: 300,
            navigation_settle_ms: 500,
            max_retry_attempts: 3,
            retry_base_delay_ms: 500,
            selectors: Selectors::default(),
            panel_title: "Questions".to_string(),
            empty_text: "No questions yet".to_string(),
            panel_width_px: 240,
            panel_min_width_px: 180,
            panel_max_width_px: 480,
            panel_z_index: 10000,
            width_storage_key: "cgpt-nav-sidebar-width".to_string(),
            log_prefix: "[ChatGPT Navigator]".to_string(),
        }
    }
}

impl NavigatorConfig {
    /// Parse from JSON, filling missing fields from defaults, then validate
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| NavError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no navigator could run with
    pub fn validate(&self) -> Result<()> {
        let selectors = [
            ("selectors.user_message", &self.selectors.user_message),
            ("selectors.container", &self.selectors.container),
            ("selectors.container_fallback", &self.selectors.container_fallback),
        ];
        for (name, value) in selectors {
            if value.trim().is_empty() {
                return Err(NavError::InvalidConfig(format!("{} must not be empty", name)));
            }
        }
        if self.max_display_length == 0 {
            return Err(NavError::InvalidConfig(
                "max_display_length must be at least 1".into(),
            ));
        }
        if self.retry_base_delay_ms == 0 {
            return Err(NavError::InvalidConfig(
                "retry_base_delay_ms must be at least 1".into(),
            ));
        }
        if self.panel_min_width_px > self.panel_max_width_px {
            return Err(NavError::InvalidConfig(format!(
                "panel width range is inverted: {} > {}",
                self.panel_min_width_px, self.panel_max_width_px
            )));
        }
        if !(self.panel_min_width_px..=self.panel_max_width_px).contains(&self.panel_width_px) {
            return Err(NavError::InvalidConfig(format!(
                "panel_width_px {} is outside {}..={}",
                self.panel_width_px, self.panel_min_width_px, self.panel_max_width_px
            )));
        }
        Ok(())
    }
}
