//! Extractor: user-message scanning
//!
//! Every call re-queries the live document; nothing is cached between passes.
//! Identity is ordinal-based (`question-<n>`), so it is only stable within a
//! single pass: when an earlier message disappears, later ones shift down.

use std::rc::Rc;

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::{NavigatorConfig, Selectors};
use crate::error::Result;
use crate::host::Document;

// =============================================================================
// Entity
// =============================================================================

/// One extracted user message.
///
/// `source` is a non-owning handle into the host page and may go stale as
/// soon as the host mutates; check `Document::is_connected` before use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity<N> {
    /// `question-<ordinal>`
    pub identity: String,
    /// Zero-based position in document order
    pub ordinal: usize,
    /// `Q<ordinal + 1>`
    pub label: String,
    /// Text with line breaks replaced by spaces
    pub full_text: String,
    /// `full_text` truncated for the list
    pub display_text: String,
    #[serde(skip)]
    pub source: N,
}

pub fn identity_for(ordinal: usize) -> String {
    format!("question-{}", ordinal)
}

pub fn label_for(ordinal: usize) -> String {
    format!("Q{}", ordinal + 1)
}

// =============================================================================
// Text Formatting
// =============================================================================

/// Replace every line break (`\r\n`, `\r`, `\n`) with a single space
pub fn normalize_line_breaks(text: &str) -> String {
    if !text.contains(['\n', '\r']) {
        return text.to_string();
    }
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Normalize line breaks, then truncate to `max_length` characters plus `ellipsis`.
///
/// Characters are extended grapheme clusters, so an emoji or a combining
/// sequence is never cut in half. Text of exactly `max_length` characters is
/// returned without an ellipsis.
pub fn format_display_text(text: &str, max_length: usize, ellipsis: &str) -> String {
    let normalized = normalize_line_breaks(text);
    match normalized.grapheme_indices(true).nth(max_length) {
        None => normalized,
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + ellipsis.len());
            out.push_str(&normalized[..cut]);
            out.push_str(ellipsis);
            out
        }
    }
}

/// Character count as used by [`format_display_text`]
pub fn display_length(text: &str) -> usize {
    text.graphemes(true).count()
}

// =============================================================================
// Extractor
// =============================================================================

/// Scans the document for user messages
pub struct Extractor<D: Document> {
    document: Rc<D>,
    selectors: Selectors,
    max_display_length: usize,
    ellipsis: String,
}

impl<D: Document> Extractor<D> {
    pub fn new(document: Rc<D>, config: &NavigatorConfig) -> Self {
        Self {
            document,
            selectors: config.selectors.clone(),
            max_display_length: config.max_display_length,
            ellipsis: config.ellipsis.clone(),
        }
    }

    /// All user messages in document order. No matches is an empty list.
    pub fn extract(&self) -> Result<Vec<Entity<D::Node>>> {
        let nodes = self.document.query_all(&self.selectors.user_message)?;
        Ok(nodes
            .into_iter()
            .enumerate()
            .map(|(ordinal, node)| {
                let full_text = normalize_line_breaks(&self.document.text_content(&node));
                let display_text =
                    format_display_text(&full_text, self.max_display_length, &self.ellipsis);
                Entity {
                    identity: identity_for(ordinal),
                    ordinal,
                    label: label_for(ordinal),
                    full_text,
                    display_text,
                    source: node,
                }
            })
            .collect())
    }

    /// Conversation container: primary selector, then the fallback landmark
    pub fn find_container(&self) -> Result<Option<D::Node>> {
        if let Some(primary) = self.document.query(&self.selectors.container)? {
            return Ok(Some(primary));
        }
        self.document.query(&self.selectors.container_fallback)
    }
}
