//! Per-document line registry.
//!
//! Built once while a document is parsed, read-only afterward. The merge
//! engine consults it for reading-order adjacency and line lengths.

use crate::{Error, Result};
use std::collections::HashMap;

/// One registered transcription line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpan {
    /// Region the line belongs to.
    pub region_id: String,
    /// Line identifier, unique within its region.
    pub line_id: String,
    /// Position of the line in its region's reading order.
    pub sequence_index: usize,
    /// Line text length in characters.
    pub text_length: usize,
}

/// Write-once index of a document's lines.
///
/// `sequence_index` is assigned per region, in registration order, which is
/// reading order for parsed documents.
#[derive(Debug, Default)]
pub struct LineIndex {
    lines: HashMap<(String, String), LineSpan>,
    next_index: HashMap<String, usize>,
}

impl LineIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a line, assigning it the next sequence index in its region.
    ///
    /// Returns the stored [`LineSpan`]. Re-registering a line is an input
    /// defect and fails with `InvalidInput`; the index is write-once.
    pub fn register_line(
        &mut self,
        region_id: impl Into<String>,
        line_id: impl Into<String>,
        text: &str,
    ) -> Result<&LineSpan> {
        let region_id = region_id.into();
        let line_id = line_id.into();
        let key = (region_id.clone(), line_id.clone());
        if self.lines.contains_key(&key) {
            return Err(Error::invalid_input(format!(
                "line {region_id}/{line_id} registered twice"
            )));
        }

        let next = self.next_index.entry(region_id.clone()).or_insert(0);
        let span = LineSpan {
            region_id,
            line_id,
            sequence_index: *next,
            text_length: text.chars().count(),
        };
        *next += 1;
        Ok(self.lines.entry(key).or_insert(span))
    }

    /// Reading-order position of a line within its region.
    pub fn sequence_position(&self, region_id: &str, line_id: &str) -> Result<usize> {
        self.get(region_id, line_id)
            .map(|span| span.sequence_index)
            .ok_or_else(|| Error::line_not_found(format!("{region_id}/{line_id}")))
    }

    /// Character length of a registered line.
    pub fn text_length(&self, region_id: &str, line_id: &str) -> Result<usize> {
        self.get(region_id, line_id)
            .map(|span| span.text_length)
            .ok_or_else(|| Error::line_not_found(format!("{region_id}/{line_id}")))
    }

    /// Look up a registered line.
    #[must_use]
    pub fn get(&self, region_id: &str, line_id: &str) -> Option<&LineSpan> {
        self.lines
            .get(&(region_id.to_string(), line_id.to_string()))
    }

    /// Number of registered lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no lines have been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
