//! The curation ledger.
//!
//! A flat CSV table mapping mention occurrences to canonical identifiers.
//! Loaded whole at run start, appended to for unresolved mentions, and
//! rewritten atomically at run end. Between runs, curators fill in `uri` (or
//! `date` for date mentions) by hand; the `checked` column is theirs and is
//! never interpreted here.

use crate::tag::EntityTag;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One ledger row, keyed by `(source, tag, normalized text)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Annotation identifier; stable across runs once recorded.
    #[serde(rename = "annotation")]
    pub annotation_id: String,
    /// Diary the mention belongs to.
    pub diary: String,
    /// Entity tag kind.
    pub tag: EntityTag,
    /// Source key: the line body the mention starts on.
    pub source: String,
    /// Mention surface form.
    pub text: String,
    /// Canonical external identifier, curated.
    pub uri: Option<String>,
    /// Date literal, curated; the fallback identifier for date mentions.
    pub date: Option<String>,
    /// Label fetched from the knowledge base (or curated).
    pub label: Option<String>,
    /// Description fetched from the knowledge base.
    pub description: Option<String>,
    /// Latitude in degrees, 6 decimal places.
    pub latitude: Option<f64>,
    /// Longitude in degrees, 6 decimal places.
    pub longitude: Option<f64>,
    /// Free-form curation flag; preserved verbatim.
    pub checked: Option<String>,
}

impl LedgerRow {
    /// A fresh unresolved row for a ledger miss.
    #[must_use]
    pub fn unresolved(
        annotation_id: impl Into<String>,
        diary: impl Into<String>,
        tag: EntityTag,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            annotation_id: annotation_id.into(),
            diary: diary.into(),
            tag,
            source: source.into(),
            text: text.into(),
            uri: None,
            date: None,
            label: None,
            description: None,
            latitude: None,
            longitude: None,
            checked: None,
        }
    }

    /// The identifier the resolver should use: `uri`, else `date`.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.uri.as_deref().or(self.date.as_deref())
    }
}

/// Normalize mention text for ledger comparison.
///
/// Folds OCR ligatures, drops soft hyphens, collapses whitespace runs, and
/// removes `"- "` line-wrap hyphenation so "Amster- dam" and "Amsterdam"
/// compare equal.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{00AD}' => {}
            'ﬀ' => folded.push_str("ff"),
            'ﬁ' => folded.push_str("fi"),
            'ﬂ' => folded.push_str("fl"),
            'ﬃ' => folded.push_str("ffi"),
            'ﬄ' => folded.push_str("ffl"),
            'ﬅ' | 'ﬆ' => folded.push_str("st"),
            _ => folded.push(ch),
        }
    }
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace("- ", "")
}

type LedgerKey = (String, EntityTag, String);

fn key_of(source: &str, tag: EntityTag, text: &str) -> LedgerKey {
    (source.to_string(), tag, normalize_text(text))
}

/// In-memory ledger with a uniqueness index over `(source, tag, text)`.
#[derive(Debug, Default)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
    index: HashMap<LedgerKey, usize>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a ledger from CSV. A missing file yields an empty ledger.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("ledger {} not found, starting empty", path.display());
            return Ok(Self::new());
        }

        let mut reader = csv::Reader::from_path(path)?;
        let mut ledger = Self::new();
        for row in reader.deserialize() {
            let row: LedgerRow = row?;
            ledger.append(row)?;
        }
        Ok(ledger)
    }

    /// Persist the ledger: write a sibling temp file, then rename over the
    /// target so a crash never leaves a truncated ledger behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("csv.tmp");

        let mut writer = csv::Writer::from_path(&tmp)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        drop(writer);

        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Look up a row by source key, tag, and normalized text.
    #[must_use]
    pub fn find(&self, source: &str, tag: EntityTag, text: &str) -> Option<&LedgerRow> {
        self.index
            .get(&key_of(source, tag, text))
            .map(|&i| &self.rows[i])
    }

    /// Append a row, enforcing key uniqueness.
    ///
    /// A duplicate key is fatal: it means extraction or merging produced the
    /// same mention twice, and silently deduplicating would hide that defect.
    pub fn append(&mut self, row: LedgerRow) -> Result<()> {
        let key = key_of(&row.source, row.tag, &row.text);
        if self.index.contains_key(&key) {
            return Err(Error::DuplicateLedgerKey(format!(
                "({}, {}, {:?})",
                row.source, row.tag, row.text
            )));
        }
        self.index.insert(key, self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &LedgerRow> {
        self.rows.iter()
    }

    /// Mutable rows, for enrichment.
    ///
    /// Callers must not change the key columns (`source`, `tag`, `text`); the
    /// uniqueness index is built over them.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut LedgerRow> {
        self.rows.iter_mut()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the ledger holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with neither `uri` nor `date`: still waiting on curation.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.rows.iter().filter(|r| r.identifier().is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  Jan \t van\nGalen "), "Jan van Galen");
    }

    #[test]
    fn test_normalize_strips_wrap_hyphen() {
        assert_eq!(normalize_text("Amster- dam"), "Amsterdam");
        assert_eq!(normalize_text("Amster-\ndam"), "Amsterdam");
    }

    #[test]
    fn test_normalize_folds_ligatures_and_soft_hyphen() {
        assert_eq!(normalize_text("o\u{00AD}ﬃcieel"), "officieel");
        assert_eq!(normalize_text("ﬁets"), "fiets");
    }

    #[test]
    fn test_find_is_normalization_aware() {
        let mut ledger = Ledger::new();
        ledger
            .append(LedgerRow::unresolved("a1", "d1", EntityTag::Place, "s1", "Amsterdam"))
            .unwrap();

        assert!(ledger.find("s1", EntityTag::Place, "Amster- dam").is_some());
        assert!(ledger.find("s1", EntityTag::Place, "Amsterdam ").is_some());
        assert!(ledger.find("s1", EntityTag::Person, "Amsterdam").is_none());
        assert!(ledger.find("s2", EntityTag::Place, "Amsterdam").is_none());
    }

    #[test]
    fn test_duplicate_key_is_fatal() {
        let mut ledger = Ledger::new();
        ledger
            .append(LedgerRow::unresolved("a1", "d1", EntityTag::Place, "s1", "Amsterdam"))
            .unwrap();
        let err = ledger
            .append(LedgerRow::unresolved("a2", "d1", EntityTag::Place, "s1", "Amster- dam"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateLedgerKey(_)));
    }

    #[test]
    fn test_same_line_different_texts_coexist() {
        // A line may host several distinct mention texts.
        let mut ledger = Ledger::new();
        ledger
            .append(LedgerRow::unresolved("a1", "d1", EntityTag::Person, "s1", "Jan"))
            .unwrap();
        ledger
            .append(LedgerRow::unresolved("a2", "d1", EntityTag::Person, "s1", "Piet"))
            .unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_identifier_prefers_uri() {
        let mut row = LedgerRow::unresolved("a", "d", EntityTag::Date, "s", "1 mei");
        assert_eq!(row.identifier(), None);
        row.date = Some("1942-05-01".to_string());
        assert_eq!(row.identifier(), Some("1942-05-01"));
        row.uri = Some("https://example.org/x".to_string());
        assert_eq!(row.identifier(), Some("https://example.org/x"));
    }
}
