//! External knowledge-base lookups.
//!
//! Ledger rows that carry a `uri` but no `label` get enriched from the
//! knowledge base that owns the uri. Connectors implement [`KnowledgeBase`]
//! and are tried in order; results (including failures) are memoized per uri
//! for the lifetime of the run, so no uri is queried twice.
//!
//! Lookup failures never escape this module: a row that cannot be enriched
//! keeps its null `label` and the run continues.

mod sparql;
mod wkt;

pub use sparql::{AdamlinkKb, WikidataKb};
pub use wkt::centroid;

use crate::ledger::Ledger;
use crate::config::Config;
use crate::Result;
use std::collections::HashMap;

/// Coordinate precision: degrees rounded to 6 decimal places.
#[must_use]
pub fn round_degrees(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

/// A successful knowledge-base answer for one uri.
#[derive(Debug, Clone, PartialEq)]
pub struct KbRecord {
    /// Display label; required for a valid hit.
    pub label: String,
    /// Short description, when the knowledge base has one.
    pub description: Option<String>,
    /// Latitude in degrees, rounded.
    pub latitude: Option<f64>,
    /// Longitude in degrees, rounded.
    pub longitude: Option<f64>,
}

/// A queryable knowledge-base endpoint.
pub trait KnowledgeBase {
    /// Connector name, for log messages.
    fn name(&self) -> &str;

    /// Whether this connector owns the given uri.
    fn handles(&self, uri: &str) -> bool;

    /// Query the endpoint for one uri.
    fn lookup(&self, uri: &str) -> Result<KbRecord>;
}

/// Statistics from one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Rows that received a label this pass.
    pub enriched: usize,
    /// Rows skipped because they already carry a label.
    pub already_labeled: usize,
    /// Rows whose lookup failed or whose uri no connector owns.
    pub failed: usize,
}

/// Per-uri memoized lookup over a set of connectors.
pub struct LookupCache {
    connectors: Vec<Box<dyn KnowledgeBase>>,
    cache: HashMap<String, Option<KbRecord>>,
}

impl std::fmt::Debug for LookupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupCache")
            .field("connector_count", &self.connectors.len())
            .field("cached_uris", &self.cache.len())
            .finish()
    }
}

impl LookupCache {
    /// Create a cache over the given connectors.
    #[must_use]
    pub fn new(connectors: Vec<Box<dyn KnowledgeBase>>) -> Self {
        Self {
            connectors,
            cache: HashMap::new(),
        }
    }

    /// Cache with the production connectors: Wikidata and Adamlink.
    #[must_use]
    pub fn with_defaults(config: &Config) -> Self {
        Self::new(vec![
            Box::new(WikidataKb::new(config)),
            Box::new(AdamlinkKb::new(config)),
        ])
    }

    /// Add a connector to the end of the dispatch chain.
    pub fn add_connector(&mut self, connector: Box<dyn KnowledgeBase>) {
        self.connectors.push(connector);
    }

    /// Look up a uri, memoized. `None` means the uri could not be enriched
    /// this run (no owning connector, network failure, or empty result).
    pub fn lookup(&mut self, uri: &str) -> Option<KbRecord> {
        if let Some(cached) = self.cache.get(uri) {
            return cached.clone();
        }

        let result = match self.connectors.iter().find(|c| c.handles(uri)) {
            None => {
                log::warn!("no knowledge base owns uri {uri}");
                None
            }
            Some(connector) => match connector.lookup(uri) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("{} lookup failed for {uri}: {e}", connector.name());
                    None
                }
            },
        };

        self.cache.insert(uri.to_string(), result.clone());
        result
    }

    /// Enrich every ledger row that has a uri but no label.
    ///
    /// Rows already carrying a label are left untouched so curated values
    /// are never overwritten. Missing optional fields stay null.
    pub fn enrich(&mut self, ledger: &mut Ledger) -> EnrichStats {
        let mut stats = EnrichStats::default();

        for row in ledger.rows_mut() {
            let Some(uri) = row.uri.clone() else {
                continue;
            };
            if row.label.is_some() {
                stats.already_labeled += 1;
                continue;
            }

            match self.lookup(&uri) {
                Some(record) => {
                    row.label = Some(record.label);
                    row.description = record.description;
                    row.latitude = record.latitude;
                    row.longitude = record.longitude;
                    stats.enriched += 1;
                }
                None => stats.failed += 1,
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerRow;
    use crate::tag::EntityTag;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingKb {
        calls: Rc<Cell<usize>>,
        fail: bool,
    }

    impl KnowledgeBase for CountingKb {
        fn name(&self) -> &str {
            "counting"
        }
        fn handles(&self, uri: &str) -> bool {
            uri.contains("example.org")
        }
        fn lookup(&self, _uri: &str) -> Result<KbRecord> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(crate::Error::lookup("boom"));
            }
            Ok(KbRecord {
                label: "Amsterdam".to_string(),
                description: None,
                latitude: Some(round_degrees(52.372_777_9)),
                longitude: Some(round_degrees(4.893_611_2)),
            })
        }
    }

    fn cache_with(fail: bool) -> (LookupCache, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let kb = CountingKb {
            calls: Rc::clone(&calls),
            fail,
        };
        (LookupCache::new(vec![Box::new(kb)]), calls)
    }

    #[test]
    fn test_memoization_one_call_per_uri() {
        let (mut cache, calls) = cache_with(false);
        let uri = "https://example.org/places/amsterdam";
        assert!(cache.lookup(uri).is_some());
        assert!(cache.lookup(uri).is_some());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failures_are_memoized_too() {
        let (mut cache, calls) = cache_with(true);
        let uri = "https://example.org/places/amsterdam";
        assert!(cache.lookup(uri).is_none());
        assert!(cache.lookup(uri).is_none());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unowned_uri_is_none() {
        let (mut cache, calls) = cache_with(false);
        assert!(cache.lookup("https://other.test/x").is_none());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_enrich_skips_labeled_rows() {
        let (mut cache, calls) = cache_with(false);
        let mut ledger = Ledger::new();

        let mut labeled = LedgerRow::unresolved("a1", "d", EntityTag::Place, "s1", "Adam");
        labeled.uri = Some("https://example.org/a".to_string());
        labeled.label = Some("Curated".to_string());
        ledger.append(labeled).unwrap();

        let mut bare = LedgerRow::unresolved("a2", "d", EntityTag::Place, "s2", "Amsterdam");
        bare.uri = Some("https://example.org/b".to_string());
        ledger.append(bare).unwrap();

        let stats = cache.enrich(&mut ledger);
        assert_eq!(stats.already_labeled, 1);
        assert_eq!(stats.enriched, 1);
        assert_eq!(calls.get(), 1);

        let rows: Vec<_> = ledger.rows().collect();
        assert_eq!(rows[0].label.as_deref(), Some("Curated"));
        assert_eq!(rows[1].label.as_deref(), Some("Amsterdam"));
        assert_eq!(rows[1].latitude, Some(52.372_778));
    }

    #[test]
    fn test_enrich_shares_cache_across_rows() {
        let (mut cache, calls) = cache_with(false);
        let mut ledger = Ledger::new();
        for i in 0..3 {
            let mut row =
                LedgerRow::unresolved(format!("a{i}"), "d", EntityTag::Place, format!("s{i}"), "A");
            row.uri = Some("https://example.org/same".to_string());
            ledger.append(row).unwrap();
        }

        let stats = cache.enrich(&mut ledger);
        assert_eq!(stats.enriched, 3);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_round_degrees() {
        assert_eq!(round_degrees(52.372_777_949), 52.372_778);
        assert_eq!(round_degrees(4.9), 4.9);
    }
}
