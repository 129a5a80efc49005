//! Pipeline configuration.
//!
//! Everything that was ambient state in earlier generations of the pipeline
//! (identifier prefix, tag tables, endpoint addresses) is an explicit value
//! here, passed into the components that need it.

use crate::tag::EntityTag;
use std::collections::{HashMap, HashSet};

/// Default identifier prefix for minted annotation URIs.
pub const DEFAULT_PREFIX: &str =
    "https://id.amsterdamtimemachine.nl/ark:/81741/amsterdam-diaries/";

/// Default Wikidata SPARQL endpoint.
pub const WIKIDATA_ENDPOINT: &str = "https://query.wikidata.org/sparql";

/// Default Adamlink knowledge-graph SPARQL endpoint.
pub const ADAMLINK_ENDPOINT: &str =
    "https://api.lod.uba.uva.nl/datasets/ATM/ATM-KG/services/ATM-KG/sparql";

/// Read-only pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix under which all annotation identifiers are minted.
    pub prefix: String,
    /// Tags extracted from transcriptions; spans with other tags are ignored.
    pub extract_tags: HashSet<EntityTag>,
    /// Tags the resolver passes through without touching the ledger.
    pub resolver_skip: HashSet<EntityTag>,
    /// Wikidata SPARQL endpoint.
    pub wikidata_endpoint: String,
    /// Adamlink SPARQL endpoint.
    pub adamlink_endpoint: String,
    /// Per-request timeout for external lookups, in seconds.
    pub request_timeout_secs: u64,
    /// Known archive homepage URIs, keyed by archive name as it appears in
    /// the diary metadata.
    pub archive_uris: HashMap<String, String>,
}

impl Config {
    /// Configuration matching the production corpus conventions.
    #[must_use]
    pub fn new() -> Self {
        let extract_tags = [
            EntityTag::Date,
            EntityTag::Person,
            EntityTag::Place,
            EntityTag::Organization,
            EntityTag::Speech,
            EntityTag::Abbreviation,
        ]
        .into_iter()
        .collect();

        // Structural noise plus closed-vocabulary tags never resolve.
        let resolver_skip = EntityTag::ALL
            .into_iter()
            .filter(|t| t.is_structural() || t.is_closed_vocabulary())
            .collect();

        let archive_uris = [
            ("Verzetsmuseum Amsterdam", "https://www.verzetsmuseum.org/"),
            ("Stadsarchief Amsterdam", "https://archief.amsterdam/"),
            ("Atria", "https://atria.nl/"),
            ("Crescas Joods Educatief Centrum", "https://www.crescas.nl/"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            extract_tags,
            resolver_skip,
            wikidata_endpoint: WIKIDATA_ENDPOINT.to_string(),
            adamlink_endpoint: ADAMLINK_ENDPOINT.to_string(),
            request_timeout_secs: 30,
            archive_uris,
        }
    }

    /// Override the identifier prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Override the lookup request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
