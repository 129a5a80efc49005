//! SPARQL connectors for the supported knowledge bases.
//!
//! Both connectors ask for one uri per request and read the standard SPARQL
//! JSON results format. The query templates keep a `URIHIER` placeholder that
//! is substituted verbatim, matching the curation workflow's hand-run
//! queries.

use super::{round_degrees, wkt, KbRecord, KnowledgeBase};
use crate::config::Config;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const WIKIDATA_QUERY: &str = r#"
SELECT DISTINCT ?uri ?uriLabel ?uriDescription ?latitude ?longitude WHERE {
    ?uri wdt:P31 [] .

    OPTIONAL {
        ?uri p:P625 ?coordinate.
        ?coordinate ps:P625 ?coord.
        ?coordinate psv:P625 ?coordinate_node.
        ?coordinate_node wikibase:geoLongitude ?longitude.
        ?coordinate_node wikibase:geoLatitude ?latitude.
    }

    VALUES ?uri { <URIHIER> }

    SERVICE wikibase:label { bd:serviceParam wikibase:language "nl,en". }
}
"#;

const ADAMLINK_QUERY: &str = r#"
prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#>
prefix schema: <https://schema.org/>
prefix geo: <http://www.opengis.net/ont/geosparql#>
PREFIX bif: <http://www.openlinksw.com/schemas/bif#>
SELECT ?uri ?label ?description ?geometryWKT ?longitude ?latitude WHERE {
    ?uri a [] ;
        rdfs:label ?label .

    OPTIONAL {
        ?uri schema:description ?description .
    }

    OPTIONAL {
        ?uri schema:geoContains/geo:asWKT ?geometry .
        BIND(bif:st_x(?geometry) AS ?longitude)
        BIND(bif:st_y(?geometry) AS ?latitude)
    }

    OPTIONAL {
        ?uri geo:hasGeometry/geo:asWKT ?geometryWKT .
    }

    VALUES ?uri { <URIHIER> }
}
"#;

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Run a query and return the first result binding as a value map.
fn select_first(
    agent: &ureq::Agent,
    endpoint: &str,
    query: &str,
) -> Result<HashMap<String, String>> {
    let response = agent
        .get(endpoint)
        .query("query", query)
        .query("format", "json")
        .set("Accept", "application/sparql-results+json")
        .call()
        .map_err(|e| Error::lookup(format!("request to {endpoint} failed: {e}")))?;

    let parsed: SparqlResponse = response
        .into_json()
        .map_err(|e| Error::lookup(format!("bad response from {endpoint}: {e}")))?;

    let first = parsed
        .results
        .bindings
        .into_iter()
        .next()
        .ok_or_else(|| Error::lookup("empty result set"))?;

    Ok(first.into_iter().map(|(k, v)| (k, v.value)).collect())
}

fn parse_degrees(binding: &HashMap<String, String>, key: &str) -> Option<f64> {
    binding.get(key)?.parse::<f64>().ok().map(round_degrees)
}

fn agent_with_timeout(secs: u64) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(secs))
        .build()
}

/// Wikidata SPARQL connector.
pub struct WikidataKb {
    endpoint: String,
    agent: ureq::Agent,
}

impl WikidataKb {
    /// Build a connector from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: config.wikidata_endpoint.clone(),
            agent: agent_with_timeout(config.request_timeout_secs),
        }
    }
}

impl KnowledgeBase for WikidataKb {
    fn name(&self) -> &str {
        "wikidata"
    }

    fn handles(&self, uri: &str) -> bool {
        uri.contains("wikidata")
    }

    fn lookup(&self, uri: &str) -> Result<KbRecord> {
        let query = WIKIDATA_QUERY.replace("URIHIER", uri);
        let binding = select_first(&self.agent, &self.endpoint, &query)?;

        let label = binding
            .get("uriLabel")
            .cloned()
            .ok_or_else(|| Error::lookup(format!("no label for {uri}")))?;

        Ok(KbRecord {
            label,
            description: binding.get("uriDescription").cloned(),
            latitude: parse_degrees(&binding, "latitude"),
            longitude: parse_degrees(&binding, "longitude"),
        })
    }
}

/// Adamlink (ATM knowledge graph) SPARQL connector.
pub struct AdamlinkKb {
    endpoint: String,
    agent: ureq::Agent,
}

impl AdamlinkKb {
    /// Build a connector from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: config.adamlink_endpoint.clone(),
            agent: agent_with_timeout(config.request_timeout_secs),
        }
    }
}

impl KnowledgeBase for AdamlinkKb {
    fn name(&self) -> &str {
        "adamlink"
    }

    fn handles(&self, uri: &str) -> bool {
        uri.contains("adamlink")
    }

    fn lookup(&self, uri: &str) -> Result<KbRecord> {
        let query = ADAMLINK_QUERY.replace("URIHIER", uri);
        let binding = select_first(&self.agent, &self.endpoint, &query)?;

        let label = binding
            .get("label")
            .cloned()
            .ok_or_else(|| Error::lookup(format!("no label for {uri}")))?;

        let mut latitude = parse_degrees(&binding, "latitude");
        let mut longitude = parse_degrees(&binding, "longitude");

        // Streets and buildings come back as geometry only; centroid locally.
        if let Some((lon, lat)) = binding.get("geometryWKT").and_then(|g| wkt::centroid(g)) {
            latitude = Some(round_degrees(lat));
            longitude = Some(round_degrees(lon));
        }

        Ok(KbRecord {
            label,
            description: binding.get("description").cloned(),
            latitude,
            longitude,
        })
    }
}
