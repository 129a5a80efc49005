//! Entity mention model and extraction.
//!
//! Extraction walks a parsed page in document order, registers every line in
//! the [`LineIndex`], and produces one [`EntityMention`] per tagged span. The
//! merge engine and the resolver then mutate mentions in place.

use crate::line_index::LineIndex;
use crate::pagexml::Page;
use crate::tag::EntityTag;
use crate::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference to a registered line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRef {
    /// Region the line belongs to.
    pub region_id: String,
    /// Line identifier within the region.
    pub line_id: String,
}

/// One contiguous span of a mention on a single line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionTarget {
    /// Line carrying the span.
    pub line_ref: LineRef,
    /// Start character offset (inclusive).
    pub start_offset: usize,
    /// End character offset (exclusive).
    pub end_offset: usize,
    /// Substring actually matched on the line.
    pub exact_text: String,
}

/// Typed resource class for identifying bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    /// schema:Person
    Person,
    /// schema:Place
    Place,
    /// schema:Organization
    Organization,
}

impl ResourceKind {
    /// Resource class for a tag, when the tag maps to one.
    #[must_use]
    pub fn from_tag(tag: EntityTag) -> Option<Self> {
        match tag {
            EntityTag::Person => Some(ResourceKind::Person),
            EntityTag::Place => Some(ResourceKind::Place),
            EntityTag::Organization => Some(ResourceKind::Organization),
            _ => None,
        }
    }

    /// Compact JSON-LD type term.
    #[must_use]
    pub fn schema_type(&self) -> &'static str {
        match self {
            ResourceKind::Person => "schema:Person",
            ResourceKind::Place => "schema:Place",
            ResourceKind::Organization => "schema:Organization",
        }
    }
}

/// Canonical identity attached to a resolved mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IdentifyingBody {
    /// A typed date literal (date-tagged mentions).
    DateLiteral(String),
    /// A plain literal expansion (abbreviation mentions).
    Expansion(String),
    /// A typed resource reference (person/place/organization mentions).
    Resource {
        /// Canonical external identifier.
        uri: String,
        /// Resource class.
        kind: ResourceKind,
        /// Curated or fetched label.
        label: Option<String>,
        /// Curated or fetched description.
        description: Option<String>,
        /// Latitude in degrees, when known.
        latitude: Option<f64>,
        /// Longitude in degrees, when known.
        longitude: Option<f64>,
    },
}

/// A tagged entity mention, possibly spanning several lines after merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMention {
    /// Entity tag kind.
    pub tag: EntityTag,
    /// Surface form; merged fragments join with a single space.
    pub text: String,
    /// Spans in document order; length 1 until the merge engine runs.
    pub targets: Vec<MentionTarget>,
    /// Annotation identifier; rewritten to the ledger id on resolution.
    pub mention_id: String,
    /// Canonical identity, attached by the resolver on a ledger hit.
    pub body: Option<IdentifyingBody>,
}

impl EntityMention {
    /// Create a single-target mention.
    #[must_use]
    pub fn new(
        tag: EntityTag,
        text: impl Into<String>,
        target: MentionTarget,
        mention_id: impl Into<String>,
    ) -> Self {
        Self {
            tag,
            text: text.into(),
            targets: vec![target],
            mention_id: mention_id.into(),
            body: None,
        }
    }

    /// First target in document order.
    #[must_use]
    pub fn first_target(&self) -> &MentionTarget {
        &self.targets[0]
    }

    /// Last target in document order.
    #[must_use]
    pub fn last_target(&self) -> &MentionTarget {
        &self.targets[self.targets.len() - 1]
    }
}

/// Mint a fresh annotation identifier under the configured prefix.
#[must_use]
pub fn mint_annotation_id(prefix: &str) -> String {
    format!("{prefix}annotations/{}", Uuid::new_v4())
}

/// Extract mentions from a parsed page, registering lines as a side effect.
///
/// Every line is registered in the index, tagged or not, so the merge engine
/// can reason about adjacency across untagged lines. Mentions come out in
/// document order: regions in reading order, lines within regions, spans by
/// start offset.
pub fn extract_mentions(
    page: &Page,
    index: &mut LineIndex,
    prefix: &str,
) -> Result<Vec<EntityMention>> {
    let mut mentions = Vec::new();

    for region in &page.regions {
        for line in &region.lines {
            index.register_line(&region.id, &line.id, &line.text)?;

            for span in &line.spans {
                let target = MentionTarget {
                    line_ref: LineRef {
                        region_id: region.id.clone(),
                        line_id: line.id.clone(),
                    },
                    start_offset: span.start,
                    end_offset: span.end,
                    exact_text: span.text.clone(),
                };
                mentions.push(EntityMention::new(
                    span.tag,
                    span.text.clone(),
                    target,
                    mint_annotation_id(prefix),
                ));
            }
        }
    }

    Ok(mentions)
}
