//! Entity tag and region type vocabularies.
//!
//! Tags follow the transcription platform's custom-tag names. Five of them
//! carry instance identity and go through the resolver (person, place,
//! organization, date, abbrev); `speech` is a closed-vocabulary marker; the
//! rest describe transcription structure or damage and never resolve.

use serde::{Deserialize, Serialize};

/// Entity tag kinds found in transcription custom attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityTag {
    /// Person name
    Person,
    /// Place name
    Place,
    /// Organization name
    Organization,
    /// Date expression
    Date,
    /// Abbreviation
    #[serde(rename = "abbrev")]
    Abbreviation,
    /// Direct speech marker (closed vocabulary, no instance identity)
    Speech,
    /// Structural marker
    Structure,
    /// Later addition to the text
    #[serde(rename = "add")]
    Addition,
    /// Unclear transcription
    Unclear,
    /// Redacted/blackened text
    Blackening,
    /// Gap in the source
    Gap,
    /// Transcribed as written, including errors
    Sic,
}

impl EntityTag {
    /// All tag kinds, in concept-table order.
    pub const ALL: [EntityTag; 12] = [
        EntityTag::Structure,
        EntityTag::Date,
        EntityTag::Person,
        EntityTag::Place,
        EntityTag::Organization,
        EntityTag::Addition,
        EntityTag::Unclear,
        EntityTag::Blackening,
        EntityTag::Speech,
        EntityTag::Abbreviation,
        EntityTag::Gap,
        EntityTag::Sic,
    ];

    /// Custom-attribute name for this tag.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            EntityTag::Person => "person",
            EntityTag::Place => "place",
            EntityTag::Organization => "organization",
            EntityTag::Date => "date",
            EntityTag::Abbreviation => "abbrev",
            EntityTag::Speech => "speech",
            EntityTag::Structure => "structure",
            EntityTag::Addition => "add",
            EntityTag::Unclear => "unclear",
            EntityTag::Blackening => "blackening",
            EntityTag::Gap => "gap",
            EntityTag::Sic => "sic",
        }
    }

    /// Parse from a custom-attribute name.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "person" => Some(EntityTag::Person),
            "place" => Some(EntityTag::Place),
            "organization" => Some(EntityTag::Organization),
            "date" => Some(EntityTag::Date),
            "abbrev" => Some(EntityTag::Abbreviation),
            "speech" => Some(EntityTag::Speech),
            "structure" => Some(EntityTag::Structure),
            "add" => Some(EntityTag::Addition),
            "unclear" => Some(EntityTag::Unclear),
            "blackening" => Some(EntityTag::Blackening),
            "gap" => Some(EntityTag::Gap),
            "sic" => Some(EntityTag::Sic),
            _ => None,
        }
    }

    /// Human-readable concept label ("Person", "Page number" style casing).
    #[must_use]
    pub fn concept_label(&self) -> &'static str {
        match self {
            EntityTag::Person => "Person",
            EntityTag::Place => "Place",
            EntityTag::Organization => "Organization",
            EntityTag::Date => "Date",
            EntityTag::Abbreviation => "Abbrev",
            EntityTag::Speech => "Speech",
            EntityTag::Structure => "Structure",
            EntityTag::Addition => "Add",
            EntityTag::Unclear => "Unclear",
            EntityTag::Blackening => "Blackening",
            EntityTag::Gap => "Gap",
            EntityTag::Sic => "Sic",
        }
    }

    /// Structural-noise tags describe the transcription, not an entity.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            EntityTag::Structure
                | EntityTag::Addition
                | EntityTag::Unclear
                | EntityTag::Blackening
                | EntityTag::Gap
                | EntityTag::Sic
        )
    }

    /// Closed-vocabulary tags are fixed taxonomy terms with no instance
    /// identity behind them.
    #[must_use]
    pub const fn is_closed_vocabulary(&self) -> bool {
        matches!(self, EntityTag::Speech)
    }
}

impl std::fmt::Display for EntityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// Region type classification from the transcription layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionType {
    /// Heading region
    Heading,
    /// Body paragraph
    Paragraph,
    /// Caption under a visual
    Caption,
    /// Drawing, photograph, or other non-text content
    Visual,
    /// Marginal note
    Marginalia,
    /// Page number
    PageNumber,
}

impl RegionType {
    /// Layout type name as it appears in the region `custom` attribute.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            RegionType::Heading => "heading",
            RegionType::Paragraph => "paragraph",
            RegionType::Caption => "caption",
            RegionType::Visual => "visual",
            RegionType::Marginalia => "marginalia",
            RegionType::PageNumber => "page-number",
        }
    }

    /// Parse from a layout type name.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "heading" => Some(RegionType::Heading),
            "paragraph" => Some(RegionType::Paragraph),
            "caption" => Some(RegionType::Caption),
            "visual" => Some(RegionType::Visual),
            "marginalia" => Some(RegionType::Marginalia),
            "page-number" => Some(RegionType::PageNumber),
            _ => None,
        }
    }

    /// Human-readable concept label.
    #[must_use]
    pub fn concept_label(&self) -> &'static str {
        match self {
            RegionType::Heading => "Heading",
            RegionType::Paragraph => "Paragraph",
            RegionType::Caption => "Caption",
            RegionType::Visual => "Visual",
            RegionType::Marginalia => "Marginalia",
            RegionType::PageNumber => "Page number",
        }
    }
}

impl std::fmt::Display for RegionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}
