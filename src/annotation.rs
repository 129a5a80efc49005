//! Web Annotation JSON-LD shaping.
//!
//! Region and line annotations carry the transcription and its geometry;
//! entity annotations carry mention spans plus the classifying concept and,
//! when resolved, the identifying body. Shapes follow the W3C Web Annotation
//! model with the IIIF text-granularity extension.

use crate::mention::{EntityMention, IdentifyingBody};
use crate::pagexml::{Line, Region};
use crate::tag::{EntityTag, RegionType};
use serde_json::{json, Map, Value};

/// W3C Web Annotation JSON-LD context.
pub const ANNO_CONTEXT: &str = "http://www.w3.org/ns/anno.jsonld";

/// IIIF text-granularity extension context.
pub const GRANULARITY_CONTEXT: &str =
    "http://iiif.io/api/extension/text-granularity/context.json";

/// skos:Concept resource for an entity tag.
#[must_use]
pub fn tag_concept(tag: EntityTag, prefix: &str) -> Value {
    json!({
        "id": format!("{prefix}tags/entities/{}", tag.as_label()),
        "type": "skos:Concept",
        "label": tag.concept_label(),
    })
}

/// skos:Concept resource for a region layout type.
#[must_use]
pub fn region_concept(region_type: RegionType, prefix: &str) -> Value {
    json!({
        "id": format!("{prefix}tags/regions/{}", region_type.as_label()),
        "type": "skos:Concept",
        "label": region_type.concept_label(),
    })
}

/// Scan resource identifier for a page file.
#[must_use]
pub fn scan_source(file_name: &str) -> String {
    format!("{file_name}-scan")
}

/// Qualified region identifier: `{file}#{region}`.
#[must_use]
pub fn region_key(file_name: &str, region_id: &str) -> String {
    format!("{file_name}#{region_id}")
}

/// Qualified line identifier: `{file}#{region}-{line}`.
#[must_use]
pub fn line_key(file_name: &str, region_id: &str, line_id: &str) -> String {
    format!("{file_name}#{region_id}-{line_id}")
}

/// Identifier of a line's textual body: `{file}#{region}-{line}-body`.
///
/// This is the same string the resolver uses as a ledger source key.
#[must_use]
pub fn line_body_id(file_name: &str, region_id: &str, line_id: &str) -> String {
    format!("{}-body", line_key(file_name, region_id, line_id))
}

fn fragment_target(
    prefix: &str,
    target_id: Option<String>,
    file_name: &str,
    quad: Option<&crate::pagexml::Quad>,
) -> Value {
    let mut target = Map::new();
    if let Some(id) = target_id {
        target.insert(
            "id".to_string(),
            json!(format!("{prefix}annotations/regions/{id}")),
        );
    }
    target.insert("type".to_string(), json!("SpecificResource"));
    target.insert("source".to_string(), json!(scan_source(file_name)));
    if let Some(quad) = quad {
        target.insert(
            "selector".to_string(),
            json!([{ "type": "FragmentSelector", "value": quad.xywh() }]),
        );
    }
    Value::Object(target)
}

/// Region annotation with its line annotation ids in `items`.
#[must_use]
pub fn region_annotation(prefix: &str, file_name: &str, region: &Region) -> Value {
    let rkey = region_key(file_name, &region.id);
    let items: Vec<String> = region
        .lines
        .iter()
        .map(|line| line_key(file_name, &region.id, &line.id))
        .collect();

    let body: Vec<Value> = region
        .region_type
        .map(|t| {
            vec![json!({
                "type": "SpecificResource",
                "source": region_concept(t, prefix),
                "purpose": "tagging",
            })]
        })
        .unwrap_or_default();

    json!({
        "@context": [ANNO_CONTEXT, GRANULARITY_CONTEXT],
        "id": format!("{prefix}annotations/regions/{rkey}"),
        "type": "Annotation",
        "textGranularity": "region",
        "items": items,
        "body": body,
        "target": fragment_target(prefix, Some(format!("{rkey}-target")), file_name, region.coords.as_ref()),
    })
}

/// Line annotation carrying the transcription as a supplementing body.
#[must_use]
pub fn line_annotation(prefix: &str, file_name: &str, region_id: &str, line: &Line) -> Value {
    let body_id = line_body_id(file_name, region_id, &line.id);

    json!({
        "@context": [ANNO_CONTEXT, GRANULARITY_CONTEXT],
        "id": format!("{prefix}annotations/lines/{}", line_key(file_name, region_id, &line.id)),
        "type": "Annotation",
        "textGranularity": "line",
        "body": [{
            "id": format!("{prefix}annotations/lines/{body_id}"),
            "type": "TextualBody",
            "value": line.text,
            "purpose": "supplementing",
        }],
        "target": fragment_target(prefix, None, file_name, line.coords.as_ref()),
    })
}

fn identifying_body(body: &IdentifyingBody) -> Value {
    match body {
        IdentifyingBody::DateLiteral(date) => json!({
            "type": "TextualBody",
            "purpose": "identifying",
            "value": date,
            "datatype": "xsd:date",
        }),
        IdentifyingBody::Expansion(expansion) => json!({
            "type": "TextualBody",
            "purpose": "identifying",
            "value": expansion,
        }),
        IdentifyingBody::Resource {
            uri,
            kind,
            label,
            description,
            latitude,
            longitude,
        } => {
            let mut source = Map::new();
            source.insert("id".to_string(), json!(uri));
            source.insert("type".to_string(), json!(kind.schema_type()));
            if let Some(label) = label {
                source.insert("label".to_string(), json!(label));
            }
            if let Some(description) = description {
                source.insert("description".to_string(), json!(description));
            }
            if let (Some(lat), Some(lon)) = (latitude, longitude) {
                source.insert(
                    "geo".to_string(),
                    json!({
                        "type": "schema:GeoCoordinates",
                        "latitude": lat,
                        "longitude": lon,
                    }),
                );
            }
            json!({
                "type": "SpecificResource",
                "purpose": "identifying",
                "source": Value::Object(source),
            })
        }
    }
}

fn mention_target(file_name: &str, mention: &EntityMention) -> Value {
    let mut targets: Vec<Value> = mention
        .targets
        .iter()
        .map(|t| {
            json!({
                "type": "SpecificResource",
                "source": line_body_id(file_name, &t.line_ref.region_id, &t.line_ref.line_id),
                "selector": [
                    { "type": "TextQuoteSelector", "exact": t.exact_text },
                    { "type": "TextPositionSelector", "start": t.start_offset, "end": t.end_offset },
                ],
            })
        })
        .collect();

    if targets.len() == 1 {
        targets.remove(0)
    } else {
        Value::Array(targets)
    }
}

/// Entity annotation for one (post-merge, post-resolve) mention.
#[must_use]
pub fn entity_annotation(prefix: &str, file_name: &str, mention: &EntityMention) -> Value {
    let mut body = vec![json!({
        "type": "SpecificResource",
        "source": tag_concept(mention.tag, prefix),
        "purpose": "classifying",
    })];
    if let Some(identity) = &mention.body {
        body.push(identifying_body(identity));
    }

    json!({
        "@context": ANNO_CONTEXT,
        "id": mention.mention_id,
        "type": "Annotation",
        "body": body,
        "target": mention_target(file_name, mention),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::{LineRef, MentionTarget, ResourceKind};
    use crate::pagexml::Quad;
    use crate::resolve::Resolver;

    fn sample_mention() -> EntityMention {
        EntityMention::new(
            EntityTag::Place,
            "Amsterdam",
            MentionTarget {
                line_ref: LineRef {
                    region_id: "r1".to_string(),
                    line_id: "l1".to_string(),
                },
                start_offset: 6,
                end_offset: 15,
                exact_text: "Amsterdam".to_string(),
            },
            "https://example.org/annotations/abc",
        )
    }

    #[test]
    fn test_entity_annotation_single_target() {
        let ann = entity_annotation("https://p/", "page.xml", &sample_mention());
        assert_eq!(ann["id"], "https://example.org/annotations/abc");
        assert_eq!(ann["body"][0]["purpose"], "classifying");
        assert_eq!(ann["body"][0]["source"]["id"], "https://p/tags/entities/place");
        assert_eq!(ann["target"]["source"], "page.xml#r1-l1-body");
        assert_eq!(ann["target"]["selector"][0]["exact"], "Amsterdam");
        assert_eq!(ann["target"]["selector"][1]["start"], 6);
    }

    #[test]
    fn test_entity_annotation_merged_targets_are_a_list() {
        let mut mention = sample_mention();
        mention.targets.push(MentionTarget {
            line_ref: LineRef {
                region_id: "r1".to_string(),
                line_id: "l2".to_string(),
            },
            start_offset: 0,
            end_offset: 3,
            exact_text: "dam".to_string(),
        });

        let ann = entity_annotation("https://p/", "page.xml", &mention);
        let targets = ann["target"].as_array().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[1]["source"], "page.xml#r1-l2-body");
    }

    #[test]
    fn test_identifying_resource_body() {
        let mut mention = sample_mention();
        mention.body = Some(IdentifyingBody::Resource {
            uri: "https://example.org/places/amsterdam".to_string(),
            kind: ResourceKind::Place,
            label: Some("Amsterdam".to_string()),
            description: None,
            latitude: Some(52.372778),
            longitude: Some(4.893611),
        });

        let ann = entity_annotation("https://p/", "page.xml", &mention);
        let identifying = &ann["body"][1];
        assert_eq!(identifying["purpose"], "identifying");
        assert_eq!(identifying["source"]["type"], "schema:Place");
        assert_eq!(identifying["source"]["geo"]["latitude"], 52.372778);
        assert!(identifying["source"].get("description").is_none());
    }

    #[test]
    fn test_date_literal_body() {
        let mut mention = sample_mention();
        mention.tag = EntityTag::Date;
        mention.body = Some(IdentifyingBody::DateLiteral("1942-05-01".to_string()));

        let ann = entity_annotation("https://p/", "page.xml", &mention);
        assert_eq!(ann["body"][1]["type"], "TextualBody");
        assert_eq!(ann["body"][1]["value"], "1942-05-01");
        assert_eq!(ann["body"][1]["datatype"], "xsd:date");
    }

    #[test]
    fn test_line_annotation_shape() {
        let line = Line {
            id: "l1".to_string(),
            text: "Jan ging naar huis".to_string(),
            coords: Quad::from_points("10,10 500,10 500,40 10,40"),
            reading_order: Some(0),
            spans: vec![],
        };
        let ann = line_annotation("https://p/", "page.xml", "r1", &line);
        assert_eq!(ann["textGranularity"], "line");
        assert_eq!(ann["body"][0]["id"], "https://p/annotations/lines/page.xml#r1-l1-body");
        assert_eq!(ann["body"][0]["value"], "Jan ging naar huis");
        assert_eq!(
            ann["target"]["selector"][0]["value"],
            "xywh=10,10,490,30"
        );
    }

    #[test]
    fn test_region_annotation_items_and_concept() {
        let region = Region {
            id: "r1".to_string(),
            region_type: Some(RegionType::Paragraph),
            coords: Quad::from_points("0,0 100,0 100,100 0,100"),
            reading_order: Some(0),
            lines: vec![Line {
                id: "l1".to_string(),
                text: String::new(),
                coords: None,
                reading_order: None,
                spans: vec![],
            }],
        };
        let ann = region_annotation("https://p/", "page.xml", &region);
        assert_eq!(ann["textGranularity"], "region");
        assert_eq!(ann["items"][0], "page.xml#r1-l1");
        assert_eq!(ann["body"][0]["source"]["id"], "https://p/tags/regions/paragraph");
        assert_eq!(ann["target"]["id"], "https://p/annotations/regions/page.xml#r1-target");
    }

    #[test]
    fn test_untyped_region_has_no_classifying_body() {
        let region = Region {
            id: "r1".to_string(),
            region_type: None,
            coords: None,
            reading_order: None,
            lines: vec![],
        };
        let ann = region_annotation("https://p/", "page.xml", &region);
        assert_eq!(ann["body"].as_array().unwrap().len(), 0);
        assert!(ann["target"].get("selector").is_none());
    }

    #[test]
    fn test_body_id_matches_resolver_source_key() {
        let mention = sample_mention();
        assert_eq!(
            line_body_id("page.xml", "r1", "l1"),
            Resolver::source_key("page.xml", mention.first_target())
        );
    }
}
