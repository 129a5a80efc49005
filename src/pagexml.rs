//! PageXML ingest.
//!
//! Parses one transcription file into regions and lines, carrying coordinate
//! geometry, reading order, and the inline entity tags embedded in `custom`
//! attributes (`person {offset:3; length:5;}` syntax). Offsets in the custom
//! syntax are character offsets into the line's Unicode text; the parser
//! normalizes each span to half-open `[start, end)` form.

use crate::tag::{EntityTag, RegionType};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Axis-aligned bounding box derived from a `Coords` polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Quad {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width.
    pub w: i64,
    /// Height.
    pub h: i64,
}

impl Quad {
    /// Parse a PageXML `points` attribute ("x1,y1 x2,y2 ...") into a box.
    ///
    /// Returns `None` when the attribute holds no well-formed point.
    #[must_use]
    pub fn from_points(points: &str) -> Option<Self> {
        let mut min_x = i64::MAX;
        let mut min_y = i64::MAX;
        let mut max_x = i64::MIN;
        let mut max_y = i64::MIN;
        let mut seen = false;

        for pair in points.split_whitespace() {
            let (x, y) = pair.split_once(',')?;
            let x: i64 = x.trim().parse().ok()?;
            let y: i64 = y.trim().parse().ok()?;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            seen = true;
        }

        if !seen {
            return None;
        }
        Some(Quad {
            x: min_x,
            y: min_y,
            w: max_x - min_x,
            h: max_y - min_y,
        })
    }

    /// Media-fragment form used by FragmentSelector values.
    #[must_use]
    pub fn xywh(&self) -> String {
        format!("xywh={},{},{},{}", self.x, self.y, self.w, self.h)
    }
}

/// One tagged span inside a line, in half-open character offsets.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaggedSpan {
    /// Entity tag kind.
    pub tag: EntityTag,
    /// Matched substring of the line text.
    pub text: String,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
}

/// One transcribed line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Line identifier, unique within its region.
    pub id: String,
    /// Unicode transcription text.
    pub text: String,
    /// Bounding box, when coordinates were present.
    pub coords: Option<Quad>,
    /// Reading-order index from the `custom` attribute, when present.
    pub reading_order: Option<usize>,
    /// Entity spans parsed from the `custom` attribute, by start offset.
    pub spans: Vec<TaggedSpan>,
}

/// One layout region and its lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Region identifier, stable per document.
    pub id: String,
    /// Layout classification, when tagged.
    pub region_type: Option<RegionType>,
    /// Bounding box, when coordinates were present.
    pub coords: Option<Quad>,
    /// Reading-order index from the `custom` attribute, when present.
    pub reading_order: Option<usize>,
    /// Lines in reading order.
    pub lines: Vec<Line>,
}

/// A parsed transcription page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Source file name (with extension); used in derived identifiers.
    pub file_name: String,
    /// Regions in reading order.
    pub regions: Vec<Region>,
}

impl Page {
    /// Total number of lines across regions.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.regions.iter().map(|r| r.lines.len()).sum()
    }
}

// Custom attribute syntax: `name {key:value; key:value;} name {...}`.
static CUSTOM_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z][A-Za-z0-9_-]*)\s*\{([^}]*)\}").expect("valid regex"));

/// Parse a `custom` attribute into (name, parameters) items, in order.
fn parse_custom(custom: &str) -> Vec<(String, HashMap<String, String>)> {
    CUSTOM_ITEM
        .captures_iter(custom)
        .map(|cap| {
            let name = cap[1].to_string();
            let params = cap[2]
                .split(';')
                .filter_map(|kv| {
                    let (k, v) = kv.split_once(':')?;
                    Some((k.trim().to_string(), v.trim().to_string()))
                })
                .collect();
            (name, params)
        })
        .collect()
}

fn reading_order_of(items: &[(String, HashMap<String, String>)]) -> Option<usize> {
    items
        .iter()
        .find(|(name, _)| name == "readingOrder")
        .and_then(|(_, params)| params.get("index"))
        .and_then(|v| v.parse().ok())
}

fn region_type_of(items: &[(String, HashMap<String, String>)]) -> Option<RegionType> {
    items
        .iter()
        .find(|(name, _)| name == "structure")
        .and_then(|(_, params)| params.get("type"))
        .and_then(|t| RegionType::from_label(t))
}

/// Extract tagged spans for a line once its text is known.
///
/// Spans with offsets outside the line text are dropped with a warning; the
/// transcription platform occasionally emits stale offsets after edits.
fn spans_of(
    items: &[(String, HashMap<String, String>)],
    text: &str,
    extract_tags: &std::collections::HashSet<EntityTag>,
    line_id: &str,
) -> Vec<TaggedSpan> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();

    for (name, params) in items {
        let Some(tag) = EntityTag::from_label(name) else {
            continue;
        };
        if !extract_tags.contains(&tag) {
            continue;
        }
        let (Some(offset), Some(length)) = (
            params.get("offset").and_then(|v| v.parse::<usize>().ok()),
            params.get("length").and_then(|v| v.parse::<usize>().ok()),
        ) else {
            continue;
        };
        let end = offset + length;
        if offset >= chars.len() || end > chars.len() {
            log::warn!("line {line_id}: {tag} span [{offset},{end}) outside text, dropped");
            continue;
        }
        spans.push(TaggedSpan {
            tag,
            text: chars[offset..end].iter().collect(),
            start: offset,
            end,
        });
    }

    spans.sort_by_key(|s| (s.start, s.end));
    spans
}

fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let Some(attr) = e
        .try_get_attribute(name)
        .map_err(quick_xml::Error::from)?
    else {
        return Ok(None);
    };
    Ok(Some(attr.unescape_value()?.into_owned()))
}

struct LineBuilder {
    id: String,
    custom: Vec<(String, HashMap<String, String>)>,
    coords: Option<Quad>,
    text: String,
}

struct RegionBuilder {
    id: String,
    region_type: Option<RegionType>,
    reading_order: Option<usize>,
    coords: Option<Quad>,
    lines: Vec<Line>,
}

/// Parse a PageXML document from a string.
pub fn parse_str(
    xml: &str,
    file_name: impl Into<String>,
    extract_tags: &std::collections::HashSet<EntityTag>,
) -> Result<Page> {
    let mut reader = Reader::from_str(xml);

    let mut regions: Vec<Region> = Vec::new();
    let mut current_region: Option<RegionBuilder> = None;
    let mut current_line: Option<LineBuilder> = None;
    let mut in_unicode = false;
    let mut saw_page = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"Page" => saw_page = true,
                b"TextRegion" => {
                    let id = attr(&e, "id")?
                        .ok_or_else(|| Error::parse("TextRegion without id"))?;
                    let custom = attr(&e, "custom")?.unwrap_or_default();
                    let items = parse_custom(&custom);
                    current_region = Some(RegionBuilder {
                        id,
                        region_type: region_type_of(&items),
                        reading_order: reading_order_of(&items),
                        coords: None,
                        lines: Vec::new(),
                    });
                }
                b"TextLine" if current_region.is_some() => {
                    let id = attr(&e, "id")?
                        .ok_or_else(|| Error::parse("TextLine without id"))?;
                    let custom = attr(&e, "custom")?.unwrap_or_default();
                    current_line = Some(LineBuilder {
                        id,
                        custom: parse_custom(&custom),
                        coords: None,
                        text: String::new(),
                    });
                }
                b"Coords" => {
                    let quad = attr(&e, "points")?.and_then(|p| Quad::from_points(&p));
                    if let Some(line) = current_line.as_mut() {
                        line.coords = quad;
                    } else if let Some(region) = current_region.as_mut() {
                        if region.coords.is_none() {
                            region.coords = quad;
                        }
                    }
                }
                b"Unicode" if current_line.is_some() => in_unicode = true,
                _ => {}
            },
            // Coords is normally self-closing; other elements arriving empty
            // carry no content worth keeping.
            Event::Empty(e) => match e.name().as_ref() {
                b"Page" => saw_page = true,
                b"Coords" => {
                    let quad = attr(&e, "points")?.and_then(|p| Quad::from_points(&p));
                    if let Some(line) = current_line.as_mut() {
                        line.coords = quad;
                    } else if let Some(region) = current_region.as_mut() {
                        if region.coords.is_none() {
                            region.coords = quad;
                        }
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_unicode => {
                if let Some(line) = current_line.as_mut() {
                    line.text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"Unicode" => in_unicode = false,
                b"TextLine" => {
                    if let (Some(builder), Some(region)) =
                        (current_line.take(), current_region.as_mut())
                    {
                        let reading_order = reading_order_of(&builder.custom);
                        let spans =
                            spans_of(&builder.custom, &builder.text, extract_tags, &builder.id);
                        region.lines.push(Line {
                            id: builder.id,
                            text: builder.text,
                            coords: builder.coords,
                            reading_order,
                            spans,
                        });
                    }
                }
                b"TextRegion" => {
                    if let Some(mut builder) = current_region.take() {
                        // Reading order wins over document order when tagged.
                        let mut order: Vec<usize> = (0..builder.lines.len()).collect();
                        order.sort_by_key(|&i| builder.lines[i].reading_order.unwrap_or(i));
                        builder.lines = order
                            .into_iter()
                            .map(|i| builder.lines[i].clone())
                            .collect();
                        regions.push(Region {
                            id: builder.id,
                            region_type: builder.region_type,
                            coords: builder.coords,
                            reading_order: builder.reading_order,
                            lines: builder.lines,
                        });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_page && regions.is_empty() {
        return Err(Error::parse("no Page or TextRegion elements found"));
    }

    let mut order: Vec<usize> = (0..regions.len()).collect();
    order.sort_by_key(|&i| regions[i].reading_order.unwrap_or(i));
    let regions = order.into_iter().map(|i| regions[i].clone()).collect();

    Ok(Page {
        file_name: file_name.into(),
        regions,
    })
}

/// Parse a PageXML file from disk.
pub fn parse_file(
    path: impl AsRef<Path>,
    extract_tags: &std::collections::HashSet<EntityTag>,
) -> Result<Page> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::invalid_input(format!("bad path: {}", path.display())))?
        .to_string();
    parse_str(&xml, file_name, extract_tags)
}
