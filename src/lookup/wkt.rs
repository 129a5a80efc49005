//! Centroid extraction from WKT geometry literals.
//!
//! Adamlink serves street and building geometries as WKT. Only the centroid
//! is needed here, so this is a deliberately small reader: POINT, LINESTRING,
//! POLYGON, and MULTIPOLYGON, exterior rings only. Holes are ignored; the
//! corpus geometries are simple outlines.

use once_cell::sync::Lazy;
use regex::Regex;

// Innermost parenthesized groups are coordinate lists ("x y, x y, ...").
static RING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^()]+)\)").expect("valid regex"));

/// Centroid of a WKT literal as `(longitude, latitude)`, i.e. `(x, y)`.
///
/// Returns `None` for unsupported or malformed geometry.
#[must_use]
pub fn centroid(wkt: &str) -> Option<(f64, f64)> {
    let trimmed = wkt.trim();
    let keyword: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    let rings: Vec<Vec<(f64, f64)>> = RING
        .captures_iter(trimmed)
        .filter_map(|cap| parse_ring(&cap[1]))
        .collect();

    match keyword.as_str() {
        "POINT" => rings.first().and_then(|r| r.first().copied()),
        "LINESTRING" => rings.first().map(|r| vertex_mean(r)),
        "POLYGON" => rings.first().map(|r| ring_centroid(r)),
        // Ring captures include holes; negligible for the simple outlines
        // this feeds on, see module docs.
        "MULTIPOLYGON" => weighted_centroid(&rings),
        _ => None,
    }
}

fn parse_ring(list: &str) -> Option<Vec<(f64, f64)>> {
    let mut ring = Vec::new();
    for pair in list.split(',') {
        let mut nums = pair.split_whitespace();
        let x: f64 = nums.next()?.parse().ok()?;
        let y: f64 = nums.next()?.parse().ok()?;
        ring.push((x, y));
    }
    if ring.is_empty() {
        None
    } else {
        Some(ring)
    }
}

fn vertex_mean(ring: &[(f64, f64)]) -> (f64, f64) {
    let n = ring.len() as f64;
    let (sx, sy) = ring
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    (sx / n, sy / n)
}

/// Shoelace area of a closed ring (signed).
fn ring_area(ring: &[(f64, f64)]) -> f64 {
    let mut area = 0.0;
    for i in 0..ring.len() {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % ring.len()];
        area += x1 * y2 - x2 * y1;
    }
    area / 2.0
}

/// Area centroid of one ring, with a vertex-mean fallback for degenerate
/// (zero-area) rings.
fn ring_centroid(ring: &[(f64, f64)]) -> (f64, f64) {
    let area = ring_area(ring);
    if area.abs() < 1e-12 {
        return vertex_mean(ring);
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..ring.len() {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % ring.len()];
        let cross = x1 * y2 - x2 * y1;
        cx += (x1 + x2) * cross;
        cy += (y1 + y2) * cross;
    }
    (cx / (6.0 * area), cy / (6.0 * area))
}

fn weighted_centroid(rings: &[Vec<(f64, f64)>]) -> Option<(f64, f64)> {
    if rings.is_empty() {
        return None;
    }

    let mut total = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for ring in rings {
        let area = ring_area(ring).abs();
        let (x, y) = ring_centroid(ring);
        total += area;
        cx += x * area;
        cy += y * area;
    }

    if total < 1e-12 {
        // All rings degenerate; average their vertex means.
        let means: Vec<(f64, f64)> = rings.iter().map(|r| vertex_mean(r)).collect();
        return Some(vertex_mean(&means));
    }
    Some((cx / total, cy / total))
}
