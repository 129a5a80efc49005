//! Diary and entry metadata.
//!
//! Two CSV sheets describe the corpus: one row per diary (book, author,
//! holding archive) and one row per entry (manuscript, date, regions). They
//! become schema.org resources plus one classifying annotation per entry
//! binding the entry to its transcription regions.

use crate::config::Config;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// One diary record from `metadata_diaries.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiaryRecord {
    /// Stable diary identifier.
    pub identifier: String,
    /// Display name of the diary.
    pub name: String,
    /// Author display name.
    pub author: String,
    /// Author URI.
    #[serde(rename = "author_URI")]
    pub author_uri: String,
    /// Person the diary is about.
    pub about: String,
    /// URI of the person the diary is about.
    #[serde(rename = "about_URI")]
    pub about_uri: String,
    /// Holding archive name.
    pub archive_name: String,
    /// Collection within the archive.
    pub archive_collection: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Coverage years, "1940-1945" style.
    pub year: Option<String>,
}

/// One entry record from `metadata_entries.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryRecord {
    /// Stable entry identifier.
    pub identifier: String,
    /// Identifier of the owning diary.
    pub diary: String,
    /// Display name of the entry.
    pub name: String,
    /// Entry date, when known.
    pub date: Option<String>,
    /// Newline-separated region references ("file region" pairs).
    pub regions: String,
}

/// Load the diary sheet.
pub fn load_diaries(path: impl AsRef<Path>) -> Result<Vec<DiaryRecord>> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .map_err(|e| Error::invalid_input(format!("diaries sheet: {e}")))?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Load the entry sheet.
pub fn load_entries(path: impl AsRef<Path>) -> Result<Vec<EntryRecord>> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .map_err(|e| Error::invalid_input(format!("entries sheet: {e}")))?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

impl EntryRecord {
    /// Region keys referenced by this entry, in sheet order.
    ///
    /// The sheet writes "file region" pairs; keys use `#` as the separator,
    /// matching the qualified region identifiers in the annotations.
    #[must_use]
    pub fn region_keys(&self) -> Vec<String> {
        self.regions
            .lines()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| r.replace(' ', "#"))
            .collect()
    }
}

fn person(uri: &str, name: &str) -> Value {
    json!({
        "@id": uri,
        "@type": "Person",
        "name": name,
    })
}

fn book_resource(diary: &DiaryRecord, config: &Config) -> Value {
    let mut archive = Map::new();
    if let Some(uri) = config.archive_uris.get(&diary.archive_name) {
        archive.insert("@id".to_string(), json!(uri));
    }
    archive.insert("@type".to_string(), json!("ArchiveOrganization"));
    archive.insert("name".to_string(), json!(diary.archive_name));

    let collection = json!({
        "@type": ["Collection", "ArchiveComponent"],
        "name": diary.archive_collection,
        "holdingArchive": Value::Object(archive),
    });

    let mut book = Map::new();
    book.insert(
        "@context".to_string(),
        json!({ "@vocab": "https://schema.org/" }),
    );
    book.insert(
        "@id".to_string(),
        json!(format!("{}diaries/{}", config.prefix, diary.identifier)),
    );
    book.insert("@type".to_string(), json!("Book"));
    book.insert(
        "author".to_string(),
        person(&diary.author_uri, &diary.author),
    );
    book.insert("about".to_string(), person(&diary.about_uri, &diary.about));
    book.insert("name".to_string(), json!(diary.name));
    book.insert("isPartOf".to_string(), collection);
    if let Some(description) = &diary.description {
        if !description.is_empty() {
            book.insert("description".to_string(), json!(description));
        }
    }
    if let Some(year) = &diary.year {
        book.insert(
            "temporalCoverage".to_string(),
            json!(year.replace('-', "/")),
        );
    }
    Value::Object(book)
}

fn entry_annotation(
    entry: &EntryRecord,
    book_id: &str,
    book_name: &str,
    region_bodies: &HashMap<String, Vec<String>>,
    config: &Config,
) -> Value {
    let regions = entry.region_keys();
    let bodies: Vec<String> = regions
        .iter()
        .flat_map(|r| region_bodies.get(r).cloned().unwrap_or_default())
        .collect();

    let mut manuscript = Map::new();
    manuscript.insert(
        "@context".to_string(),
        json!({
            "@vocab": "https://schema.org/",
            "text": {
                "@id": "https://schema.org/text",
                "@type": "@id",
                "@container": "@list",
            },
        }),
    );
    let entry_id = format!("{}entries/{}", config.prefix, entry.identifier);
    manuscript.insert("@id".to_string(), json!(entry_id));
    manuscript.insert("@type".to_string(), json!("Manuscript"));
    manuscript.insert(
        "isPartOf".to_string(),
        json!({ "@id": book_id, "@type": "Book", "name": book_name }),
    );
    manuscript.insert("name".to_string(), json!(entry.name));
    if let Some(date) = &entry.date {
        manuscript.insert("dateCreated".to_string(), json!(date));
    }
    manuscript.insert("text".to_string(), json!(bodies));
    let manuscript = Value::Object(manuscript);

    json!({
        "@context": [crate::annotation::ANNO_CONTEXT],
        "id": format!(
            "{}annotations/entries/{}-annotation",
            config.prefix, entry.identifier
        ),
        "motivation": "classifying",
        "type": "Annotation",
        "body": [manuscript],
        "target": { "type": "oa:List", "items": regions },
    })
}

/// Shape all metadata resources: one Book per diary, then per entry a
/// Manuscript and its classifying annotation.
///
/// `region_bodies` maps qualified region keys to the textual-body ids their
/// lines produced during conversion.
#[must_use]
pub fn generate_metadata(
    diaries: &[DiaryRecord],
    entries: &[EntryRecord],
    region_bodies: &HashMap<String, Vec<String>>,
    config: &Config,
) -> Vec<Value> {
    let mut resources = Vec::new();

    for diary in diaries {
        let book = book_resource(diary, config);
        let book_id = book["@id"].as_str().unwrap_or_default().to_string();
        resources.push(book);

        for entry in entries.iter().filter(|e| e.diary == diary.identifier) {
            resources.push(entry_annotation(
                entry,
                &book_id,
                &diary.name,
                region_bodies,
                config,
            ));
        }
    }

    resources
}
