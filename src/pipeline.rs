//! Document conversion and batch driver.
//!
//! One document flows parse → extract → merge → resolve → shape. The batch
//! driver walks a corpus directory and keeps going past bad documents,
//! recording an explicit per-document outcome so the run report can state how
//! many failed instead of silently swallowing them.

use crate::annotation;
use crate::config::Config;
use crate::ledger::Ledger;
use crate::line_index::LineIndex;
use crate::mention::{self, EntityMention};
use crate::merge::merge_mentions;
use crate::pagexml;
use crate::resolve::Resolver;
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Counters for one converted document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    /// Regions parsed.
    pub regions: usize,
    /// Lines parsed.
    pub lines: usize,
    /// Mentions after merging.
    pub mentions: usize,
    /// Fragments folded away by the merge engine.
    pub merged_away: usize,
    /// Mentions that received an identifying body.
    pub resolved: usize,
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Document converted; counters attached.
    Converted(DocumentStats),
    /// Document skipped; reason attached.
    Failed(String),
}

/// Per-document record in the batch report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    /// Source file.
    pub path: PathBuf,
    /// Conversion outcome.
    pub outcome: DocumentOutcome,
}

/// Everything one document contributes to the run.
#[derive(Debug)]
pub struct DocumentOutput {
    /// Region and line annotations.
    pub textual: Vec<Value>,
    /// Entity annotations.
    pub entities: Vec<Value>,
    /// Textual-body ids per qualified region key, in document order.
    pub region_bodies: Vec<(String, Vec<String>)>,
    /// Counters.
    pub stats: DocumentStats,
}

/// Batch run report plus accumulated outputs.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-document outcomes, in processing order.
    pub documents: Vec<DocumentReport>,
    /// All region and line annotations.
    pub textual_annotations: Vec<Value>,
    /// All entity annotations.
    pub entity_annotations: Vec<Value>,
    /// Textual-body ids per qualified region key.
    pub region_bodies: HashMap<String, Vec<String>>,
}

impl BatchReport {
    /// Number of converted documents.
    #[must_use]
    pub fn converted(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, DocumentOutcome::Converted(_)))
            .count()
    }

    /// Number of failed documents.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.documents.len() - self.converted()
    }
}

/// The conversion pipeline: parse, extract, merge, resolve, shape.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    resolver: Resolver,
}

impl Pipeline {
    /// Build a pipeline from configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let resolver = Resolver::new(&config);
        Self { config, resolver }
    }

    /// The pipeline's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert one document, resolving mentions against the ledger.
    pub fn convert_document(
        &self,
        path: &Path,
        diary: &str,
        ledger: &mut Ledger,
    ) -> Result<DocumentOutput> {
        let page = pagexml::parse_file(path, &self.config.extract_tags)?;
        let file_name = page.file_name.clone();

        let mut index = LineIndex::new();
        let extracted = mention::extract_mentions(&page, &mut index, &self.config.prefix)?;
        let extracted_count = extracted.len();

        let merged = merge_mentions(extracted, &index);
        let merged_away = extracted_count - merged.len();

        let mut mentions: Vec<EntityMention> = Vec::with_capacity(merged.len());
        for m in merged {
            mentions.push(self.resolver.resolve(m, diary, &file_name, ledger)?);
        }
        let resolved = mentions.iter().filter(|m| m.body.is_some()).count();

        let mut textual = Vec::new();
        let mut region_bodies = Vec::new();
        for region in &page.regions {
            textual.push(annotation::region_annotation(
                &self.config.prefix,
                &file_name,
                region,
            ));
            let mut bodies = Vec::with_capacity(region.lines.len());
            for line in &region.lines {
                textual.push(annotation::line_annotation(
                    &self.config.prefix,
                    &file_name,
                    &region.id,
                    line,
                ));
                bodies.push(annotation::line_body_id(&file_name, &region.id, &line.id));
            }
            region_bodies.push((annotation::region_key(&file_name, &region.id), bodies));
        }

        let entities = mentions
            .iter()
            .map(|m| annotation::entity_annotation(&self.config.prefix, &file_name, m))
            .collect();

        Ok(DocumentOutput {
            textual,
            entities,
            region_bodies,
            stats: DocumentStats {
                regions: page.regions.len(),
                lines: page.line_count(),
                mentions: mentions.len(),
                merged_away,
                resolved,
            },
        })
    }

    /// Convert every PageXML file under `corpus`, continuing past failures.
    ///
    /// The diary identifier for ledger rows is the file's parent directory
    /// name; the corpus export lays out one diary per directory.
    pub fn run(&self, corpus: &Path, ledger: &mut Ledger) -> Result<BatchReport> {
        let pattern = corpus.join("**").join("*.xml");
        let pattern = pattern
            .to_str()
            .ok_or_else(|| crate::Error::invalid_input("corpus path is not valid UTF-8"))?;

        let mut report = BatchReport::default();

        for entry in glob::glob(pattern)
            .map_err(|e| crate::Error::invalid_input(format!("bad corpus pattern: {e}")))?
        {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("unreadable corpus entry: {e}");
                    continue;
                }
            };
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if name == "metadata.xml" || name == "mets.xml" {
                continue;
            }

            let diary = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();

            match self.convert_document(&path, &diary, ledger) {
                Ok(output) => {
                    report.textual_annotations.extend(output.textual);
                    report.entity_annotations.extend(output.entities);
                    for (key, bodies) in output.region_bodies {
                        report.region_bodies.entry(key).or_default().extend(bodies);
                    }
                    report.documents.push(DocumentReport {
                        path,
                        outcome: DocumentOutcome::Converted(output.stats),
                    });
                }
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                    report.documents.push(DocumentReport {
                        path,
                        outcome: DocumentOutcome::Failed(e.to_string()),
                    });
                }
            }
        }

        Ok(report)
    }
}
