//! Identity resolution against the curation ledger.
//!
//! Each post-merge mention either adopts a canonical identity from the ledger
//! or is recorded there for curation. Misses are the normal path on a first
//! pass over new material, so they log a notice and keep going.

use crate::config::Config;
use crate::ledger::{Ledger, LedgerRow};
use crate::mention::{EntityMention, IdentifyingBody, MentionTarget, ResourceKind};
use crate::tag::EntityTag;
use crate::Result;
use std::collections::HashSet;

/// Attaches canonical identities to mentions via the ledger.
#[derive(Debug, Clone)]
pub struct Resolver {
    skip: HashSet<EntityTag>,
}

impl Resolver {
    /// Build a resolver from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            skip: config.resolver_skip.clone(),
        }
    }

    /// Ledger source key for a mention: the line body it starts on.
    ///
    /// Keyed by line, not by span, since one line may host several distinct
    /// mention texts.
    #[must_use]
    pub fn source_key(file_name: &str, target: &MentionTarget) -> String {
        format!(
            "{file_name}#{}-{}-body",
            target.line_ref.region_id, target.line_ref.line_id
        )
    }

    /// Resolve one mention against the ledger.
    ///
    /// Skipped tags pass through untouched. A ledger hit rewrites the mention
    /// id to the row's stable `annotation_id` and, when the row carries an
    /// identifier, attaches the identifying body for the tag. A miss appends
    /// an unresolved row and returns the mention unchanged.
    pub fn resolve(
        &self,
        mut mention: EntityMention,
        diary: &str,
        file_name: &str,
        ledger: &mut Ledger,
    ) -> Result<EntityMention> {
        if self.skip.contains(&mention.tag) {
            return Ok(mention);
        }

        let source = Self::source_key(file_name, mention.first_target());

        let Some(row) = ledger.find(&source, mention.tag, &mention.text) else {
            log::info!(
                "ledger miss: ({source}, {}, {:?}), recorded for curation",
                mention.tag,
                mention.text
            );
            ledger.append(LedgerRow::unresolved(
                mention.mention_id.clone(),
                diary,
                mention.tag,
                source,
                mention.text.clone(),
            ))?;
            return Ok(mention);
        };

        // Stable ids across runs, even when extraction order shifts.
        mention.mention_id = row.annotation_id.clone();
        mention.body = match row.identifier() {
            None => None,
            Some(identifier) => match mention.tag {
                EntityTag::Date => Some(IdentifyingBody::DateLiteral(identifier.to_string())),
                EntityTag::Abbreviation => {
                    Some(IdentifyingBody::Expansion(identifier.to_string()))
                }
                tag => ResourceKind::from_tag(tag).map(|kind| IdentifyingBody::Resource {
                    uri: identifier.to_string(),
                    kind,
                    label: row.label.clone(),
                    description: row.description.clone(),
                    latitude: row.latitude,
                    longitude: row.longitude,
                }),
            },
        };
        Ok(mention)
    }
}
