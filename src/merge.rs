//! Mention merge engine.
//!
//! Line-based transcription splits a mention that wraps onto the next line
//! into two tagged spans. The merge engine fuses such fragments back into one
//! mention with multiple targets.
//!
//! The pass runs right to left over adjacent pairs so that a mention spanning
//! three or more consecutive lines folds in a single scan: each fold makes the
//! merged mention the candidate for the next earlier neighbour. The output is
//! a fresh sequence, never in-place deletion during forward iteration.

use crate::line_index::LineIndex;
use crate::mention::EntityMention;

/// Fuse line-wrapped mention fragments.
///
/// Two adjacent mentions `(earlier, later)` merge iff:
/// 1. their tags are identical,
/// 2. `earlier`'s last target ends exactly at its line's text length,
/// 3. `later`'s first target starts at offset 0 of its line,
/// 4. both lines are in the same region and `later`'s line immediately
///    follows `earlier`'s in reading order.
///
/// Mentions referencing lines missing from the index never merge; malformed
/// adjacency is "no merge", not an error.
#[must_use]
pub fn merge_mentions(mentions: Vec<EntityMention>, index: &LineIndex) -> Vec<EntityMention> {
    let mut out_rev: Vec<EntityMention> = Vec::with_capacity(mentions.len());
    let mut later: Option<EntityMention> = None;

    for earlier in mentions.into_iter().rev() {
        match later.take() {
            None => later = Some(earlier),
            Some(l) => {
                if should_merge(&earlier, &l, index) {
                    // The fused mention becomes the candidate for the next
                    // earlier neighbour, so longer chains fold in one pass.
                    later = Some(fuse(earlier, l));
                } else {
                    out_rev.push(l);
                    later = Some(earlier);
                }
            }
        }
    }
    if let Some(l) = later {
        out_rev.push(l);
    }

    out_rev.reverse();
    out_rev
}

fn should_merge(earlier: &EntityMention, later: &EntityMention, index: &LineIndex) -> bool {
    if earlier.tag != later.tag {
        return false;
    }
    // Zero-length text never participates: an empty mention on an empty line
    // would satisfy "ends at text_length" vacuously.
    if earlier.text.is_empty() || later.text.is_empty() {
        return false;
    }

    let (Some(last), Some(first)) = (earlier.targets.last(), later.targets.first()) else {
        return false;
    };
    if last.end_offset <= last.start_offset || first.end_offset <= first.start_offset {
        return false;
    }
    if last.line_ref.region_id != first.line_ref.region_id {
        return false;
    }

    let region = &last.line_ref.region_id;
    let Ok(length) = index.text_length(region, &last.line_ref.line_id) else {
        return false;
    };
    if length == 0 {
        return false;
    }

    // End-of-line evidence on the earlier fragment, line-initial evidence on
    // the later one. Offsets are half-open, so "runs to end" is == length.
    if last.end_offset != length || first.start_offset != 0 {
        return false;
    }

    let (Ok(pos_last), Ok(pos_first)) = (
        index.sequence_position(region, &last.line_ref.line_id),
        index.sequence_position(region, &first.line_ref.line_id),
    ) else {
        return false;
    };
    pos_first == pos_last + 1
}

fn fuse(mut earlier: EntityMention, later: EntityMention) -> EntityMention {
    earlier.text.push(' ');
    earlier.text.push_str(&later.text);
    earlier.targets.extend(later.targets);
    earlier
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::mention::{LineRef, MentionTarget};
    use crate::tag::EntityTag;
    use proptest::prelude::*;

    /// Build a region of `n` lines, each "wordXX" (6 chars), with one place
    /// mention per line covering a suffix chosen by the strategy.
    fn setup(starts: &[usize]) -> (LineIndex, Vec<EntityMention>) {
        let mut index = LineIndex::new();
        let mut mentions = Vec::new();
        for (i, &start) in starts.iter().enumerate() {
            let line_id = format!("l{i}");
            let text = "abcdef";
            index.register_line("r", &line_id, text).unwrap();
            let start = start.min(5);
            mentions.push(EntityMention::new(
                EntityTag::Place,
                &text[start..],
                MentionTarget {
                    line_ref: LineRef {
                        region_id: "r".to_string(),
                        line_id,
                    },
                    start_offset: start,
                    end_offset: 6,
                    exact_text: text[start..].to_string(),
                },
                format!("id{i}"),
            ));
        }
        (index, mentions)
    }

    proptest! {
        #[test]
        fn merge_never_grows_sequence(starts in prop::collection::vec(0usize..6, 0..12)) {
            let (index, mentions) = setup(&starts);
            let before = mentions.len();
            let merged = merge_mentions(mentions, &index);
            prop_assert!(merged.len() <= before);
        }

        #[test]
        fn merge_conserves_targets(starts in prop::collection::vec(0usize..6, 0..12)) {
            let (index, mentions) = setup(&starts);
            let before: usize = mentions.iter().map(|m| m.targets.len()).sum();
            let merged = merge_mentions(mentions, &index);
            let after: usize = merged.iter().map(|m| m.targets.len()).sum();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn merge_is_idempotent(starts in prop::collection::vec(0usize..6, 0..12)) {
            let (index, mentions) = setup(&starts);
            let once = merge_mentions(mentions, &index);
            let twice = merge_mentions(once.clone(), &index);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn merged_targets_stay_in_document_order(starts in prop::collection::vec(0usize..6, 0..12)) {
            let (index, mentions) = setup(&starts);
            let merged = merge_mentions(mentions, &index);
            for m in &merged {
                let positions: Vec<usize> = m
                    .targets
                    .iter()
                    .map(|t| {
                        index
                            .sequence_position(&t.line_ref.region_id, &t.line_ref.line_id)
                            .unwrap()
                    })
                    .collect();
                prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
