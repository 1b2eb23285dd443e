//! Folding freshly synthesized blocks into an existing document
//!
//! Automatic blocks are replaced where they stand, new blocks are slotted in
//! by their rank in the catalogue, and automatic blocks which no longer have
//! any rules are dropped. Manual blocks, and blocks whose tag the catalogue
//! does not know, are never moved or changed.
use crate::{
    catalogue::Catalogue,
    document::{Document, Segment},
    error::AutofeaError,
    features::FeatureBlock,
};
use indexmap::IndexMap;
use smol_str::SmolStr;

pub fn merge(
    document: Document,
    synthesized: Vec<FeatureBlock>,
    catalogue: &Catalogue,
) -> Result<Document, AutofeaError> {
    let mut existing = automatic_blocks(&document, catalogue)?;
    let mut segments = document.into_segments();

    let mut fresh = vec![];
    for block in synthesized {
        match existing.shift_remove(&block.tag) {
            Some(index) => {
                if let Segment::FeatureBlock(old) = &mut segments[index] {
                    log::debug!("Replacing automatic {} block in place", block.tag);
                    old.replace_body(block.body);
                }
            }
            None => fresh.push(block),
        }
    }

    let mut stale: Vec<usize> = existing.into_values().collect();
    stale.sort_unstable_by(|a, b| b.cmp(a));
    for index in stale {
        remove_block(&mut segments, index);
    }

    fresh.sort_by_key(|block| catalogue.rank(&block.tag).unwrap_or(usize::MAX));
    for block in fresh {
        insert_block(&mut segments, block, catalogue);
    }
    Ok(Document::from_segments(segments))
}

/// Index of each automatic block the catalogue can regenerate, by tag
fn automatic_blocks(
    document: &Document,
    catalogue: &Catalogue,
) -> Result<IndexMap<SmolStr, usize>, AutofeaError> {
    let mut existing = IndexMap::new();
    for (index, block) in document.feature_blocks() {
        if !block.is_automatic() || catalogue.rank(&block.tag).is_none() {
            continue;
        }
        if existing.insert(block.tag.clone(), index).is_some() {
            return Err(AutofeaError::MergeInvariant(format!(
                "more than one automatic {} block",
                block.tag
            )));
        }
    }
    Ok(existing)
}

fn remove_block(segments: &mut Vec<Segment>, index: usize) {
    if let Some(block) = segments[index].as_feature_block() {
        log::info!("Removing automatic {} block, it no longer has any rules", block.tag);
    }
    segments.remove(index);
    // Collapse the blank lines which surrounded the block
    let next_is_blank_or_end = segments.get(index).map_or(true, Segment::is_blank);
    if index > 0 && segments[index - 1].is_blank() && next_is_blank_or_end {
        segments.remove(index - 1);
    } else if index == 0 && segments.first().is_some_and(Segment::is_blank) {
        segments.remove(0);
    }
}

fn insert_block(segments: &mut Vec<Segment>, block: FeatureBlock, catalogue: &Catalogue) {
    let rank = catalogue.rank(&block.tag).unwrap_or(usize::MAX);
    let later = segments.iter().position(|segment| {
        segment
            .as_feature_block()
            .and_then(|other| catalogue.rank(&other.tag))
            .is_some_and(|other| other > rank)
    });
    let last_block = segments
        .iter()
        .rposition(|segment| segment.as_feature_block().is_some());

    let (at, blank_before, blank_after) = match (later, last_block) {
        (Some(later), _) => {
            // Keep the comments which introduce the later block attached to it
            let mut at = later;
            while at > 0 && segments[at - 1].is_comment() {
                at -= 1;
            }
            (at, at > 0 && !segments[at - 1].is_blank(), true)
        }
        (None, Some(last)) => {
            let at = last + 1;
            (at, true, segments.get(at).is_some_and(|s| !s.is_blank()))
        }
        (None, None) => {
            let at = segments.len();
            (at, at > 0 && !segments[at - 1].is_blank(), false)
        }
    };
    log::info!("Adding automatic {} block", block.tag);

    if at > 0 {
        segments[at - 1].ensure_newline();
    }
    let mut new_segments = vec![];
    if blank_before {
        new_segments.push(Segment::Blank("\n".to_string()));
    }
    new_segments.push(Segment::FeatureBlock(block));
    if blank_after {
        new_segments.push(Segment::Blank("\n".to_string()));
    }
    for (offset, segment) in new_segments.into_iter().enumerate() {
        segments.insert(at + offset, segment);
    }
}
