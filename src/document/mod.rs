//! A feature file as an ordered list of top-level segments
//!
//! Segments keep their exact source text, so a document which is parsed
//! and rendered again without changes comes back byte for byte. Feature
//! blocks are marked automatic or manual; only automatic blocks are ever
//! rewritten.
mod parser;
pub(crate) mod render;

use crate::{
    error::AutofeaError,
    features::{FeatureBlock, LookupSummary, Provenance},
};
use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A `#` comment line
    Comment(String),
    Languagesystem {
        script: SmolStr,
        language: SmolStr,
        text: String,
    },
    FeatureBlock(FeatureBlock),
    /// One or more whitespace-only lines
    Blank(String),
    /// Any other top-level statement: glyph classes, standalone lookups,
    /// tables, includes
    Verbatim(String),
}

impl Segment {
    /// The segment as feature file text
    pub fn to_fea(&self) -> Cow<'_, str> {
        match self {
            Segment::Comment(text)
            | Segment::Blank(text)
            | Segment::Verbatim(text)
            | Segment::Languagesystem { text, .. } => Cow::Borrowed(text.as_str()),
            Segment::FeatureBlock(block) => Cow::Owned(block.to_fea()),
        }
    }

    pub fn as_feature_block(&self) -> Option<&FeatureBlock> {
        match self {
            Segment::FeatureBlock(block) => Some(block),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Segment::Blank(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Segment::Comment(_))
    }

    /// Make sure whatever follows this segment starts on a new line
    pub(crate) fn ensure_newline(&mut self) {
        match self {
            Segment::Comment(text)
            | Segment::Blank(text)
            | Segment::Verbatim(text)
            | Segment::Languagesystem { text, .. } => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Segment::FeatureBlock(block) => block.ensure_newline(),
        }
    }
}

/// One feature block as seen by [`Document::feature_summary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub provenance: Provenance,
    pub lookups: Vec<LookupSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    segments: Vec<Segment>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse feature file text
    ///
    /// Fails on unbalanced braces, unterminated statements, blocks without
    /// a matching closing tag and malformed `languagesystem` statements.
    /// Nothing else about the feature syntax is checked.
    pub fn parse(text: &str) -> Result<Self, AutofeaError> {
        Ok(Document {
            segments: parser::parse(text)?,
        })
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Document { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn render(&self) -> String {
        render::render(&self.segments)
    }

    /// Feature blocks with their segment index, in document order
    pub fn feature_blocks(&self) -> impl Iterator<Item = (usize, &FeatureBlock)> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| segment.as_feature_block().map(|block| (index, block)))
    }

    /// Every feature block grouped by tag, with the lookups inside each
    ///
    /// Tags appear in the order of their first block; a tag written in
    /// several blocks lists each of them in document order.
    pub fn feature_summary(&self) -> IndexMap<SmolStr, Vec<BlockSummary>> {
        let mut summary: IndexMap<SmolStr, Vec<BlockSummary>> = IndexMap::new();
        for (_, block) in self.feature_blocks() {
            summary
                .entry(block.tag.clone())
                .or_default()
                .push(BlockSummary {
                    provenance: block.provenance,
                    lookups: block.lookups(),
                });
        }
        summary
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_feature_summary() {
        let document = Document::parse(
            "languagesystem DFLT dflt;

feature liga {
    sub f i by f_i;
} liga;

feature locl {
    # automatic
    script latn;
    language TRK;
    lookup locl_latn_0 {
        sub i by idotaccent;
    } locl_latn_0;
} locl;

feature liga {
    lookup extra_ligatures {
        sub f l by f_l;
    } extra_ligatures;
} liga;
",
        )
        .unwrap();
        let summary = document.feature_summary();
        assert_eq!(summary.keys().collect::<Vec<_>>(), vec!["liga", "locl"]);
        assert_eq!(
            summary["liga"],
            vec![
                BlockSummary {
                    provenance: Provenance::Manual,
                    lookups: vec![]
                },
                BlockSummary {
                    provenance: Provenance::Manual,
                    lookups: vec![LookupSummary {
                        name: "extra_ligatures".into(),
                        script: None,
                        defined: true
                    }]
                },
            ]
        );
        assert_eq!(summary["locl"][0].provenance, Provenance::Automatic);
        assert_eq!(
            summary["locl"][0].lookups[0].script,
            Some(SmolStr::new("latn"))
        );
    }

    #[test]
    fn test_ensure_newline() {
        let mut segment = Segment::Verbatim("include(other.fea);".into());
        segment.ensure_newline();
        assert_eq!(segment.to_fea(), "include(other.fea);\n");
        segment.ensure_newline();
        assert_eq!(segment.to_fea(), "include(other.fea);\n");
    }

    #[test]
    fn test_empty_document() {
        let document = Document::parse("").unwrap();
        assert!(document.is_empty());
        assert_eq!(document.render(), "");
    }
}
