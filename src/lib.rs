#![deny(clippy::unwrap_used, clippy::expect_used)]
//! # Autofea
//!
//! Autofea keeps the mechanical parts of an OpenType feature file in step
//! with a font's glyph set, without touching the parts written by hand.
//!
//! ## How it works
//!
//! - Glyph names are sorted into rule buckets by naming convention
//!   ([`classify`]): `zero.numr` is the numerator form of `zero`,
//!   `a.sc.loclNLD` is the Dutch form of `a.sc`, and so on.
//! - The buckets become feature blocks ([`synthesize`]), one per feature
//!   tag in the [`Catalogue`], in a fixed canonical order.
//! - The existing feature file is split into top-level segments
//!   ([`Document::parse`]). Feature blocks whose body starts with
//!   `# automatic` are *automatic*; everything else is *manual*.
//! - The new blocks are merged in ([`merge`]): automatic blocks are
//!   replaced where they stand, new ones are placed by canonical rank, and
//!   automatic blocks with no rules left are removed. Manual content is
//!   never changed or moved.
//!
//! Running the whole pipeline twice on the same glyph set gives the same
//! text both times.
//!
//! ```
//! use autofea::{regenerate, Inventory, STANDARD};
//!
//! let inventory = Inventory::new(["zero", "one", "zero.numr", "one.numr"]);
//! let result = regenerate(&inventory, None, &STANDARD).unwrap();
//! assert!(result.text.contains("sub zero by zero.numr;"));
//! ```
//!
//! ## Cargo features
//!
//! - `ufo` (default): read glyph names and `features.fea` from UFO sources
//! - `validate`: check the regenerated file with `fea-rs-ast`
//! - `cli`: the `autofea` command line tool
pub mod catalogue;
mod classify;
mod document;
mod error;
mod features;
mod inventory;
mod merge;
mod synthesize;
#[cfg(feature = "validate")]
mod validate;

pub use crate::{
    catalogue::{BucketKey, Catalogue, ContextClass, AUTOMATIC_MARKER, STANDARD},
    classify::{
        classify, classify_inventory, Classification, ClassificationWarning, GlyphPair,
        RuleBucket,
    },
    document::{BlockSummary, Document, Segment},
    error::{AutofeaError, SyntaxErrorKind},
    features::{
        BlockBody, BlockItem, FeatureBlock, GlyphOrClass, Lookup, LookupSummary, Provenance,
        Statement, Substitution,
    },
    inventory::{load_glyph_list, GlyphName, GlyphSource, Inventory},
    merge::merge,
    synthesize::synthesize,
};
#[cfg(feature = "ufo")]
pub use crate::inventory::load_ufo;
#[cfg(feature = "validate")]
pub use crate::validate::validate;
use std::path::PathBuf;
pub use write_fonts::types::Tag;

/// The outcome of one regeneration run
#[derive(Debug, Clone)]
pub struct Regeneration {
    pub text: String,
    pub warnings: Vec<ClassificationWarning>,
    /// Whether `text` differs from the document passed in
    pub changed: bool,
}

/// Classify, synthesize, parse, merge and render in one go
///
/// `existing` is the current feature file, if there is one. A syntax
/// error in it stops the run; nothing is merged into a document which
/// could not be read completely.
pub fn regenerate(
    inventory: &Inventory,
    existing: Option<&str>,
    catalogue: &Catalogue,
) -> Result<Regeneration, AutofeaError> {
    let classification = classify_inventory(inventory, catalogue);
    let blocks = synthesize(&classification, catalogue);
    let document = match existing {
        Some(text) => Document::parse(text)?,
        None => Document::new(),
    };
    let text = merge(document, blocks, catalogue)?.render();
    #[cfg(feature = "validate")]
    validate::sanity_check_features(&text, inventory.names());
    let changed = existing != Some(text.as_str());
    if changed {
        log::info!("Feature code changed");
    } else {
        log::info!("Feature code is up to date");
    }
    Ok(Regeneration {
        text,
        warnings: classification.warnings,
        changed,
    })
}

/// Load glyph names (and any feature code) from a UFO or a glyph list
pub fn load(filename: impl Into<PathBuf>) -> Result<GlyphSource, AutofeaError> {
    let pb = filename.into();
    match pb.extension() {
        #[cfg(feature = "ufo")]
        Some(ext) if ext == "ufo" => load_ufo(&pb),
        Some(ext) if ext == "txt" || ext == "glyphs-list" => load_glyph_list(&pb),
        _ => Err(AutofeaError::UnknownFileType { path: pb }),
    }
}
