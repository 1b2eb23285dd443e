use crate::{
    catalogue::{BucketKey, Catalogue, ContextClass, FeatureShape},
    inventory::Inventory,
};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use smol_str::SmolStr;
use std::{collections::HashSet, fmt, sync::LazyLock};

#[allow(clippy::unwrap_used)] // Safe because the regex is valid
static LOCL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^locl([A-Z][A-Z0-9]{1,3})$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GlyphPair {
    pub source: SmolStr,
    pub target: SmolStr,
}

impl GlyphPair {
    pub fn new(source: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        GlyphPair {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Glyph pairs sharing one naming convention, in canonical order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleBucket {
    pub pairs: Vec<GlyphPair>,
}

impl RuleBucket {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GlyphPair> {
        self.pairs.iter()
    }

    pub fn target_of(&self, source: &str) -> Option<&SmolStr> {
        self.pairs
            .iter()
            .find(|pair| pair.source == source)
            .map(|pair| &pair.target)
    }
}

/// Something odd about the inventory which does not stop classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ClassificationWarning {
    /// A variant glyph exists but the glyph it is a variant of does not
    MissingBase { glyph: SmolStr, base: SmolStr },
    /// A `.locl` suffix names a language no language group covers
    UnknownLanguage { glyph: SmolStr, language: SmolStr },
    /// A contextual bucket has pairs but its context class is empty
    MissingContext {
        bucket: BucketKey,
        context: ContextClass,
    },
}

impl fmt::Display for ClassificationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationWarning::MissingBase { glyph, base } => {
                write!(f, "glyph {} has no base glyph {}", glyph, base)
            }
            ClassificationWarning::UnknownLanguage { glyph, language } => {
                write!(f, "glyph {} names unknown language {}", glyph, language)
            }
            ClassificationWarning::MissingContext { bucket, context } => write!(
                f,
                "bucket {} has rules but no {} glyphs to use as context",
                bucket, context
            ),
        }
    }
}

/// The result of sorting an inventory into rule buckets
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    /// Non-empty buckets
    pub buckets: IndexMap<BucketKey, RuleBucket>,
    /// Context glyphs present in the inventory, in canonical order
    pub classes: IndexMap<ContextClass, Vec<SmolStr>>,
    pub warnings: Vec<ClassificationWarning>,
}

impl Classification {
    pub fn bucket(&self, key: &BucketKey) -> Option<&RuleBucket> {
        self.buckets.get(key)
    }

    /// Pairs of a bucket, or nothing if the bucket is empty
    pub fn pairs(&self, key: &BucketKey) -> &[GlyphPair] {
        self.buckets
            .get(key)
            .map(|bucket| bucket.pairs.as_slice())
            .unwrap_or_default()
    }

    pub fn class(&self, class: ContextClass) -> &[SmolStr] {
        self.classes
            .get(&class)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn push(&mut self, key: BucketKey, pair: GlyphPair) {
        log::debug!("{}: {} -> {}", key, pair.source, pair.target);
        self.buckets.entry(key).or_default().pairs.push(pair);
    }

    fn warn(&mut self, warning: ClassificationWarning) {
        log::debug!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Sort glyph names into rule buckets using the catalogue's naming conventions
///
/// A pair is only produced when both its source and target are present,
/// and pairs are ordered by the catalogue's tables rather than by the order
/// of `glyph_names`.
pub fn classify<I, S>(glyph_names: I, catalogue: &Catalogue) -> Classification
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let inventory = Inventory::new(glyph_names);
    classify_inventory(&inventory, catalogue)
}

pub fn classify_inventory(inventory: &Inventory, catalogue: &Catalogue) -> Classification {
    let mut classification = Classification::default();

    for (class, members) in catalogue.context_classes() {
        let present: Vec<SmolStr> = members
            .iter()
            .filter(|name| inventory.contains(name))
            .map(|name| SmolStr::new_static(*name))
            .collect();
        if !present.is_empty() {
            classification.classes.insert(*class, present);
        }
    }

    let mut claimed: HashSet<SmolStr> = HashSet::new();
    for convention in catalogue.conventions() {
        for source in convention.sources.iter().copied() {
            if !inventory.contains(source) {
                continue;
            }
            let Some(target) = convention
                .targets
                .iter()
                .filter_map(|pattern| pattern.target_for(source))
                .find(|target| inventory.contains(target))
            else {
                continue;
            };
            // The target belongs to this convention even when its context is missing
            claimed.insert(target.clone());
            if let Some(surround) = convention.surround {
                if !inventory.contains(surround) {
                    continue;
                }
            }
            classification.push(convention.bucket.clone(), GlyphPair::new(source, target));
        }
    }

    for glyph in inventory.iter() {
        let Some((stem, suffix)) = glyph.split_last_suffix() else {
            continue;
        };
        if let Some(captures) = LOCL_SUFFIX.captures(suffix) {
            if claimed.contains(glyph.as_str()) {
                continue;
            }
            let language = SmolStr::new(&captures[1]);
            if catalogue.group_for_language(&language).is_none() {
                classification.warn(ClassificationWarning::UnknownLanguage {
                    glyph: glyph.as_str().into(),
                    language,
                });
            } else if !inventory.contains(stem) {
                classification.warn(ClassificationWarning::MissingBase {
                    glyph: glyph.as_str().into(),
                    base: stem.into(),
                });
            } else {
                classification.push(
                    BucketKey::Localized(language),
                    GlyphPair::new(stem, glyph.as_str()),
                );
            }
        } else if catalogue.is_variant_suffix(suffix) && !inventory.contains(stem) {
            classification.warn(ClassificationWarning::MissingBase {
                glyph: glyph.as_str().into(),
                base: stem.into(),
            });
        }
    }

    for entry in catalogue.features() {
        if let FeatureShape::Contextual {
            buckets, context, ..
        } = &entry.shape
        {
            if !classification.class(*context).is_empty() {
                continue;
            }
            for bucket in buckets {
                if classification.bucket(bucket).is_some() {
                    classification.warn(ClassificationWarning::MissingContext {
                        bucket: bucket.clone(),
                        context: *context,
                    });
                }
            }
        }
    }

    log::info!(
        "Classified {} glyphs into {} buckets ({} warnings)",
        inventory.len(),
        classification.buckets.len(),
        classification.warnings.len()
    );
    classification
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::STANDARD;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn pairs(classification: &Classification, key: BucketKey) -> Vec<(&str, &str)> {
        classification
            .pairs(&key)
            .iter()
            .map(|p| (p.source.as_str(), p.target.as_str()))
            .collect()
    }

    #[test]
    fn test_missing_variants_produce_nothing() {
        let classification = classify(["zero", "one", "zero.numr", "one.sups"], &STANDARD);
        assert_eq!(
            pairs(&classification, BucketKey::Numerator),
            vec![("zero", "zero.numr")]
        );
        assert_eq!(
            pairs(&classification, BucketKey::Superior),
            vec![("one", "one.sups")]
        );
        assert!(classification.bucket(&BucketKey::Denominator).is_none());
        assert!(classification.warnings.is_empty());
    }

    #[rstest]
    #[case(vec!["two", "two.tf", "zero", "one.tf", "one", "zero.tf"])]
    #[case(vec!["zero.tf", "one.tf", "two.tf", "two", "one", "zero"])]
    #[case(vec!["one", "two.tf", "zero.tf", "zero", "two", "one.tf"])]
    fn test_canonical_order_regardless_of_input(#[case] glyphs: Vec<&str>) {
        let classification = classify(glyphs, &STANDARD);
        assert_eq!(
            pairs(&classification, BucketKey::TabularDigits),
            vec![
                ("zero", "zero.tf"),
                ("one", "one.tf"),
                ("two", "two.tf")
            ]
        );
    }

    #[test]
    fn test_one_glyph_feeds_many_buckets() {
        let classification = classify(
            [
                "zero",
                "zero.numr",
                "zero.dnom",
                "zerosuperior",
                "zeroinferior",
                "zero.tf",
            ],
            &STANDARD,
        );
        assert_eq!(
            pairs(&classification, BucketKey::Subscript),
            vec![("zero", "zeroinferior")]
        );
        assert_eq!(
            pairs(&classification, BucketKey::ScientificInferior),
            vec![("zero", "zeroinferior")]
        );
        assert_eq!(
            pairs(&classification, BucketKey::Superior),
            vec![("zero", "zerosuperior")]
        );
        assert!(classification.bucket(&BucketKey::Numerator).is_some());
        assert!(classification.bucket(&BucketKey::Denominator).is_some());
        assert!(classification.bucket(&BucketKey::TabularDigits).is_some());
    }

    #[test]
    fn test_first_target_pattern_wins() {
        let classification = classify(["one", "one.sups", "onesuperior"], &STANDARD);
        assert_eq!(
            pairs(&classification, BucketKey::Superior),
            vec![("one", "one.sups")]
        );
    }

    #[test]
    fn test_dotted_i() {
        let classification = classify(["i", "Idotaccent"], &STANDARD);
        assert_eq!(
            pairs(&classification, BucketKey::DottedI),
            vec![("i", "Idotaccent")]
        );
    }

    #[test]
    fn test_catalan_needs_surrounding_glyph() {
        let classification = classify(
            [
                "l",
                "periodcentered",
                "periodcentered.loclCAT",
                "periodcentered.loclCAT.case",
            ],
            &STANDARD,
        );
        assert_eq!(
            pairs(&classification, BucketKey::CatalanMiddleDot),
            vec![("periodcentered", "periodcentered.loclCAT")]
        );
        // No `L`, so no case variant rule; and the glyph is not
        // picked up as a plain localized form either
        assert!(classification
            .bucket(&BucketKey::CatalanMiddleDotCase)
            .is_none());
        assert!(classification
            .bucket(&BucketKey::Localized("CAT".into()))
            .is_none());
    }

    #[test]
    fn test_catalan_without_l_gives_no_rule() {
        let classification = classify(["periodcentered", "periodcentered.loclCAT"], &STANDARD);
        assert!(classification.buckets.is_empty());
        assert!(classification
            .bucket(&BucketKey::Localized("CAT".into()))
            .is_none());
        assert!(classification.warnings.is_empty());
    }

    #[test]
    fn test_localized_suffixes() {
        let classification = classify(
            ["a", "a.sc", "a.sc.loclNLD", "g.loclXYZ", "b.loclPLK"],
            &STANDARD,
        );
        assert_eq!(
            pairs(&classification, BucketKey::Localized("NLD".into())),
            vec![("a.sc", "a.sc.loclNLD")]
        );
        assert_eq!(
            classification.warnings,
            vec![
                ClassificationWarning::MissingBase {
                    glyph: "b.loclPLK".into(),
                    base: "b".into()
                },
                ClassificationWarning::UnknownLanguage {
                    glyph: "g.loclXYZ".into(),
                    language: "XYZ".into()
                },
            ]
        );
    }

    #[test]
    fn test_orphan_variant_warning() {
        let classification = classify(["five.numr"], &STANDARD);
        assert!(classification.buckets.is_empty());
        assert_eq!(
            classification.warnings,
            vec![ClassificationWarning::MissingBase {
                glyph: "five.numr".into(),
                base: "five".into()
            }]
        );
    }

    #[test]
    fn test_missing_context_warning() {
        let classification = classify(["hyphen", "hyphen.case"], &STANDARD);
        assert!(classification.bucket(&BucketKey::CaseForms).is_some());
        assert_eq!(
            classification.warnings,
            vec![ClassificationWarning::MissingContext {
                bucket: BucketKey::CaseForms,
                context: ContextClass::Uppercase
            }]
        );
    }

    #[test]
    fn test_context_classes() {
        let classification = classify(["Z", "A", "fraction", "two"], &STANDARD);
        assert_eq!(classification.class(ContextClass::Uppercase), ["A", "Z"]);
        assert_eq!(classification.class(ContextClass::Figures), ["two"]);
        assert_eq!(classification.class(ContextClass::Fraction), ["fraction"]);
        assert!(classification.class(ContextClass::TopMarks).is_empty());
    }
}
