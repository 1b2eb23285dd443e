//! The fixed tables that drive classification and synthesis
//!
//! A [`Catalogue`] lists the naming conventions that put glyphs into rule
//! buckets, the feature tags this crate knows how to generate (in their
//! canonical order), and how each feature is shaped from the buckets.
//! [`STANDARD`] is the catalogue used unless a caller builds their own.
use serde::Serialize;
use smol_str::SmolStr;
use std::{fmt, sync::LazyLock};
use write_fonts::types::Tag;

/// The comment which marks a feature block as regenerated on every run
pub const AUTOMATIC_MARKER: &str = "# automatic";

pub static STANDARD: LazyLock<Catalogue> = LazyLock::new(Catalogue::standard);

const FIGURES: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];
const FIGURE_SYMBOLS: &[&str] = &["plus", "minus", "equal", "parenleft", "parenright"];
const CURRENCY: &[&str] = &[
    "dollar",
    "cent",
    "sterling",
    "yen",
    "euro",
    "numbersign",
    "percent",
];
const UPPERCASE: &[&str] = &[
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z",
];
const TOP_MARKS: &[&str] = &[
    "gravecomb",
    "acutecomb",
    "circumflexcomb",
    "tildecomb",
    "macroncomb",
    "brevecomb",
    "dotaccentcomb",
    "dieresiscomb",
    "hookabovecomb",
    "ringcomb",
    "hungarumlautcomb",
    "caroncomb",
];
const CASE_PUNCTUATION: &[&str] = &[
    "hyphen",
    "endash",
    "emdash",
    "colon",
    "periodcentered",
    "parenleft",
    "parenright",
    "bracketleft",
    "bracketright",
    "braceleft",
    "braceright",
    "guilsinglleft",
    "guilsinglright",
    "guillemotleft",
    "guillemotright",
    "at",
];

/// Suffixes which name a variant of some other glyph
///
/// Used to spot variants whose base glyph is missing from the inventory.
const VARIANT_SUFFIXES: &[&str] = &[
    "subs", "sinf", "sups", "numr", "dnom", "pnum", "pf", "tf", "tnum", "case",
];

/// A named group of (source, target) glyph pairs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    Subscript,
    ScientificInferior,
    Superior,
    Numerator,
    Denominator,
    Proportional,
    TabularDigits,
    TabularCurrency,
    FractionSlash,
    OrdinalFeminine,
    OrdinalMasculine,
    CaseForms,
    Dotless,
    DottedI,
    CommaAccent,
    CatalanMiddleDot,
    CatalanMiddleDotCase,
    /// Glyphs named `X.locl<LANG>` for the given language tag
    Localized(SmolStr),
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BucketKey::Subscript => "subscript",
            BucketKey::ScientificInferior => "scientific-inferior",
            BucketKey::Superior => "superior",
            BucketKey::Numerator => "numerator",
            BucketKey::Denominator => "denominator",
            BucketKey::Proportional => "proportional",
            BucketKey::TabularDigits => "digits-tf",
            BucketKey::TabularCurrency => "currency-tf",
            BucketKey::FractionSlash => "fraction-slash",
            BucketKey::OrdinalFeminine => "ordinal-feminine",
            BucketKey::OrdinalMasculine => "ordinal-masculine",
            BucketKey::CaseForms => "case-forms",
            BucketKey::Dotless => "dotless",
            BucketKey::DottedI => "aze-dotted-i",
            BucketKey::CommaAccent => "rom-comma-accent",
            BucketKey::CatalanMiddleDot => "cat-middle-dot",
            BucketKey::CatalanMiddleDotCase => "cat-middle-dot-case",
            BucketKey::Localized(language) => return write!(f, "locl-{}", language),
        };
        f.write_str(name)
    }
}

impl Serialize for BucketKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A set of glyphs used as context around a substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextClass {
    Figures,
    Uppercase,
    TopMarks,
    Fraction,
}

impl fmt::Display for ContextClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContextClass::Figures => "figures",
            ContextClass::Uppercase => "uppercase",
            ContextClass::TopMarks => "top-marks",
            ContextClass::Fraction => "fraction",
        })
    }
}

/// How a target glyph name is derived from a source glyph name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetPattern {
    /// `zero` becomes `zero.numr`
    Suffix(&'static str),
    /// `zero` becomes `zerosuperior`
    Append(&'static str),
    /// Always the same glyph, e.g. `ordfeminine`
    Fixed(&'static str),
    /// `Scedilla` becomes `Scommaaccent`
    Replace {
        from: &'static str,
        to: &'static str,
    },
}

impl TargetPattern {
    pub fn target_for(&self, source: &str) -> Option<SmolStr> {
        match self {
            TargetPattern::Suffix(suffix) => Some(format!("{}{}", source, suffix).into()),
            TargetPattern::Append(word) => Some(format!("{}{}", source, word).into()),
            TargetPattern::Fixed(target) => Some(SmolStr::new_static(*target)),
            TargetPattern::Replace { from, to } => source
                .contains(from)
                .then(|| source.replacen(from, to, 1).into()),
        }
    }
}

/// One naming convention: which glyphs are sources, and where their targets are
#[derive(Debug, Clone)]
pub struct Convention {
    pub bucket: BucketKey,
    /// Candidate source glyphs, in canonical order
    pub sources: Vec<&'static str>,
    /// Target patterns, tried in order; the first target present wins
    pub targets: Vec<TargetPattern>,
    /// A glyph which must appear on both sides of the source for the
    /// substitution to apply (`l periodcentered' l`)
    pub surround: Option<&'static str>,
}

impl Convention {
    fn new(bucket: BucketKey, sources: Vec<&'static str>, targets: Vec<TargetPattern>) -> Self {
        Convention {
            bucket,
            sources,
            targets,
            surround: None,
        }
    }

    fn surrounded_by(mut self, glyph: &'static str) -> Self {
        self.surround = Some(glyph);
        self
    }
}

/// Which side of the substituted glyph the context class sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSide {
    Before,
    After,
}

/// How the pairs of a contextual feature become rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// One rule per distinct target, sources sharing a target become a class
    ByTarget,
    /// A single rule substituting the class of all sources with the
    /// class of all targets
    Aligned,
}

#[derive(Debug, Clone)]
pub enum FeatureShape {
    /// `feature xxxx;` references, independent of glyph data
    References(Vec<Tag>),
    /// `sub a by b;` for every pair of the buckets, in order
    Single(Vec<BucketKey>),
    /// `sub x' by y;` with a context class on one side
    Contextual {
        buckets: Vec<BucketKey>,
        context: ContextClass,
        side: ContextSide,
        grouping: Grouping,
    },
    /// The FRAC/UP/DOWN lookups built from numerators and denominators
    Fraction,
    /// Language-scoped lookups, one per language group
    Localized,
}

/// Script and language statements in effect for a lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Scope {
    pub script: SmolStr,
    pub language: Option<SmolStr>,
}

impl Scope {
    pub fn script(script: &str) -> Self {
        Scope {
            script: script.into(),
            language: None,
        }
    }

    pub fn language(script: &str, language: &str) -> Self {
        Scope {
            script: script.into(),
            language: Some(language.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureEntry {
    pub tag: Tag,
    pub shape: FeatureShape,
    /// Wrap the generated rules in a lookup of this name
    pub lookup: Option<&'static str>,
    /// Script/language statements placed before that lookup
    pub scope: Option<Scope>,
}

impl FeatureEntry {
    fn new(tag: &[u8; 4], shape: FeatureShape) -> Self {
        FeatureEntry {
            tag: Tag::new(tag),
            shape,
            lookup: None,
            scope: None,
        }
    }

    fn in_lookup(mut self, name: &'static str, scope: Scope) -> Self {
        self.lookup = Some(name);
        self.scope = Some(scope);
        self
    }

    pub fn name(&self) -> SmolStr {
        self.tag.to_string().into()
    }
}

/// Languages which share one `locl` lookup
#[derive(Debug, Clone)]
pub struct LanguageGroup {
    pub script: &'static str,
    pub languages: Vec<&'static str>,
    /// Buckets of fixed rules for this group, after any `.locl` glyphs
    pub rules: Vec<BucketKey>,
}

impl LanguageGroup {
    fn new(script: &'static str, languages: Vec<&'static str>, rules: Vec<BucketKey>) -> Self {
        LanguageGroup {
            script,
            languages,
            rules,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalogue {
    conventions: Vec<Convention>,
    context_classes: Vec<(ContextClass, Vec<&'static str>)>,
    variant_suffixes: Vec<&'static str>,
    features: Vec<FeatureEntry>,
    language_groups: Vec<LanguageGroup>,
}

impl Catalogue {
    pub fn standard() -> Self {
        use BucketKey::*;
        use TargetPattern::*;

        let figures_and_symbols: Vec<&'static str> =
            FIGURES.iter().chain(FIGURE_SYMBOLS).copied().collect();

        let conventions = vec![
            Convention::new(
                Subscript,
                figures_and_symbols.clone(),
                vec![Suffix(".subs"), Append("inferior")],
            ),
            Convention::new(
                ScientificInferior,
                figures_and_symbols.clone(),
                vec![Suffix(".sinf"), Append("inferior")],
            ),
            Convention::new(
                Superior,
                figures_and_symbols,
                vec![Suffix(".sups"), Append("superior")],
            ),
            Convention::new(Numerator, FIGURES.to_vec(), vec![Suffix(".numr")]),
            Convention::new(Denominator, FIGURES.to_vec(), vec![Suffix(".dnom")]),
            Convention::new(
                Proportional,
                FIGURES.to_vec(),
                vec![Suffix(".pnum"), Suffix(".pf")],
            ),
            Convention::new(
                TabularDigits,
                FIGURES.to_vec(),
                vec![Suffix(".tf"), Suffix(".tnum")],
            ),
            Convention::new(
                TabularCurrency,
                CURRENCY.to_vec(),
                vec![Suffix(".tf"), Suffix(".tnum")],
            ),
            Convention::new(FractionSlash, vec!["slash"], vec![Fixed("fraction")]),
            Convention::new(OrdinalFeminine, vec!["A", "a"], vec![Fixed("ordfeminine")]),
            Convention::new(OrdinalMasculine, vec!["O", "o"], vec![Fixed("ordmasculine")]),
            Convention::new(CaseForms, CASE_PUNCTUATION.to_vec(), vec![Suffix(".case")]),
            Convention::new(Dotless, vec!["i", "j"], vec![Append("dotless")]),
            Convention::new(
                DottedI,
                vec!["i"],
                vec![Fixed("idotaccent"), Fixed("Idotaccent")],
            ),
            Convention::new(
                CommaAccent,
                vec!["Scedilla", "scedilla", "Tcedilla", "tcedilla"],
                vec![Replace {
                    from: "cedilla",
                    to: "commaaccent",
                }],
            ),
            Convention::new(
                CatalanMiddleDot,
                vec!["periodcentered"],
                vec![Suffix(".loclCAT")],
            )
            .surrounded_by("l"),
            Convention::new(
                CatalanMiddleDotCase,
                vec!["periodcentered"],
                vec![Suffix(".loclCAT.case")],
            )
            .surrounded_by("L"),
        ];

        let context_classes = vec![
            (ContextClass::Figures, FIGURES.to_vec()),
            (ContextClass::Uppercase, UPPERCASE.to_vec()),
            (ContextClass::TopMarks, TOP_MARKS.to_vec()),
            (ContextClass::Fraction, vec!["fraction"]),
        ];

        let features = vec![
            FeatureEntry::new(
                b"aalt",
                FeatureShape::References(
                    [
                        b"locl", b"subs", b"sinf", b"sups", b"numr", b"dnom", b"frac", b"ordn",
                        b"calt", b"pnum", b"tnum",
                    ]
                    .into_iter()
                    .map(Tag::new)
                    .collect(),
                ),
            ),
            FeatureEntry::new(
                b"ccmp",
                FeatureShape::Contextual {
                    buckets: vec![Dotless],
                    context: ContextClass::TopMarks,
                    side: ContextSide::After,
                    grouping: Grouping::Aligned,
                },
            )
            .in_lookup("ccmp_latn_0", Scope::script("latn")),
            FeatureEntry::new(b"locl", FeatureShape::Localized),
            FeatureEntry::new(b"subs", FeatureShape::Single(vec![Subscript])),
            FeatureEntry::new(b"sinf", FeatureShape::Single(vec![ScientificInferior])),
            FeatureEntry::new(b"sups", FeatureShape::Single(vec![Superior])),
            FeatureEntry::new(b"numr", FeatureShape::Single(vec![Numerator])),
            FeatureEntry::new(b"dnom", FeatureShape::Single(vec![Denominator])),
            FeatureEntry::new(b"frac", FeatureShape::Fraction),
            FeatureEntry::new(
                b"ordn",
                FeatureShape::Contextual {
                    buckets: vec![OrdinalFeminine, OrdinalMasculine],
                    context: ContextClass::Figures,
                    side: ContextSide::Before,
                    grouping: Grouping::ByTarget,
                },
            ),
            FeatureEntry::new(
                b"calt",
                FeatureShape::Contextual {
                    buckets: vec![CaseForms],
                    context: ContextClass::Uppercase,
                    side: ContextSide::Before,
                    grouping: Grouping::ByTarget,
                },
            ),
            FeatureEntry::new(b"pnum", FeatureShape::Single(vec![Proportional])),
            FeatureEntry::new(
                b"tnum",
                FeatureShape::Single(vec![TabularDigits, TabularCurrency]),
            ),
        ];

        let language_groups = vec![
            LanguageGroup::new(
                "latn",
                vec!["AZE", "CRT", "KAZ", "TAT", "TRK"],
                vec![DottedI],
            ),
            LanguageGroup::new(
                "latn",
                vec!["CAT"],
                vec![CatalanMiddleDot, CatalanMiddleDotCase],
            ),
            LanguageGroup::new("latn", vec!["ROM", "MOL"], vec![CommaAccent]),
            LanguageGroup::new("latn", vec!["NLD"], vec![]),
            LanguageGroup::new("latn", vec!["PLK"], vec![]),
            LanguageGroup::new("latn", vec!["DEU"], vec![]),
            LanguageGroup::new("cyrl", vec!["BGR"], vec![]),
            LanguageGroup::new("cyrl", vec!["SRB", "MKD"], vec![]),
            LanguageGroup::new("cyrl", vec!["UKR"], vec![]),
            LanguageGroup::new("grek", vec!["ELL"], vec![]),
        ];

        Catalogue {
            conventions,
            context_classes,
            variant_suffixes: VARIANT_SUFFIXES.to_vec(),
            features,
            language_groups,
        }
    }

    /// Feature entries in canonical order
    pub fn features(&self) -> &[FeatureEntry] {
        &self.features
    }

    /// Position of a feature tag in the canonical order, if it is known
    pub fn rank(&self, tag: &str) -> Option<usize> {
        self.features
            .iter()
            .position(|entry| entry.tag.to_string() == tag)
    }

    pub fn conventions(&self) -> &[Convention] {
        &self.conventions
    }

    pub fn convention(&self, bucket: &BucketKey) -> Option<&Convention> {
        self.conventions.iter().find(|c| &c.bucket == bucket)
    }

    pub fn context_classes(&self) -> &[(ContextClass, Vec<&'static str>)] {
        &self.context_classes
    }

    pub fn is_variant_suffix(&self, suffix: &str) -> bool {
        self.variant_suffixes.iter().any(|s| *s == suffix)
    }

    pub fn language_groups(&self) -> &[LanguageGroup] {
        &self.language_groups
    }

    pub fn group_for_language(&self, language: &str) -> Option<&LanguageGroup> {
        self.language_groups
            .iter()
            .find(|group| group.languages.iter().any(|l| *l == language))
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_order() {
        let tags: Vec<SmolStr> = STANDARD.features().iter().map(|f| f.name()).collect();
        assert_eq!(
            tags,
            vec![
                "aalt", "ccmp", "locl", "subs", "sinf", "sups", "numr", "dnom", "frac", "ordn",
                "calt", "pnum", "tnum"
            ]
        );
        assert_eq!(STANDARD.rank("aalt"), Some(0));
        assert_eq!(STANDARD.rank("calt"), Some(10));
        assert_eq!(STANDARD.rank("ss01"), None);
    }

    #[test]
    fn test_target_patterns() {
        assert_eq!(
            TargetPattern::Suffix(".sups").target_for("zero"),
            Some("zero.sups".into())
        );
        assert_eq!(
            TargetPattern::Append("superior").target_for("zero"),
            Some("zerosuperior".into())
        );
        assert_eq!(
            TargetPattern::Replace {
                from: "cedilla",
                to: "commaaccent"
            }
            .target_for("Tcedilla"),
            Some("Tcommaaccent".into())
        );
        assert_eq!(
            TargetPattern::Replace {
                from: "cedilla",
                to: "commaaccent"
            }
            .target_for("T"),
            None
        );
    }

    #[test]
    fn test_language_groups() {
        let group = STANDARD.group_for_language("KAZ").unwrap();
        assert_eq!(group.script, "latn");
        assert_eq!(group.languages[0], "AZE");
        assert!(STANDARD.group_for_language("XYZ").is_none());
    }

    #[test]
    fn test_bucket_names() {
        assert_eq!(BucketKey::TabularCurrency.to_string(), "currency-tf");
        assert_eq!(BucketKey::DottedI.to_string(), "aze-dotted-i");
        assert_eq!(BucketKey::Localized("NLD".into()).to_string(), "locl-NLD");
    }
}
