use crate::{
    catalogue::{
        BucketKey, Catalogue, ContextClass, ContextSide, FeatureEntry, FeatureShape, Grouping,
        Scope,
    },
    classify::{Classification, GlyphPair},
    features::{BlockItem, FeatureBlock, GlyphOrClass, Lookup, Statement, Substitution},
};
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::collections::HashSet;

/// Build the automatic feature blocks for a classification, in canonical order
///
/// A feature with no rules produces no block at all; `aalt` is the only
/// block produced regardless of the glyphs.
pub fn synthesize(classification: &Classification, catalogue: &Catalogue) -> Vec<FeatureBlock> {
    let mut blocks = vec![];
    for entry in catalogue.features() {
        let items = match &entry.shape {
            FeatureShape::References(tags) => tags
                .iter()
                .map(|tag| BlockItem::Statement(Statement::FeatureReference(*tag)))
                .collect(),
            FeatureShape::Single(buckets) => {
                wrap(entry, single_rules(classification, buckets))
            }
            FeatureShape::Contextual {
                buckets,
                context,
                side,
                grouping,
            } => wrap(
                entry,
                contextual_rules(classification, buckets, *context, *side, *grouping),
            ),
            FeatureShape::Fraction => fraction_lookups(classification),
            FeatureShape::Localized => localized_lookups(classification, catalogue),
        };
        if items.is_empty() {
            log::debug!("No rules for {}, not emitting a block", entry.tag);
            continue;
        }
        blocks.push(FeatureBlock::synthesized(entry.name(), items));
    }
    log::info!("Synthesized {} feature blocks", blocks.len());
    blocks
}

/// Place statements in the entry's lookup, if it names one
fn wrap(entry: &FeatureEntry, statements: Vec<Statement>) -> Vec<BlockItem> {
    if statements.is_empty() {
        return vec![];
    }
    match entry.lookup {
        Some(name) => vec![BlockItem::Lookup(Lookup {
            name: name.into(),
            scope: entry.scope.clone(),
            statements,
        })],
        None => statements.into_iter().map(BlockItem::Statement).collect(),
    }
}

fn single(pair: &GlyphPair) -> Statement {
    Substitution::single(pair.source.clone(), pair.target.clone()).into()
}

fn single_rules(classification: &Classification, buckets: &[BucketKey]) -> Vec<Statement> {
    buckets
        .iter()
        .flat_map(|bucket| classification.pairs(bucket))
        .map(single)
        .collect()
}

fn contextual_rules(
    classification: &Classification,
    buckets: &[BucketKey],
    context: ContextClass,
    side: ContextSide,
    grouping: Grouping,
) -> Vec<Statement> {
    let class = classification.class(context);
    if class.is_empty() {
        return vec![];
    }
    let context = GlyphOrClass::from_names(class.to_vec());
    let pairs: Vec<&GlyphPair> = buckets
        .iter()
        .flat_map(|bucket| classification.pairs(bucket))
        .collect();
    if pairs.is_empty() {
        return vec![];
    }
    let rule = |input: Vec<SmolStr>, output: Vec<SmolStr>| -> Statement {
        let (backtrack, lookahead) = match side {
            ContextSide::Before => (vec![context.clone()], vec![]),
            ContextSide::After => (vec![], vec![context.clone()]),
        };
        Substitution {
            backtrack,
            input: vec![GlyphOrClass::from_names(input)],
            lookahead,
            output: vec![GlyphOrClass::from_names(output)],
        }
        .into()
    };
    match grouping {
        Grouping::ByTarget => {
            let mut by_target: IndexMap<&SmolStr, Vec<SmolStr>> = IndexMap::new();
            for pair in pairs {
                by_target
                    .entry(&pair.target)
                    .or_default()
                    .push(pair.source.clone());
            }
            by_target
                .into_iter()
                .map(|(target, sources)| rule(sources, vec![target.clone()]))
                .collect()
        }
        Grouping::Aligned => {
            let sources = pairs.iter().map(|pair| pair.source.clone()).collect();
            let targets = pairs.iter().map(|pair| pair.target.clone()).collect();
            vec![rule(sources, targets)]
        }
    }
}

/// The FRAC, UP and DOWN lookups
///
/// Needs the fraction slash and at least one figure with both a numerator
/// and a denominator form.
fn fraction_lookups(classification: &Classification) -> Vec<BlockItem> {
    let Some(fraction) = classification.class(ContextClass::Fraction).first() else {
        return vec![];
    };
    let Some(denominators) = classification.bucket(&BucketKey::Denominator) else {
        return vec![];
    };
    let mut figures = vec![];
    let mut numerators = vec![];
    let mut dnoms = vec![];
    for pair in classification.pairs(&BucketKey::Numerator) {
        if let Some(dnom) = denominators.target_of(&pair.source) {
            figures.push(pair.source.clone());
            numerators.push(pair.target.clone());
            dnoms.push(dnom.clone());
        }
    }
    if figures.is_empty() {
        return vec![];
    }

    let lookup = |name: &str, statements: Vec<Statement>| {
        BlockItem::Lookup(Lookup {
            name: name.into(),
            scope: None,
            statements,
        })
    };
    let mut items = vec![];
    let slashes = single_rules(classification, &[BucketKey::FractionSlash]);
    if !slashes.is_empty() {
        items.push(lookup("FRAC", slashes));
    }
    let numerators = GlyphOrClass::from_names(numerators);
    let dnoms = GlyphOrClass::from_names(dnoms);
    items.push(lookup(
        "UP",
        vec![Substitution {
            backtrack: vec![],
            input: vec![GlyphOrClass::from_names(figures)],
            lookahead: vec![],
            output: vec![numerators.clone()],
        }
        .into()],
    ));
    items.push(lookup(
        "DOWN",
        vec![
            Substitution {
                backtrack: vec![GlyphOrClass::Glyph(fraction.clone())],
                input: vec![numerators.clone()],
                lookahead: vec![],
                output: vec![dnoms.clone()],
            }
            .into(),
            Substitution {
                backtrack: vec![dnoms.clone()],
                input: vec![numerators],
                lookahead: vec![],
                output: vec![dnoms],
            }
            .into(),
        ],
    ));
    items
}

/// One shared lookup per language group
///
/// The first language of a group defines the lookup and the others refer
/// back to it by name.
fn localized_lookups(classification: &Classification, catalogue: &Catalogue) -> Vec<BlockItem> {
    let mut items = vec![];
    let mut emitted_per_script: IndexMap<&str, usize> = IndexMap::new();
    for group in catalogue.language_groups() {
        let mut statements = vec![];
        let mut generic_sources: HashSet<&SmolStr> = HashSet::new();
        for language in &group.languages {
            for pair in classification.pairs(&BucketKey::Localized((*language).into())) {
                if !generic_sources.insert(&pair.source) {
                    log::debug!(
                        "{} already has a localized form in this group, skipping {}",
                        pair.source,
                        pair.target
                    );
                    continue;
                }
                statements.push(single(pair));
            }
        }
        for bucket in &group.rules {
            let surround = catalogue
                .convention(bucket)
                .and_then(|convention| convention.surround);
            for pair in classification.pairs(bucket) {
                if generic_sources.contains(&pair.source) {
                    continue;
                }
                let statement = match surround {
                    Some(glyph) => Substitution {
                        backtrack: vec![GlyphOrClass::Glyph(glyph.into())],
                        input: vec![GlyphOrClass::Glyph(pair.source.clone())],
                        lookahead: vec![GlyphOrClass::Glyph(glyph.into())],
                        output: vec![GlyphOrClass::Glyph(pair.target.clone())],
                    }
                    .into(),
                    None => single(pair),
                };
                statements.push(statement);
            }
        }
        if statements.is_empty() {
            continue;
        }

        let count = emitted_per_script.entry(group.script).or_insert(0);
        let name: SmolStr = format!("locl_{}_{}", group.script, count).into();
        *count += 1;
        for (index, language) in group.languages.iter().enumerate() {
            let scope = Some(Scope::language(group.script, language));
            if index == 0 {
                items.push(BlockItem::Lookup(Lookup {
                    name: name.clone(),
                    scope,
                    statements: statements.clone(),
                }));
            } else {
                items.push(BlockItem::LookupReference {
                    name: name.clone(),
                    scope,
                });
            }
        }
    }
    items
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalogue::STANDARD, classify::classify};
    use pretty_assertions::assert_eq;

    fn blocks_for(glyphs: &[&str]) -> Vec<FeatureBlock> {
        synthesize(&classify(glyphs, &STANDARD), &STANDARD)
    }

    fn block<'a>(blocks: &'a [FeatureBlock], tag: &str) -> Option<&'a FeatureBlock> {
        blocks.iter().find(|block| block.tag == tag)
    }

    #[test]
    fn test_aalt_is_unconditional() {
        let blocks = blocks_for(&[]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].to_fea(),
            "feature aalt {
    # automatic
    feature locl;
    feature subs;
    feature sinf;
    feature sups;
    feature numr;
    feature dnom;
    feature frac;
    feature ordn;
    feature calt;
    feature pnum;
    feature tnum;
} aalt;
"
        );
    }

    #[test]
    fn test_blocks_in_canonical_order() {
        let blocks = blocks_for(&[
            "zero.tf", "zero", "zero.sups", "one", "one.numr", "zero.numr", "A", "a",
            "ordfeminine", "hyphen", "hyphen.case",
        ]);
        let tags: Vec<&str> = blocks.iter().map(|b| b.tag.as_str()).collect();
        assert_eq!(tags, vec!["aalt", "sups", "numr", "ordn", "calt", "tnum"]);
    }

    #[test]
    fn test_tabular_digits_then_currency() {
        let blocks = blocks_for(&["one", "one.tf", "dollar", "dollar.tf", "zero", "zero.tnum"]);
        assert_eq!(
            block(&blocks, "tnum").unwrap().to_fea(),
            "feature tnum {
    # automatic
    sub zero by zero.tnum;
    sub one by one.tf;
    sub dollar by dollar.tf;
} tnum;
"
        );
    }

    #[test]
    fn test_ordinals() {
        let blocks = blocks_for(&["zero", "one", "A", "a", "o", "ordfeminine", "ordmasculine"]);
        assert_eq!(
            block(&blocks, "ordn").unwrap().to_fea(),
            "feature ordn {
    # automatic
    sub [zero one] [A a]' by ordfeminine;
    sub [zero one] o' by ordmasculine;
} ordn;
"
        );
        // No figures, no context to hang the rules on
        let blocks = blocks_for(&["A", "a", "ordfeminine"]);
        assert!(block(&blocks, "ordn").is_none());
    }

    #[test]
    fn test_case_forms() {
        let blocks = blocks_for(&["H", "O", "hyphen", "hyphen.case", "at", "at.case"]);
        assert_eq!(
            block(&blocks, "calt").unwrap().to_fea(),
            "feature calt {
    # automatic
    sub [H O] hyphen' by hyphen.case;
    sub [H O] at' by at.case;
} calt;
"
        );
    }

    #[test]
    fn test_ccmp_is_scoped() {
        let blocks = blocks_for(&["i", "idotless", "j", "jdotless", "gravecomb", "acutecomb"]);
        assert_eq!(
            block(&blocks, "ccmp").unwrap().to_fea(),
            "feature ccmp {
    # automatic
    script latn;
    lookup ccmp_latn_0 {
        sub [i j]' [gravecomb acutecomb] by [idotless jdotless];
    } ccmp_latn_0;
} ccmp;
"
        );
    }

    #[test]
    fn test_fraction() {
        let blocks = blocks_for(&[
            "zero", "one", "two", "zero.numr", "one.numr", "two.numr", "zero.dnom", "one.dnom",
            "slash", "fraction",
        ]);
        assert_eq!(
            block(&blocks, "frac").unwrap().to_fea(),
            "feature frac {
    # automatic
    lookup FRAC {
        sub slash by fraction;
    } FRAC;
    lookup UP {
        sub [zero one] by [zero.numr one.numr];
    } UP;
    lookup DOWN {
        sub fraction [zero.numr one.numr]' by [zero.dnom one.dnom];
        sub [zero.dnom one.dnom] [zero.numr one.numr]' by [zero.dnom one.dnom];
    } DOWN;
} frac;
"
        );
    }

    #[test]
    fn test_fraction_needs_fraction_slash() {
        let blocks = blocks_for(&["zero", "zero.numr", "zero.dnom"]);
        assert!(block(&blocks, "frac").is_none());
        assert!(block(&blocks, "numr").is_some());
        assert!(block(&blocks, "dnom").is_some());
    }

    #[test]
    fn test_locl_shares_lookup_across_group() {
        let blocks = blocks_for(&["i", "Idotaccent"]);
        let locl = block(&blocks, "locl").unwrap();
        assert_eq!(
            locl.to_fea(),
            "feature locl {
    # automatic
    script latn;
    language AZE;
    lookup locl_latn_0 {
        sub i by Idotaccent;
    } locl_latn_0;
    language CRT;
    lookup locl_latn_0;
    language KAZ;
    lookup locl_latn_0;
    language TAT;
    lookup locl_latn_0;
    language TRK;
    lookup locl_latn_0;
} locl;
"
        );
    }

    #[test]
    fn test_locl_groups_and_scripts() {
        let blocks = blocks_for(&[
            "l",
            "L",
            "periodcentered",
            "periodcentered.loclCAT",
            "periodcentered.loclCAT.case",
            "Scedilla",
            "Scommaaccent",
            "be-cy",
            "be-cy.loclSRB",
            "i",
            "i.loclTRK",
        ]);
        let locl = block(&blocks, "locl").unwrap();
        let expected = "feature locl {
    # automatic
    script latn;
    language AZE;
    lookup locl_latn_0 {
        sub i by i.loclTRK;
    } locl_latn_0;
    language CRT;
    lookup locl_latn_0;
    language KAZ;
    lookup locl_latn_0;
    language TAT;
    lookup locl_latn_0;
    language TRK;
    lookup locl_latn_0;
    language CAT;
    lookup locl_latn_1 {
        sub l periodcentered' l by periodcentered.loclCAT;
        sub L periodcentered' L by periodcentered.loclCAT.case;
    } locl_latn_1;
    language ROM;
    lookup locl_latn_2 {
        sub Scedilla by Scommaaccent;
    } locl_latn_2;
    language MOL;
    lookup locl_latn_2;
    script cyrl;
    language SRB;
    lookup locl_cyrl_0 {
        sub be-cy by be-cy.loclSRB;
    } locl_cyrl_0;
    language MKD;
    lookup locl_cyrl_0;
} locl;
";
        assert_eq!(locl.to_fea(), expected);
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let glyphs = ["zero", "zero.sups", "one", "one.sups", "i", "idotaccent"];
        let mut reversed = glyphs;
        reversed.reverse();
        let first: Vec<String> = blocks_for(&glyphs).iter().map(|b| b.to_fea()).collect();
        let second: Vec<String> = blocks_for(&reversed).iter().map(|b| b.to_fea()).collect();
        assert_eq!(first, second);
    }
}
