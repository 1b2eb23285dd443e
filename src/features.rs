use crate::catalogue::{Scope, AUTOMATIC_MARKER};
use serde::Serialize;
use smol_str::SmolStr;
use std::fmt;
use write_fonts::types::Tag;

const INDENT: &str = "    ";

/// Whether a feature block is regenerated on each run or written by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Automatic,
    Manual,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provenance::Automatic => "automatic",
            Provenance::Manual => "manual",
        })
    }
}

/// A glyph name or an inline `[a b c]` class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlyphOrClass {
    Glyph(SmolStr),
    Class(Vec<SmolStr>),
}

impl GlyphOrClass {
    /// A single glyph if there is only one, otherwise a class
    pub fn from_names(mut names: Vec<SmolStr>) -> Self {
        if names.len() == 1 {
            if let Some(name) = names.pop() {
                return GlyphOrClass::Glyph(name);
            }
        }
        GlyphOrClass::Class(names)
    }
}

impl fmt::Display for GlyphOrClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlyphOrClass::Glyph(name) => f.write_str(name),
            GlyphOrClass::Class(names) => write!(f, "[{}]", names.join(" ")),
        }
    }
}

/// A GSUB substitution, possibly with context
///
/// When there is backtrack or lookahead context, the input glyphs are
/// marked with `'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub backtrack: Vec<GlyphOrClass>,
    pub input: Vec<GlyphOrClass>,
    pub lookahead: Vec<GlyphOrClass>,
    pub output: Vec<GlyphOrClass>,
}

impl Substitution {
    pub fn single(source: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        Substitution {
            backtrack: vec![],
            input: vec![GlyphOrClass::Glyph(source.into())],
            lookahead: vec![],
            output: vec![GlyphOrClass::Glyph(target.into())],
        }
    }

    pub fn is_contextual(&self) -> bool {
        !self.backtrack.is_empty() || !self.lookahead.is_empty()
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.is_contextual() { "'" } else { "" };
        let mut parts: Vec<String> = self.backtrack.iter().map(|g| g.to_string()).collect();
        parts.extend(self.input.iter().map(|g| format!("{}{}", g, mark)));
        parts.extend(self.lookahead.iter().map(|g| g.to_string()));
        let output: Vec<String> = self.output.iter().map(|g| g.to_string()).collect();
        write!(f, "sub {} by {};", parts.join(" "), output.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Substitution(Substitution),
    /// `feature xxxx;`, as used inside `aalt`
    FeatureReference(Tag),
    /// Anything else, kept as written (without its terminator)
    Verbatim(String),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Substitution(sub) => sub.fmt(f),
            Statement::FeatureReference(tag) => write!(f, "feature {};", tag),
            Statement::Verbatim(text) => write!(f, "{};", text.trim().trim_end_matches(';')),
        }
    }
}

impl From<Substitution> for Statement {
    fn from(sub: Substitution) -> Self {
        Statement::Substitution(sub)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub name: SmolStr,
    pub scope: Option<Scope>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockItem {
    Statement(Statement),
    Lookup(Lookup),
    /// `lookup name;`, reusing a lookup defined earlier in the block
    LookupReference { name: SmolStr, scope: Option<Scope> },
}

/// A lookup named inside a feature block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupSummary {
    pub name: SmolStr,
    /// The script in effect where the lookup appears
    pub script: Option<SmolStr>,
    /// False for `lookup name;` references
    pub defined: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBody {
    /// A block as it was read, from `feature` through the closing `;`
    Source {
        text: String,
        lookups: Vec<LookupSummary>,
    },
    /// Generated content, rendered canonically
    Items(Vec<BlockItem>),
}

/// A `feature <tag> { ... } <tag>;` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureBlock {
    pub tag: SmolStr,
    pub provenance: Provenance,
    pub use_extension: bool,
    pub body: BlockBody,
    /// Indentation before `feature`
    pub(crate) leading: String,
    /// Everything after the closing `;` up to and including the line end
    pub(crate) trailing: String,
}

impl FeatureBlock {
    /// A new automatic block with generated content
    pub fn synthesized(tag: impl Into<SmolStr>, items: Vec<BlockItem>) -> Self {
        FeatureBlock {
            tag: tag.into(),
            provenance: Provenance::Automatic,
            use_extension: false,
            body: BlockBody::Items(items),
            leading: String::new(),
            trailing: "\n".to_string(),
        }
    }

    pub fn is_automatic(&self) -> bool {
        self.provenance == Provenance::Automatic
    }

    /// Swap in freshly generated content, keeping the block's place and
    /// surrounding text
    pub fn replace_body(&mut self, body: BlockBody) {
        self.provenance = Provenance::Automatic;
        self.body = body;
    }

    pub(crate) fn ends_with_newline(&self) -> bool {
        self.trailing.ends_with('\n')
    }

    pub(crate) fn ensure_newline(&mut self) {
        if !self.ends_with_newline() {
            self.trailing.push('\n');
        }
    }

    pub fn lookups(&self) -> Vec<LookupSummary> {
        match &self.body {
            BlockBody::Source { lookups, .. } => lookups.clone(),
            BlockBody::Items(items) => {
                let mut script = None;
                let mut summaries = vec![];
                for item in items {
                    let (name, scope, defined) = match item {
                        BlockItem::Statement(_) => continue,
                        BlockItem::Lookup(lookup) => (&lookup.name, &lookup.scope, true),
                        BlockItem::LookupReference { name, scope } => (name, scope, false),
                    };
                    if let Some(scope) = scope {
                        script = Some(scope.script.clone());
                    }
                    summaries.push(LookupSummary {
                        name: name.clone(),
                        script: script.clone(),
                        defined,
                    });
                }
                summaries
            }
        }
    }

    /// The block as feature file text, including its surrounding whitespace
    pub fn to_fea(&self) -> String {
        let mut fea = self.leading.clone();
        match &self.body {
            BlockBody::Source { text, .. } => fea.push_str(text),
            BlockBody::Items(items) => {
                let mut lines = vec![format!(
                    "feature {}{} {{",
                    self.tag,
                    if self.use_extension {
                        " useExtension"
                    } else {
                        ""
                    }
                )];
                if self.is_automatic() {
                    lines.push(format!("{}{}", INDENT, AUTOMATIC_MARKER));
                }
                render_items(items, 1, &mut lines);
                lines.push(format!("}} {};", self.tag));
                fea.push_str(&lines.join("\n"));
            }
        }
        fea.push_str(&self.trailing);
        fea
    }
}

/// Tracks the script and language statements already emitted in a block
#[derive(Default)]
struct ScopeState {
    script: Option<SmolStr>,
    language: Option<SmolStr>,
}

impl ScopeState {
    fn enter(&mut self, scope: &Scope, indent: &str, lines: &mut Vec<String>) {
        if self.script.as_ref() != Some(&scope.script) {
            lines.push(format!("{}script {};", indent, scope.script));
            self.script = Some(scope.script.clone());
            self.language = None;
        }
        if self.language != scope.language {
            let language = scope.language.as_deref().unwrap_or("dflt");
            lines.push(format!("{}language {};", indent, language));
            self.language = scope.language.clone();
        }
    }
}

fn render_items(items: &[BlockItem], depth: usize, lines: &mut Vec<String>) {
    let indent = INDENT.repeat(depth);
    let mut state = ScopeState::default();
    for item in items {
        match item {
            BlockItem::Statement(statement) => lines.push(format!("{}{}", indent, statement)),
            BlockItem::Lookup(lookup) => {
                if let Some(scope) = &lookup.scope {
                    state.enter(scope, &indent, lines);
                }
                lines.push(format!("{}lookup {} {{", indent, lookup.name));
                let inner = INDENT.repeat(depth + 1);
                for statement in &lookup.statements {
                    lines.push(format!("{}{}", inner, statement));
                }
                lines.push(format!("{}}} {};", indent, lookup.name));
            }
            BlockItem::LookupReference { name, scope } => {
                if let Some(scope) = scope {
                    state.enter(scope, &indent, lines);
                }
                lines.push(format!("{}lookup {};", indent, name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_contextual_substitution() {
        let sub = Substitution {
            backtrack: vec![GlyphOrClass::Class(vec!["zero".into(), "one".into()])],
            input: vec![GlyphOrClass::from_names(vec!["A".into(), "a".into()])],
            lookahead: vec![],
            output: vec![GlyphOrClass::Glyph("ordfeminine".into())],
        };
        assert_eq!(sub.to_string(), "sub [zero one] [A a]' by ordfeminine;");
        assert_eq!(
            Substitution::single("zero", "zero.numr").to_string(),
            "sub zero by zero.numr;"
        );
    }

    #[test]
    fn test_render_synthesized_block() {
        let block = FeatureBlock::synthesized(
            "numr",
            vec![
                BlockItem::Statement(Substitution::single("zero", "zero.numr").into()),
                BlockItem::Statement(Substitution::single("one", "one.numr").into()),
            ],
        );
        assert_eq!(
            block.to_fea(),
            "feature numr {\n    # automatic\n    sub zero by zero.numr;\n    sub one by one.numr;\n} numr;\n"
        );
    }

    #[test]
    fn test_render_scoped_lookups() {
        let block = FeatureBlock::synthesized(
            "locl",
            vec![
                BlockItem::Lookup(Lookup {
                    name: "locl_latn_0".into(),
                    scope: Some(Scope::language("latn", "AZE")),
                    statements: vec![Substitution::single("i", "idotaccent").into()],
                }),
                BlockItem::LookupReference {
                    name: "locl_latn_0".into(),
                    scope: Some(Scope::language("latn", "TRK")),
                },
                BlockItem::Lookup(Lookup {
                    name: "locl_cyrl_0".into(),
                    scope: Some(Scope::language("cyrl", "BGR")),
                    statements: vec![Substitution::single("be-cy", "be-cy.loclBGR").into()],
                }),
            ],
        );
        let expected = "feature locl {
    # automatic
    script latn;
    language AZE;
    lookup locl_latn_0 {
        sub i by idotaccent;
    } locl_latn_0;
    language TRK;
    lookup locl_latn_0;
    script cyrl;
    language BGR;
    lookup locl_cyrl_0 {
        sub be-cy by be-cy.loclBGR;
    } locl_cyrl_0;
} locl;
";
        assert_eq!(block.to_fea(), expected);
        assert_eq!(
            block.lookups(),
            vec![
                LookupSummary {
                    name: "locl_latn_0".into(),
                    script: Some("latn".into()),
                    defined: true
                },
                LookupSummary {
                    name: "locl_latn_0".into(),
                    script: Some("latn".into()),
                    defined: false
                },
                LookupSummary {
                    name: "locl_cyrl_0".into(),
                    script: Some("cyrl".into()),
                    defined: true
                },
            ]
        );
    }

    #[test]
    fn test_script_only_scope() {
        let block = FeatureBlock::synthesized(
            "ccmp",
            vec![BlockItem::Lookup(Lookup {
                name: "ccmp_latn_0".into(),
                scope: Some(Scope::script("latn")),
                statements: vec![Statement::Verbatim("sub i' gravecomb by idotless".into())],
            })],
        );
        assert_eq!(
            block.to_fea(),
            "feature ccmp {\n    # automatic\n    script latn;\n    lookup ccmp_latn_0 {\n        sub i' gravecomb by idotless;\n    } ccmp_latn_0;\n} ccmp;\n"
        );
    }
}
