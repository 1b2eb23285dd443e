use crate::error::AutofeaError;
use smol_str::SmolStr;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// A glyph name with a dotted suffix chain
///
/// Names starting with a dot (`.notdef`) have no suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphName(SmolStr);

impl GlyphName {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        GlyphName(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The final suffix and the name it was attached to
    ///
    /// `a.sc.loclNLD` splits into `("a.sc", "loclNLD")`.
    pub fn split_last_suffix(&self) -> Option<(&str, &str)> {
        if self.0.starts_with('.') {
            return None;
        }
        self.0
            .rsplit_once('.')
            .filter(|(stem, suffix)| !stem.is_empty() && !suffix.is_empty())
    }
}

impl fmt::Display for GlyphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GlyphName {
    fn from(name: &str) -> Self {
        GlyphName::new(name)
    }
}

/// One snapshot of a project's glyph names
///
/// Iteration is always in sorted order, whatever order the names were
/// supplied in.
#[derive(Debug, Clone, Default)]
pub struct Inventory(BTreeSet<SmolStr>);

impl Inventory {
    pub fn new<I, S>(glyph_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Inventory(
            glyph_names
                .into_iter()
                .map(|name| SmolStr::new(name.as_ref()))
                .collect(),
        )
    }

    /// Read a glyph list with one name per line
    ///
    /// Blank lines and lines starting with `#` are skipped, and anything
    /// after the first run of whitespace on a line is ignored, so that
    /// `name unicode` style lists can be read too.
    pub fn from_glyph_list(text: &str) -> Self {
        Inventory::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .filter_map(|line| line.split_whitespace().next()),
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = GlyphName> + '_ {
        self.0.iter().map(|name| GlyphName(name.clone()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(SmolStr::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for Inventory {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Inventory::new(iter)
    }
}

/// Glyph names, plus the feature code stored alongside them if any
#[derive(Debug, Clone, Default)]
pub struct GlyphSource {
    pub inventory: Inventory,
    /// The contents of `features.fea`, if the source has any
    pub features: Option<String>,
}

/// Read a glyph list file
pub fn load_glyph_list(path: impl AsRef<Path>) -> Result<GlyphSource, AutofeaError> {
    let path = path.as_ref();
    log::info!("Loading glyph names from {}", path.display());
    let inventory = Inventory::from_glyph_list(&std::fs::read_to_string(path)?);
    log::debug!("Found {} glyphs", inventory.len());
    Ok(GlyphSource {
        inventory,
        features: None,
    })
}

#[cfg(feature = "ufo")]
pub fn load_ufo(path: impl AsRef<Path>) -> Result<GlyphSource, AutofeaError> {
    let path = path.as_ref();
    log::info!("Loading glyph names from {}", path.display());
    let ufo = norad::Font::load(path)?;
    let inventory = Inventory::new(ufo.iter_names().map(|name| name.to_string()));
    log::debug!("Found {} glyphs", inventory.len());
    let features = if ufo.features.trim().is_empty() {
        None
    } else {
        Some(ufo.features.clone())
    };
    Ok(GlyphSource {
        inventory,
        features,
    })
}
