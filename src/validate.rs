use crate::error::AutofeaError;
use fea_rs_ast::FeatureFile;
use std::path::PathBuf;

/// Parse feature code against a glyph set
///
/// Catches references to glyphs the font does not have, and anything in
/// the hand-written parts of the file which does not parse.
pub fn validate<'a>(
    fea: &str,
    glyph_names: impl IntoIterator<Item = &'a str>,
) -> Result<(), AutofeaError> {
    let glyph_names: Vec<&str> = glyph_names.into_iter().collect();
    FeatureFile::new_from_fea(fea, Some(&glyph_names), None::<PathBuf>)
        .map_err(|e| AutofeaError::Validation(e.to_string()))?;
    Ok(())
}

/// Like [`validate`], but only logs what it finds
pub(crate) fn sanity_check_features<'a>(
    fea: &str,
    glyph_names: impl IntoIterator<Item = &'a str>,
) {
    if let Err(e) = validate(fea, glyph_names) {
        log::warn!("Generated feature code did not validate:");
        log::warn!("{}", e);
    }
}
