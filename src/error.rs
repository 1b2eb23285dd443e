use smol_str::SmolStr;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// What went wrong while reading a feature file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("closing brace without a matching opening brace")]
    UnbalancedBraces,

    #[error("block `{tag}` is never closed")]
    UnclosedBlock { tag: SmolStr },

    #[error("block `{expected}` is closed as `{found}`")]
    MismatchedClosingTag { expected: SmolStr, found: SmolStr },

    #[error("block `{tag}` is missing its closing `}} {tag};`")]
    MissingClosingTag { tag: SmolStr },

    #[error("statement is not terminated with `;`")]
    UnterminatedStatement,

    #[error("string literal is never closed")]
    UnterminatedString,

    #[error("malformed languagesystem statement")]
    MalformedLanguagesystem,

    #[error("expected {0}")]
    Expected(&'static str),
}

#[derive(Debug, Error)]
pub enum AutofeaError {
    #[error("Syntax error at line {line}, column {column}: {kind}")]
    Syntax {
        line: usize,
        column: usize,
        kind: SyntaxErrorKind,
    },

    #[error("Merge invariant violated: {0}")]
    MergeInvariant(String),

    #[error("Unknown file type for file {path:?}")]
    UnknownFileType { path: PathBuf },

    #[error("Feature code failed validation: {0}")]
    Validation(String),

    #[error("{0}")]
    General(String),

    #[error("IO Error: {0}")]
    IO(#[from] io::Error),

    #[cfg(feature = "ufo")]
    #[error("Error loading UFO: {0}")]
    UfoLoad(#[from] norad::error::FontLoadError),
}

impl AutofeaError {
    /// The syntax error kind, if this is a syntax error
    pub fn syntax_kind(&self) -> Option<&SyntaxErrorKind> {
        match self {
            AutofeaError::Syntax { kind, .. } => Some(kind),
            _ => None,
        }
    }
}
