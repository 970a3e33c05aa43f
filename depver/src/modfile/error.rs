//! Positioned diagnostics produced while parsing go.mod files

use std::fmt;

use thiserror::Error;

/// A location in the manifest text.
///
/// `line` and `column` are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub byte: usize,
}

impl Position {
    pub(crate) const START: Position = Position {
        line: 1,
        column: 1,
        byte: 0,
    };
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What went wrong at a given position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("mod files must use // comments, not /* */ comments")]
    BlockComment,
    #[error("unexpected newline in string")]
    NewlineInString,
    #[error("unexpected EOF in string")]
    EofInString,
    #[error("unexpected input character {0:?}")]
    UnexpectedChar(char),
    #[error("syntax error (unterminated block started at {0})")]
    UnterminatedBlock(Position),
    #[error("syntax error (expected newline after closing paren)")]
    ExpectedNewlineAfterParen,
    #[error("unknown directive: {0}")]
    UnknownDirective(String),
    #[error("unknown block type: {0}")]
    UnknownBlockType(String),
    #[error("repeated {0} statement")]
    Repeated(&'static str),
    #[error("usage: {0}")]
    Usage(String),
    #[error("{0} directive expects exactly one argument")]
    ExpectsOneArgument(&'static str),
    #[error("invalid quoted string: {0}")]
    InvalidQuotedString(&'static str),
    #[error("invalid go version '{0}': must match format 1.23.0")]
    InvalidGoVersion(String),
    #[error("invalid toolchain version '{0}': must match format go1.23.0 or default")]
    InvalidToolchain(String),
    #[error("{verb} {path}: version {version:?} invalid: must be of the form v1.2.3")]
    InvalidVersion {
        verb: String,
        path: String,
        version: String,
    },
    #[error("{0}: invalid module path")]
    InvalidModulePath(String),
    #[error("{path}@{version}: invalid version: {reason}")]
    PathMajorMismatch {
        path: String,
        version: String,
        reason: String,
    },
    #[error("{0}")]
    Replacement(String),
    #[error("{0}")]
    VersionInterval(&'static str),
    #[error("unexpected token after version: {0:?}")]
    UnexpectedAfterVersion(String),
}

/// A single parse diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: {kind}")]
pub struct ParseError {
    pub position: Position,
    pub kind: ErrorKind,
}

impl ParseError {
    pub(crate) fn new(position: Position, kind: ErrorKind) -> Self {
        Self { position, kind }
    }
}

/// Every diagnostic collected while interpreting a file.
///
/// Lexical and block-structure errors stop parsing immediately, so those
/// arrive alone; directive errors are gathered across the whole file.
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseErrors(Vec<ParseError>);

impl ParseErrors {
    pub(crate) fn from_vec(errors: Vec<ParseError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.0
    }

    pub fn first(&self) -> &ParseError {
        // from_vec and From<ParseError> are the only constructors
        &self.0[0]
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}
