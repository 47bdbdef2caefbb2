use alloc::string::String;
use core::fmt;

use thiserror::Error;

/// A location in the input document.
///
/// `line` and `column` are 1-based; `column` counts bytes, not characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset from the start of the input.
    pub offset: usize,
    /// Line number, starting at 1.
    pub line: usize,
    /// Byte column within the line, starting at 1.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The kind of malformed input found by the [`Reader`](crate::Reader).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SyntaxError {
    #[error("invalid character '{}'", .0.escape_debug())]
    InvalidCharacter(char),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("invalid escape '\\{0}'")]
    InvalidEscape(char),
    #[error("invalid unicode escape sequence \\u{0:04X}")]
    InvalidUnicodeEscapeSequence(u32),
    #[error("control character in string")]
    ControlCharacter,
    #[error("invalid number")]
    InvalidNumber,
    #[error("trailing characters after the document")]
    TrailingCharacters,
}

/// Malformed input reported by an [`EventSource`](crate::EventSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalError {
    pub(crate) kind: SyntaxError,
    pub(crate) position: Position,
    pub(crate) excerpt: String,
}

impl LexicalError {
    /// Create an error for a custom event source.
    #[must_use]
    pub fn new(kind: SyntaxError, position: Position, excerpt: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            excerpt: excerpt.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &SyntaxError {
        &self.kind
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// The input following the fault, possibly truncated.
    #[must_use]
    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.position)?;
        if !self.excerpt.is_empty() {
            write!(f, " near {:?}", self.excerpt)?;
        }
        Ok(())
    }
}

impl core::error::Error for LexicalError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Why a handler refused an event.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Mismatch {
    #[error("unexpected key {0:?}")]
    UnexpectedKey(String),
    #[error("unexpected {0}")]
    UnexpectedEvent(String),
    #[error("{0} while already open")]
    DuplicateStart(String),
    #[error("expected {expected} elements, found {found}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("{value} does not fit in {target}")]
    OutOfRange { value: String, target: &'static str },
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("unexpected end of events")]
    UnexpectedEnd,
    #[error("{0} after the document ended")]
    AfterEnd(String),
    #[error("handler stack unwound past its bottom")]
    Unbalanced,
}

/// The document does not fit the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub(crate) role: String,
    pub(crate) kind: Mismatch,
    pub(crate) position: Option<Position>,
}

impl SchemaMismatch {
    pub(crate) fn new(role: String, kind: Mismatch) -> Self {
        Self {
            role,
            kind,
            position: None,
        }
    }

    /// Attach the location of the offending token, keeping any earlier one.
    #[must_use]
    pub fn at(mut self, position: Option<Position>) -> Self {
        if self.position.is_none() {
            self.position = position;
        }
        self
    }

    /// Description of the handler that refused the event, e.g.
    /// `object Person` or `field "age" (u32)`.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn kind(&self) -> &Mismatch {
        &self.kind
    }

    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.kind, self.role)?;
        if let Some(position) = self.position {
            write!(f, " at {position}")?;
        }
        Ok(())
    }
}

impl core::error::Error for SchemaMismatch {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Any failure of [`import`](crate::import) and friends.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ImportError {
    #[error("syntax error: {0}")]
    Lexical(#[from] LexicalError),
    #[error("schema mismatch: {0}")]
    Schema(#[from] SchemaMismatch),
}
