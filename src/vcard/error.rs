//! vCard parse error types.

use std::fmt;

/// Result type for vCard parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// An error found while reading one logical line of a vCard document.
///
/// Parse errors never abort a document: the parser attaches them either to
/// the card (skipped lines, unterminated cards) or to the property whose
/// value could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}: {message}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Logical (unfolded) line number, 1-based.
    pub line: usize,
    /// Additional context.
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    pub fn encoding(line: usize, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::Encoding, line, message)
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// `BEGIN:VCARD` without a matching `END:VCARD`.
    UnterminatedCard,
    /// Content line without a `:` between name and value.
    MissingSeparator,
    /// Property name is empty or contains characters outside `[A-Za-z0-9-]`.
    InvalidPropertyName,
    /// Malformed parameter list.
    InvalidParameter,
    /// Payload cannot be decoded under its declared encoding.
    Encoding,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedCard => write!(f, "unterminated card"),
            Self::MissingSeparator => write!(f, "missing value separator"),
            Self::InvalidPropertyName => write!(f, "invalid property name"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::Encoding => write!(f, "encoding error"),
        }
    }
}
