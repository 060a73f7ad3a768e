//! CSS parsing error types

use std::fmt;
use thiserror::Error;

/// CSS parsing result type
pub type CssResult<T> = Result<T, CssError>;

/// Source location in CSS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from start
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// Location of a byte offset within `input`
    pub fn of_offset(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) + 1;
        Self { line, column, offset }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// CSS parsing errors
#[derive(Debug, Error)]
pub enum CssError {
    #[error("Unexpected end of input at {location}")]
    UnexpectedEof {
        location: SourceLocation,
    },

    #[error("Invalid selector '{selector}' at {location}")]
    InvalidSelector {
        selector: String,
        location: SourceLocation,
    },

    #[error("Invalid rule '{text}' at {location}")]
    InvalidRule {
        text: String,
        location: SourceLocation,
    },

    #[error("Unterminated string at {location}")]
    UnterminatedString {
        location: SourceLocation,
    },

    #[error("Invalid number '{number}' at {location}")]
    InvalidNumber {
        number: String,
        location: SourceLocation,
    },

    #[error("Parse error: {message} at {location}")]
    ParseError {
        message: String,
        location: SourceLocation,
    },
}

impl CssError {
    /// Get the source location of this error
    pub fn location(&self) -> SourceLocation {
        match self {
            Self::UnexpectedEof { location } => *location,
            Self::InvalidSelector { location, .. } => *location,
            Self::InvalidRule { location, .. } => *location,
            Self::UnterminatedString { location } => *location,
            Self::InvalidNumber { location, .. } => *location,
            Self::ParseError { location, .. } => *location,
        }
    }

    pub fn invalid_selector(selector: impl Into<String>, location: SourceLocation) -> Self {
        Self::InvalidSelector { selector: selector.into(), location }
    }

    pub fn parse_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::ParseError { message: message.into(), location }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation::new(10, 5, 100);
        assert_eq!(format!("{}", loc), "10:5");
    }

    #[test]
    fn test_location_of_offset() {
        let input = "a {}\nb { color: red }";
        let loc = SourceLocation::of_offset(input, 7);
        assert_eq!((loc.line, loc.column), (2, 3));
    }

    #[test]
    fn test_error_display() {
        let err = CssError::invalid_selector("div >", SourceLocation::new(1, 6, 5));
        assert_eq!(format!("{}", err), "Invalid selector 'div >' at 1:6");
    }
}
