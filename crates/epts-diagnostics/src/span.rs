//! Positions inside composition strings and parameter mappings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range `start..end` of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty span, used for "unexpected end" errors
    pub const fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text under the span; empty when it falls outside `source`
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// 1-based line and column of a span, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub length: usize,
}

impl SourceLocation {
    pub fn from_span(span: Span, source: &str) -> Self {
        let (line, column) = offset_to_line_col(source, span.start);
        Self {
            line,
            column,
            offset: span.start,
            length: span.len(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line and column (both 1-based) of a byte offset; columns count chars
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    source
        .char_indices()
        .take_while(|(i, _)| *i < offset)
        .fold((1, 1), |(line, col), (_, ch)| if ch == '\n' { (line + 1, 1) } else { (line, col + 1) })
}

/// A value tagged with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub inner: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub const fn new(inner: T, span: Span) -> Self {
        Self { inner, span }
    }
}
