//! Source spans and the tokens recognizers claim over them

use crate::ast::Expression;
use crate::error::ParseErrorKind;
use crate::value::Value;
use std::fmt;

/// Byte range `[start, end)` within the formula text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start {start} after end {end}");
        Self { start, end }
    }

    /// Zero-width span at `pos`
    pub fn at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Smallest span covering both
    pub fn to(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Human-readable location suffix, 1-based
    pub fn display(&self) -> String {
        match self.len() {
            0 | 1 => format!(" at position {}", self.start + 1),
            _ => format!(" at positions {}-{}", self.start + 1, self.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Index of a recognizer within its [`ParserList`](crate::parser::ParserList)
pub type RecognizerId = usize;

/// A claimed span of source text
///
/// Every token belongs to exactly one recognizer (`owner`), except the
/// catch-all tokens covering text nobody claimed, which have no owner and
/// always carry [`ParseErrorKind::UnknownToken`].
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub span: Span,
    pub owner: Option<RecognizerId>,
    /// Literal value for numeric and string tokens
    pub value: Option<Value>,
    /// Pre-built node for grouped content (parenthesized groups, calls)
    pub child: Option<Expression>,
    pub error: Option<ParseErrorKind>,
}

impl Token {
    pub fn new(span: Span, owner: RecognizerId) -> Self {
        Self {
            span,
            owner: Some(owner),
            value: None,
            child: None,
            error: None,
        }
    }

    pub(crate) fn unknown(span: Span) -> Self {
        Self {
            span,
            owner: None,
            value: None,
            child: None,
            error: None,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_child(mut self, child: Expression) -> Self {
        self.child = Some(child);
        self
    }

    /// Source text this token covers
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}
