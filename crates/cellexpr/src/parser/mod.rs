//! Formula parser
//!
//! Parsing runs in two phases over a [`ParsingData`]:
//!
//! 1. **Tokenize.** Each recognizer of a [`ParserList`], in registration
//!    order, claims the spans of its own kind among the bytes still free.
//!    Whatever is left afterwards becomes an unknown token.
//! 2. **Build.** Tokens are walked in source order and each owning recognizer
//!    turns its token into an [`Element`] (operand or operator). Group and
//!    argument interiors are parsed recursively at this point, with a fresh
//!    [`ParsingData`] each. The element stream is then reduced by precedence
//!    into a single [`Expression`].
//!
//! Registration order is recognition priority: function calls before
//! operators and parentheses, before string, numeric and space leaves.
//!
//! ```rust
//! use cellexpr::{ParserList, Value};
//!
//! let parser = ParserList::standard();
//! let expr = parser.parse_formula("MAX(1,2)*(3+4)").unwrap();
//! assert_eq!(expr.calc().unwrap(), Value::Int32(14));
//! ```

mod function;
mod numeric;
mod operator;
mod space;
mod string;

pub use function::FunctionParser;
pub use numeric::NumericParser;
pub use operator::OperatorParser;
pub use space::SpaceParser;
pub use string::StringParser;

use crate::ast::{BinaryOperator, Expression};
use crate::error::{FormulaResult, ParseError, ParseErrorKind};
use crate::options::EngineOptions;
use crate::parsing_data::ParsingData;
use crate::token::{RecognizerId, Span, Token};
use crate::value::Value;
use std::fmt;
use std::sync::OnceLock;

/// A piece of the expression stream produced from one token
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Literal, call or parenthesized group
    Operand {
        expr: Expression,
        span: Span,
        /// Whether the operand is a parenthesized group
        grouped: bool,
    },
    /// Operator symbol; whether it is binary or a sign is decided on reduction
    Operator { op: BinaryOperator, span: Span },
}

/// A component that claims tokens of one kind and later materializes them
pub trait Recognizer: fmt::Debug + Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Claim tokens among the still-unclaimed bytes of `data`, tagging them
    /// with `id`
    fn parse(&self, data: &mut ParsingData<'_>, id: RecognizerId);

    /// Turn one of this recognizer's tokens into an element
    ///
    /// `Ok(None)` means the token contributes nothing (whitespace).
    fn create_element(
        &self,
        source: &str,
        token: &mut Token,
        pipeline: &ParserList,
    ) -> Result<Option<Element>, ParseError>;
}

/// Ordered set of recognizers
///
/// A list is configured once and may be shared across threads; all per-parse
/// state lives in the [`ParsingData`] of each call.
#[derive(Debug, Default)]
pub struct ParserList {
    recognizers: Vec<Box<dyn Recognizer>>,
}

impl ParserList {
    /// Empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard pipeline with default options
    pub fn standard() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Standard pipeline: function, operator, string, numeric, space
    pub fn with_options(options: EngineOptions) -> Self {
        let mut list = Self::new();
        list.push(FunctionParser::new(options.functions));
        list.push(OperatorParser);
        list.push(StringParser);
        list.push(NumericParser::new(options.numeric));
        list.push(SpaceParser);
        list
    }

    /// Append a recognizer; it runs after every recognizer already present
    pub fn push(&mut self, recognizer: impl Recognizer + 'static) -> RecognizerId {
        self.recognizers.push(Box::new(recognizer));
        self.recognizers.len() - 1
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    /// Recognizer names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.recognizers.iter().map(|r| r.name()).collect()
    }

    /// Run every recognizer over `data`, then mark leftover text as unknown
    pub fn parse(&self, data: &mut ParsingData<'_>) {
        for (id, recognizer) in self.recognizers.iter().enumerate() {
            let before = data.tokens().len();
            recognizer.parse(data, id);
            log::trace!(
                "{} claimed {} token(s) in {}",
                recognizer.name(),
                data.tokens().len() - before,
                data.range()
            );
        }

        for span in data.unclaimed_spans() {
            let message = format!("Unknown token '{}'", &data.text()[span.start..span.end]);
            let index = data.register(Token::unknown(span));
            data.set_error(index, ParseErrorKind::UnknownToken, message);
        }
    }

    /// Build the expression for tokenized `data`
    ///
    /// Returns `None` when any error was recorded, during tokenizing or while
    /// building; the error is then available from
    /// [`ParsingData::first_error`].
    pub fn create_expression(&self, data: &mut ParsingData<'_>) -> Option<Expression> {
        if data.has_error() {
            return None;
        }

        let source = data.text();
        let mut elements = Vec::new();
        for index in data.source_order() {
            let Some(owner) = data.tokens()[index].owner else {
                continue;
            };
            let recognizer = &self.recognizers[owner];
            match recognizer.create_element(source, data.token_mut(index), self) {
                Ok(Some(element)) => elements.push(element),
                Ok(None) => {}
                Err(error) => {
                    data.record(index, error);
                    return None;
                }
            }
        }

        match operator::reduce(elements, data.range()) {
            Ok(expr) => Some(expr),
            Err(error) => {
                data.fail(error);
                None
            }
        }
    }

    /// Parse a whole formula
    pub fn parse_formula(&self, text: &str) -> Result<Expression, ParseError> {
        self.parse_span(text, Span::new(0, text.len()))
    }

    /// Parse and evaluate a whole formula
    pub fn evaluate(&self, text: &str) -> FormulaResult<Value> {
        let expr = self.parse_formula(text)?;
        Ok(expr.calc()?)
    }

    /// Parse `span` of `text` as one expression
    pub(crate) fn parse_span(&self, text: &str, span: Span) -> Result<Expression, ParseError> {
        let mut data = ParsingData::for_span(text, span);
        self.run(&mut data)
    }

    /// Both phases over prepared `data`, taking the first error on failure
    pub(crate) fn run(&self, data: &mut ParsingData<'_>) -> Result<Expression, ParseError> {
        self.parse(data);
        match self.create_expression(data) {
            Some(expr) => Ok(expr),
            None => Err(data.take_error().unwrap_or_else(|| {
                ParseError::new(
                    ParseErrorKind::EmptyExpression,
                    data.range(),
                    "Expression is empty",
                )
            })),
        }
    }
}

static DEFAULT_PIPELINE: OnceLock<ParserList> = OnceLock::new();

/// The process-wide standard pipeline, built on first use
pub fn default_pipeline() -> &'static ParserList {
    DEFAULT_PIPELINE.get_or_init(ParserList::standard)
}

/// Parse a formula with the default pipeline
///
/// # Example
/// ```rust
/// use cellexpr::parse_formula;
///
/// let expr = parse_formula("1+2*3").unwrap();
/// assert_eq!(expr.to_string(), "1 + 2 * 3");
/// assert!(parse_formula("1+").is_err());
/// ```
pub fn parse_formula(text: &str) -> Result<Expression, ParseError> {
    default_pipeline().parse_formula(text)
}

/// Parse and evaluate a formula with the default pipeline
pub fn evaluate(text: &str) -> FormulaResult<Value> {
    default_pipeline().evaluate(text)
}

// === Scanning helpers shared by the recognizers ===

pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// End of the identifier starting at `start`
pub(crate) fn ident_end(bytes: &[u8], start: usize, end: usize) -> usize {
    let mut pos = start;
    while pos < end && is_ident_byte(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// Whether the character before `pos` (within `range`) is part of a word
pub(crate) fn glued_to_word(text: &str, range: Span, pos: usize) -> bool {
    pos > range.start
        && text[range.start..pos]
            .chars()
            .next_back()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
}

/// Position just past the string literal opening at `start`, or `end` if the
/// literal is unterminated. `""` inside a literal is an escaped quote.
pub(crate) fn skip_string(text: &str, start: usize, end: usize) -> usize {
    let bytes = text.as_bytes();
    let mut pos = start + 1;
    while pos < end {
        if bytes[pos] == b'"' {
            if pos + 1 < end && bytes[pos + 1] == b'"' {
                pos += 2;
                continue;
            }
            return pos + 1;
        }
        pos += 1;
    }
    end
}

/// Position of the `)` closing the `(` at `open`, skipping string literals
pub(crate) fn matching_paren(text: &str, open: usize, end: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut pos = open;
    while pos < end {
        match bytes[pos] {
            b'"' => {
                pos = skip_string(text, pos, end);
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Operand element for a literal token
pub(crate) fn literal_element(token: &Token) -> Option<Element> {
    token.value.clone().map(|value| Element::Operand {
        expr: Expression::Literal(value),
        span: token.span,
        grouped: false,
    })
}
