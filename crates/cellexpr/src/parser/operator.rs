//! Operators, parentheses and precedence reduction

use super::{matching_paren, skip_string, Element, ParserList, Recognizer};
use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::{ParseError, ParseErrorKind};
use crate::parsing_data::ParsingData;
use crate::token::{RecognizerId, Span, Token};
use std::iter::Peekable;

/// Claims operator symbols and parenthesized groups at depth 0
///
/// A group becomes one token; its interior is parsed by the whole pipeline
/// when the token is turned into an element.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorParser;

impl OperatorParser {
    /// Claim the group opening at `open` and return where scanning resumes
    fn claim_group(&self, data: &mut ParsingData<'_>, id: RecognizerId, open: usize) -> usize {
        let text = data.text();
        match matching_paren(text, open, data.range().end) {
            Some(close) => {
                data.register(Token::new(Span::new(open, close + 1), id));
                close + 1
            }
            None => {
                let index = data.register(Token::new(Span::new(open, open + 1), id));
                data.set_error(index, ParseErrorKind::UnmatchedParenthesis, "Unmatched '('");
                open + 1
            }
        }
    }
}

/// Length of the operator symbol at `pos`, preferring two-character forms
fn operator_len(data: &ParsingData<'_>, pos: usize) -> Option<usize> {
    let bytes = data.text().as_bytes();
    let next = if pos + 1 < data.range().end && !data.is_claimed(pos + 1) {
        Some(bytes[pos + 1])
    } else {
        None
    };
    match (bytes[pos], next) {
        (b'<', Some(b'=' | b'>')) | (b'>', Some(b'=')) => Some(2),
        (b'+' | b'-' | b'*' | b'/' | b'=' | b'<' | b'>', _) => Some(1),
        _ => None,
    }
}

impl Recognizer for OperatorParser {
    fn name(&self) -> &'static str {
        "operator"
    }

    fn parse(&self, data: &mut ParsingData<'_>, id: RecognizerId) {
        let text = data.text();
        let end = data.range().end;
        let mut pos = data.range().start;

        while pos < end {
            if let Some(claimed_end) = data.claimed_end(pos) {
                pos = claimed_end;
                continue;
            }
            match text.as_bytes()[pos] {
                b'"' => pos = skip_string(text, pos, end),
                b'(' => pos = self.claim_group(data, id, pos),
                b')' => {
                    let index = data.register(Token::new(Span::new(pos, pos + 1), id));
                    data.set_error(index, ParseErrorKind::UnmatchedParenthesis, "Unmatched ')'");
                    pos += 1;
                }
                _ => match operator_len(data, pos) {
                    Some(len) => {
                        data.register(Token::new(Span::new(pos, pos + len), id));
                        pos += len;
                    }
                    None => pos += 1,
                },
            }
        }
    }

    fn create_element(
        &self,
        source: &str,
        token: &mut Token,
        pipeline: &ParserList,
    ) -> Result<Option<Element>, ParseError> {
        let span = token.span;
        let symbol = token.text(source);

        if symbol.starts_with('(') {
            // Runs after the unknown-token sweep: `FOO()` reports `FOO`
            if symbol[1..symbol.len() - 1].trim().is_empty() {
                return Err(ParseError::new(
                    ParseErrorKind::MisplacedParenthesis,
                    span,
                    "Empty parentheses",
                ));
            }
            let inner = pipeline.parse_span(source, Span::new(span.start + 1, span.end - 1))?;
            let expr = Expression::Grouping(Box::new(inner));
            token.child = Some(expr.clone());
            return Ok(Some(Element::Operand {
                expr,
                span,
                grouped: true,
            }));
        }

        let op = BinaryOperator::from_symbol(symbol).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnknownToken,
                span,
                format!("Unknown operator '{symbol}'"),
            )
        })?;
        Ok(Some(Element::Operator { op, span }))
    }
}

fn missing_operand(op: &str, span: Span, before: bool) -> ParseError {
    let side = if before { "before" } else { "after" };
    ParseError::new(
        ParseErrorKind::MissingOperand,
        span,
        format!("Missing operand {side} '{op}'"),
    )
}

fn duplicate_operator(op: BinaryOperator, span: Span) -> ParseError {
    ParseError::new(
        ParseErrorKind::DuplicateOperator,
        span,
        format!("Duplicate operator '{}'", op.symbol()),
    )
}

/// Reduce an element stream to one expression
///
/// Sign rules: a `+`/`-` where an operand is expected is a sign and binds to
/// the next operand only. At the start of an expression it may be followed
/// by whitespace. After a binary operator it must touch that operator.
/// A second sign, or `*`, `/` or a comparison where an operand is expected,
/// is an error.
pub(crate) fn reduce(elements: Vec<Element>, range: Span) -> Result<Expression, ParseError> {
    let mut first: Option<Expression> = None;
    let mut rest: Vec<(BinaryOperator, Expression)> = Vec::new();
    // Binary operator still waiting for its right operand
    let mut awaiting: Option<(BinaryOperator, Span)> = None;
    let mut sign: Option<(UnaryOperator, Span)> = None;
    let mut previous_grouped = false;

    for element in elements {
        let expecting_operand = first.is_none() || awaiting.is_some();
        match element {
            Element::Operand {
                expr,
                span,
                grouped,
            } => {
                if !expecting_operand {
                    return Err(if grouped || previous_grouped {
                        ParseError::new(
                            ParseErrorKind::MisplacedParenthesis,
                            span,
                            "Missing operator next to parenthesized group",
                        )
                    } else {
                        ParseError::new(ParseErrorKind::MissingOperator, span, "Missing operator")
                    });
                }
                let expr = match sign.take() {
                    Some((op, _)) => Expression::unary(op, expr),
                    None => expr,
                };
                match awaiting.take() {
                    Some((op, _)) => rest.push((op, expr)),
                    None => first = Some(expr),
                }
                previous_grouped = grouped;
            }
            Element::Operator { op, span } if expecting_operand => {
                if sign.is_some() {
                    return Err(duplicate_operator(op, span));
                }
                sign = match (op.as_unary(), awaiting) {
                    (Some(unary), None) => Some((unary, span)),
                    (Some(unary), Some((_, previous))) if previous.end == span.start => {
                        Some((unary, span))
                    }
                    (_, None) => return Err(missing_operand(op.symbol(), span, true)),
                    (_, Some(_)) => return Err(duplicate_operator(op, span)),
                };
            }
            Element::Operator { op, span } => awaiting = Some((op, span)),
        }
    }

    if let Some((op, span)) = sign {
        return Err(missing_operand(op.symbol(), span, false));
    }
    if let Some((op, span)) = awaiting {
        return Err(missing_operand(op.symbol(), span, false));
    }
    match first {
        Some(lhs) => Ok(climb(lhs, 0, &mut rest.into_iter().peekable())),
        None => Err(ParseError::new(
            ParseErrorKind::EmptyExpression,
            range,
            "Expression is empty",
        )),
    }
}

/// Precedence climbing over `lhs (op operand)*`; equal precedence associates
/// to the left
fn climb<I>(mut lhs: Expression, min_precedence: u8, rest: &mut Peekable<I>) -> Expression
where
    I: Iterator<Item = (BinaryOperator, Expression)>,
{
    while let Some((op, mut rhs)) = rest.next_if(|(op, _)| op.precedence() >= min_precedence) {
        while rest
            .peek()
            .map_or(false, |(next, _)| next.precedence() > op.precedence())
        {
            rhs = climb(rhs, op.precedence() + 1, rest);
        }
        lhs = Expression::binary(op, lhs, rhs);
    }
    lhs
}
