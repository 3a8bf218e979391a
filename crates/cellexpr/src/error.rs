//! Formula error types

use crate::token::Span;
use crate::value::ValueKind;
use thiserror::Error;

/// Result type for operations that may fail to parse or evaluate
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Result type for expression evaluation
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Classification of a parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The text (or a group / argument) holds no expression at all
    EmptyExpression,
    /// A string literal without its closing quote
    UnterminatedString,
    /// A `(` or `)` without its partner
    UnmatchedParenthesis,
    /// Empty `()` or a group glued to another operand
    MisplacedParenthesis,
    /// Text no recognizer claimed (includes unregistered function names)
    UnknownToken,
    /// An operator without an operand on one side
    MissingOperand,
    /// Operators in sequence that are not `operator, unary sign`
    DuplicateOperator,
    /// Two operands with no operator between them
    MissingOperator,
    /// Nothing between two argument separators
    MissingArgument,
    /// Two arguments with no separator between them
    MissingSeparator,
    /// A registered function name not followed by `(`
    MissingOpeningParenthesis,
    /// A function call whose `(` is never closed
    MissingClosingParenthesis,
    /// A function called with too few or too many arguments
    WrongArgumentCount,
    /// A numeric literal no enabled numeric kind can hold
    DisallowedLiteralType,
    /// A numeric literal with more than one decimal separator
    MalformedNumber,
}

/// A located parse failure
///
/// Only the first error encountered while parsing is kept, so the span always
/// points at the earliest offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", .span.display())]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }
}

/// Errors raised while computing the value of an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Binary operator applied to operands it is not defined for
    #[error("Operator '{op}' is not defined for {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: ValueKind,
        right: ValueKind,
    },

    /// Unary operator applied to an operand it is not defined for
    #[error("Unary operator '{op}' is not defined for {operand}")]
    UnaryTypeMismatch { op: &'static str, operand: ValueKind },

    /// Function argument of the wrong kind
    #[error("{function}: argument {position} must be {expected}, got {actual}")]
    ArgumentType {
        function: String,
        position: usize,
        expected: &'static str,
        actual: ValueKind,
    },

    /// Function argument of the right kind but outside the function's domain
    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },

    /// Division or modulo by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Integer or date arithmetic left its representable range
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),
}

impl EvalError {
    pub(crate) fn invalid(function: &str, message: impl Into<String>) -> Self {
        EvalError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// Errors that can occur when turning formula text into a value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_includes_position() {
        let err = ParseError::new(
            ParseErrorKind::UnknownToken,
            Span::new(2, 5),
            "Unknown token 'FOO'",
        );
        assert_eq!(err.to_string(), "Unknown token 'FOO' at positions 3-5");

        let err = ParseError::new(
            ParseErrorKind::UnmatchedParenthesis,
            Span::new(0, 1),
            "Unmatched '('",
        );
        assert_eq!(err.to_string(), "Unmatched '(' at position 1");
    }

    #[test]
    fn test_formula_error_wraps_sources() {
        let err: FormulaError = EvalError::DivisionByZero.into();
        assert_eq!(err.to_string(), "Evaluation error: Division by zero");
    }
}
