//! Expression tree types

use crate::functions::FunctionDef;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Node of a built expression tree
///
/// Trees are immutable once built; [`Expression::calc`] is a pure function
/// of the tree, so a tree may be evaluated any number of times, from any
/// number of threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric or string literal
    Literal(Value),

    /// Prefix sign
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Binary operation
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Builtin function call
    Call {
        function: Arc<FunctionDef>,
        args: Vec<Expression>,
    },

    /// Parenthesized sub-expression
    Grouping(Box<Expression>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Negate,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "=" => BinaryOperator::Equal,
            "<>" => BinaryOperator::NotEqual,
            "<" => BinaryOperator::LessThan,
            "<=" => BinaryOperator::LessEqual,
            ">" => BinaryOperator::GreaterThan,
            ">=" => BinaryOperator::GreaterEqual,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    /// Binding strength; higher binds tighter
    ///
    /// 1. Comparison: =, <>, <, <=, >, >=
    /// 2. Addition/Subtraction: +, -
    /// 3. Multiplication/Division: *, /
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Multiply | BinaryOperator::Divide => 3,
            BinaryOperator::Add | BinaryOperator::Subtract => 2,
            _ => 1,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 1
    }

    /// The prefix form of this symbol, if it has one
    pub fn as_unary(self) -> Option<UnaryOperator> {
        match self {
            BinaryOperator::Add => Some(UnaryOperator::Plus),
            BinaryOperator::Subtract => Some(UnaryOperator::Negate),
            _ => None,
        }
    }
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Negate => "-",
        }
    }
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }
}

/// Renders canonical formula text: binary operators spaced, groups and call
/// arguments as written.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(Value::String(s)) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expression::Literal(value) => write!(f, "{value}"),
            Expression::Unary { op, operand } => write!(f, "{}{operand}", op.symbol()),
            Expression::Binary { op, left, right } => {
                write!(f, "{left} {} {right}", op.symbol())
            }
            Expression::Call { function, args } => {
                write!(f, "{}(", function.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expression::Grouping(inner) => write!(f, "({inner})"),
        }
    }
}
