//! Formula evaluator
//!
//! Computes values from expression trees. Operators dispatch on the runtime
//! kinds of their evaluated operands; kind errors therefore surface here and
//! not at parse time, since a function result's kind is only known once it
//! has been computed.

use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use rust_decimal::Decimal;
use std::cmp::Ordering;

impl Expression {
    /// Compute the value of this expression
    pub fn calc(&self) -> EvalResult<Value> {
        match self {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Grouping(inner) => inner.calc(),
            Expression::Unary { op, operand } => evaluate_unary_op(*op, operand.calc()?),
            Expression::Binary { op, left, right } => {
                // Evaluate operands first
                let left = left.calc()?;
                let right = right.calc()?;
                evaluate_binary_op(*op, left, right)
            }
            Expression::Call { function, args } => function.call(args),
        }
    }
}

fn mismatch(op: BinaryOperator, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op: op.symbol(),
        left: left.kind(),
        right: right.kind(),
    }
}

/// Apply a binary operator to two evaluated operands
pub fn evaluate_binary_op(op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
    match op {
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Subtract => subtract(left, right),
        _ if op.is_comparison() => {
            let ordering = compare_values(op, &left, &right)?;
            Ok(Value::Boolean(comparison_holds(op, ordering)))
        }
        _ => arithmetic(op, &left, &right),
    }
}

fn add(left: Value, right: Value) -> EvalResult<Value> {
    match (&left, &right) {
        (Value::String(l), _) => Ok(Value::String(format!("{l}{right}"))),
        (_, Value::String(r)) => Ok(Value::String(format!("{left}{r}"))),
        (Value::DateTime(t), Value::Duration(d)) | (Value::Duration(d), Value::DateTime(t)) => t
            .checked_add_signed(*d)
            .map(Value::DateTime)
            .ok_or(EvalError::Overflow("+")),
        (Value::Duration(l), Value::Duration(r)) => l
            .checked_add(r)
            .map(Value::Duration)
            .ok_or(EvalError::Overflow("+")),
        _ => arithmetic(BinaryOperator::Add, &left, &right),
    }
}

fn subtract(left: Value, right: Value) -> EvalResult<Value> {
    match (&left, &right) {
        (Value::DateTime(t), Value::Duration(d)) => t
            .checked_sub_signed(*d)
            .map(Value::DateTime)
            .ok_or(EvalError::Overflow("-")),
        (Value::DateTime(l), Value::DateTime(r)) => {
            Ok(Value::Duration(l.signed_duration_since(*r)))
        }
        (Value::Duration(l), Value::Duration(r)) => l
            .checked_sub(r)
            .map(Value::Duration)
            .ok_or(EvalError::Overflow("-")),
        _ => arithmetic(BinaryOperator::Subtract, &left, &right),
    }
}

/// Numeric `+ - * /` after widening both sides to their common kind
fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
    let (Some(lk), Some(rk)) = (left.numeric_kind(), right.numeric_kind()) else {
        return Err(mismatch(op, left, right));
    };
    let kind = lk.widen(rk);
    let (Some(l), Some(r)) = (left.widen_to(kind), right.widen_to(kind)) else {
        return Err(mismatch(op, left, right));
    };

    match (l, r) {
        (Value::Int32(a), Value::Int32(b)) => int_op(op, a, b).map(Value::Int32),
        (Value::Single(a), Value::Single(b)) => {
            let x = float_op(op, f64::from(a), f64::from(b))?;
            let narrowed = x as f32;
            if narrowed.is_infinite() && x.is_finite() {
                return Err(EvalError::Overflow(op.symbol()));
            }
            Ok(Value::Single(narrowed))
        }
        (Value::Double(a), Value::Double(b)) => float_op(op, a, b).map(Value::Double),
        (Value::Decimal(a), Value::Decimal(b)) => decimal_op(op, a, b).map(Value::Decimal),
        _ => Err(mismatch(op, left, right)),
    }
}

fn int_op(op: BinaryOperator, a: i32, b: i32) -> EvalResult<i32> {
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_div(b)
        }
        _ => None,
    };
    result.ok_or(EvalError::Overflow(op.symbol()))
}

fn float_op(op: BinaryOperator, a: f64, b: f64) -> EvalResult<f64> {
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        _ => f64::NAN,
    };
    if result.is_infinite() && a.is_finite() && b.is_finite() {
        return Err(EvalError::Overflow(op.symbol()));
    }
    Ok(result)
}

fn decimal_op(op: BinaryOperator, a: Decimal, b: Decimal) -> EvalResult<Decimal> {
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => {
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_div(b)
        }
        _ => None,
    };
    result.ok_or(EvalError::Overflow(op.symbol()))
}

/// Order two operands of the same kind
///
/// Numeric operands are widened first. `None` means unordered (a NaN was
/// involved). Comparison is exact: there is no tolerance for floats.
pub fn compare_values(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
) -> EvalResult<Option<Ordering>> {
    match (left, right) {
        (Value::DateTime(l), Value::DateTime(r)) => Ok(Some(l.cmp(r))),
        (Value::Duration(l), Value::Duration(r)) => Ok(Some(l.cmp(r))),
        (Value::String(l), Value::String(r)) => Ok(Some(l.cmp(r))),
        (Value::Boolean(l), Value::Boolean(r)) => Ok(Some(l.cmp(r))),
        _ => {
            let (Some(lk), Some(rk)) = (left.numeric_kind(), right.numeric_kind()) else {
                return Err(mismatch(op, left, right));
            };
            let kind = lk.widen(rk);
            match (left.widen_to(kind), right.widen_to(kind)) {
                (Some(Value::Int32(l)), Some(Value::Int32(r))) => Ok(Some(l.cmp(&r))),
                (Some(Value::Single(l)), Some(Value::Single(r))) => Ok(l.partial_cmp(&r)),
                (Some(Value::Double(l)), Some(Value::Double(r))) => Ok(l.partial_cmp(&r)),
                (Some(Value::Decimal(l)), Some(Value::Decimal(r))) => Ok(Some(l.cmp(&r))),
                _ => Err(mismatch(op, left, right)),
            }
        }
    }
}

fn comparison_holds(op: BinaryOperator, ordering: Option<Ordering>) -> bool {
    let Some(ordering) = ordering else {
        return op == BinaryOperator::NotEqual;
    };
    match op {
        BinaryOperator::Equal => ordering == Ordering::Equal,
        BinaryOperator::NotEqual => ordering != Ordering::Equal,
        BinaryOperator::LessThan => ordering == Ordering::Less,
        BinaryOperator::LessEqual => ordering != Ordering::Greater,
        BinaryOperator::GreaterThan => ordering == Ordering::Greater,
        BinaryOperator::GreaterEqual => ordering != Ordering::Less,
        _ => false,
    }
}

/// Apply a prefix sign; only numeric operands have one
pub fn evaluate_unary_op(op: UnaryOperator, operand: Value) -> EvalResult<Value> {
    let negated = match (op, &operand) {
        (UnaryOperator::Plus, v) if v.is_numeric() => return Ok(operand),
        (UnaryOperator::Negate, Value::Int32(n)) => {
            Value::Int32(n.checked_neg().ok_or(EvalError::Overflow("-"))?)
        }
        (UnaryOperator::Negate, Value::Single(x)) => Value::Single(-x),
        (UnaryOperator::Negate, Value::Double(x)) => Value::Double(-x),
        (UnaryOperator::Negate, Value::Decimal(d)) => Value::Decimal(-*d),
        _ => {
            return Err(EvalError::UnaryTypeMismatch {
                op: op.symbol(),
                operand: operand.kind(),
            })
        }
    };
    Ok(negated)
}
