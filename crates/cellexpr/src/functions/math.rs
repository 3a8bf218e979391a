//! Math functions

use super::Arguments;
use crate::ast::BinaryOperator;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{compare_values, evaluate_binary_op};
use crate::value::{NumericKind, Value, ValueKind};
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;

/// Wrap a floating result, rejecting NaN and infinities
fn finite(args: &Arguments<'_>, x: f64) -> EvalResult<Value> {
    if x.is_nan() {
        Err(args.invalid("result is not a number"))
    } else if x.is_infinite() {
        Err(EvalError::Overflow("function result"))
    } else {
        Ok(Value::Double(x))
    }
}

/// SUM(number1, ...)
pub fn fn_sum(args: &Arguments<'_>) -> EvalResult<Value> {
    let mut sum = Value::Int32(0);
    for index in 0..args.len() {
        let value = args.number(index)?;
        sum = evaluate_binary_op(BinaryOperator::Add, sum, value)?;
    }
    Ok(sum)
}

/// SIGN(number)
pub fn fn_sign(args: &Arguments<'_>) -> EvalResult<Value> {
    let sign = match args.number(0)? {
        Value::Int32(n) => n.signum(),
        Value::Decimal(d) if d.is_zero() => 0,
        Value::Decimal(d) if d.is_sign_negative() => -1,
        Value::Decimal(_) => 1,
        other => {
            let x = other.as_f64().unwrap_or(f64::NAN);
            if x.is_nan() {
                return Err(args.invalid("argument is not a number"));
            }
            if x == 0.0 {
                0
            } else if x < 0.0 {
                -1
            } else {
                1
            }
        }
    };
    Ok(Value::Int32(sign))
}

/// ABS(number)
pub fn fn_abs(args: &Arguments<'_>) -> EvalResult<Value> {
    match args.number(0)? {
        Value::Int32(n) => n
            .checked_abs()
            .map(Value::Int32)
            .ok_or(EvalError::Overflow("ABS")),
        Value::Single(x) => Ok(Value::Single(x.abs())),
        Value::Double(x) => Ok(Value::Double(x.abs())),
        Value::Decimal(d) => Ok(Value::Decimal(d.abs())),
        other => Err(args.type_error(0, "a number", other.kind())),
    }
}

/// Shared MIN/MAX: numbers (widened to their common kind), or dates, or durations
fn extremum(args: &Arguments<'_>, keep: Ordering) -> EvalResult<Value> {
    let mut best: Option<Value> = None;
    let mut numeric: Option<NumericKind> = None;

    for (index, value) in args.values()?.into_iter().enumerate() {
        if !value.is_numeric()
            && !matches!(value.kind(), ValueKind::DateTime | ValueKind::Duration)
        {
            return Err(args.type_error(index, "a number, date or duration", value.kind()));
        }
        if let Some(kind) = value.numeric_kind() {
            numeric = Some(numeric.map_or(kind, |k| k.widen(kind)));
        }

        best = match best {
            None => Some(value),
            Some(current) => {
                let ordering = compare_values(BinaryOperator::LessThan, &value, &current)
                    .map_err(|_| {
                        args.type_error(index, "comparable with the other arguments", value.kind())
                    })?;
                if ordering == Some(keep) {
                    Some(value)
                } else {
                    Some(current)
                }
            }
        };
    }

    let best = best.ok_or_else(|| args.invalid("requires at least one argument"))?;
    match numeric {
        Some(kind) => best
            .widen_to(kind)
            .ok_or_else(|| args.invalid("cannot combine these numeric kinds")),
        None => Ok(best),
    }
}

/// MIN(value1, ...)
pub fn fn_min(args: &Arguments<'_>) -> EvalResult<Value> {
    extremum(args, Ordering::Less)
}

/// MAX(value1, ...)
pub fn fn_max(args: &Arguments<'_>) -> EvalResult<Value> {
    extremum(args, Ordering::Greater)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RoundMode {
    /// Half away from zero
    Nearest,
    TowardZero,
}

fn pow10(digits: u32) -> Option<i64> {
    10i64.checked_pow(digits)
}

/// ROUND / TRUNC keeping the numeric kind of the argument
fn round_digits(args: &Arguments<'_>, mode: RoundMode) -> EvalResult<Value> {
    let value = args.number(0)?;
    let digits = if args.len() > 1 { args.i32(1)? } else { 0 };

    match value {
        Value::Int32(n) if digits >= 0 => Ok(Value::Int32(n)),
        Value::Int32(n) => {
            let Some(factor) = pow10(digits.unsigned_abs()) else {
                return Ok(Value::Int32(0));
            };
            let n = i64::from(n);
            let mut q = n / factor;
            if mode == RoundMode::Nearest && (n % factor).abs() * 2 >= factor {
                q += n.signum();
            }
            i32::try_from(q * factor)
                .map(Value::Int32)
                .map_err(|_| EvalError::Overflow(round_name(mode)))
        }
        Value::Decimal(d) => {
            let strategy = match mode {
                RoundMode::Nearest => RoundingStrategy::MidpointAwayFromZero,
                RoundMode::TowardZero => RoundingStrategy::ToZero,
            };
            if digits >= 0 {
                return Ok(Value::Decimal(d.round_dp_with_strategy(digits as u32, strategy)));
            }
            let factor = pow10(digits.unsigned_abs())
                .map(Decimal::from)
                .ok_or(EvalError::Overflow(round_name(mode)))?;
            let scaled = (d / factor).round_dp_with_strategy(0, strategy);
            scaled
                .checked_mul(factor)
                .map(Value::Decimal)
                .ok_or(EvalError::Overflow(round_name(mode)))
        }
        Value::Single(x) => Ok(Value::Single(round_float(f64::from(x), digits, mode) as f32)),
        Value::Double(x) => Ok(Value::Double(round_float(x, digits, mode))),
        other => Err(args.type_error(0, "a number", other.kind())),
    }
}

fn round_name(mode: RoundMode) -> &'static str {
    match mode {
        RoundMode::Nearest => "ROUND",
        RoundMode::TowardZero => "TRUNC",
    }
}

fn round_float(x: f64, digits: i32, mode: RoundMode) -> f64 {
    let apply = |v: f64| match mode {
        RoundMode::Nearest => v.round(),
        RoundMode::TowardZero => v.trunc(),
    };
    // 10^400 is already infinite as f64
    let exponent = digits.unsigned_abs().min(400) as i32;
    let factor = 10f64.powi(exponent);
    if digits < 0 && factor.is_infinite() {
        return if x.is_finite() { apply(x / factor) } else { x };
    }
    let result = if digits >= 0 {
        apply(x * factor) / factor
    } else {
        apply(x / factor) * factor
    };
    if result.is_finite() || !x.is_finite() {
        result
    } else {
        // Scaling overflowed; the value has no digits that fine anyway
        x
    }
}

/// ROUND(number, [num_digits])
pub fn fn_round(args: &Arguments<'_>) -> EvalResult<Value> {
    round_digits(args, RoundMode::Nearest)
}

/// TRUNC(number, [num_digits])
pub fn fn_trunc(args: &Arguments<'_>) -> EvalResult<Value> {
    round_digits(args, RoundMode::TowardZero)
}

/// FLOOR / CEILING to a multiple of `significance` (default 1)
fn to_multiple(args: &Arguments<'_>, floor: bool) -> EvalResult<Value> {
    let value = args.number(0)?;
    let significance = if args.len() > 1 {
        args.number(1)?
    } else {
        Value::Int32(1)
    };
    let kind = value
        .numeric_kind()
        .zip(significance.numeric_kind())
        .map(|(a, b)| a.widen(b))
        .unwrap_or(NumericKind::Double);

    match (value.widen_to(kind), significance.widen_to(kind)) {
        (Some(Value::Int32(n)), Some(Value::Int32(s))) => {
            if s == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let (n, s) = (i64::from(n), i64::from(s));
            let q = n.div_euclid(s);
            // div_euclid floors for positive s and ceils for negative s
            let q = match (n.rem_euclid(s) == 0, floor, s > 0) {
                (true, _, _) => q,
                (false, true, true) | (false, false, false) => q,
                (false, true, false) => q - 1,
                (false, false, true) => q + 1,
            };
            i32::try_from(q * s)
                .map(Value::Int32)
                .map_err(|_| EvalError::Overflow(multiple_name(floor)))
        }
        (Some(Value::Decimal(n)), Some(Value::Decimal(s))) => {
            if s.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            let q = n
                .checked_div(s)
                .ok_or(EvalError::Overflow(multiple_name(floor)))?;
            let q = if floor { q.floor() } else { q.ceil() };
            q.checked_mul(s)
                .map(Value::Decimal)
                .ok_or(EvalError::Overflow(multiple_name(floor)))
        }
        _ => {
            let (Some(n), Some(s)) = (value.as_f64(), significance.as_f64()) else {
                return Err(args.type_error(0, "a number", value.kind()));
            };
            if s == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let q = n / s;
            let q = if floor { q.floor() } else { q.ceil() };
            match kind {
                NumericKind::Single => Ok(Value::Single((q * s) as f32)),
                _ => finite(args, q * s),
            }
        }
    }
}

fn multiple_name(floor: bool) -> &'static str {
    if floor {
        "FLOOR"
    } else {
        "CEILING"
    }
}

/// FLOOR(number, [significance])
pub fn fn_floor(args: &Arguments<'_>) -> EvalResult<Value> {
    to_multiple(args, true)
}

/// CEILING(number, [significance])
pub fn fn_ceiling(args: &Arguments<'_>) -> EvalResult<Value> {
    to_multiple(args, false)
}

/// POWER(number, power)
pub fn fn_power(args: &Arguments<'_>) -> EvalResult<Value> {
    let base = args.f64(0)?;
    let exponent = args.f64(1)?;
    if base == 0.0 && exponent < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    finite(args, base.powf(exponent))
}

/// SQRT(number)
pub fn fn_sqrt(args: &Arguments<'_>) -> EvalResult<Value> {
    let x = args.f64(0)?;
    if x < 0.0 {
        return Err(args.invalid(format!("cannot take the square root of {x}")));
    }
    finite(args, x.sqrt())
}

/// PI()
pub fn fn_pi(_args: &Arguments<'_>) -> EvalResult<Value> {
    Ok(Value::Double(std::f64::consts::PI))
}

/// DEGREES(angle)
pub fn fn_degrees(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, args.f64(0)?.to_degrees())
}

/// RADIANS(angle)
pub fn fn_radians(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, args.f64(0)?.to_radians())
}

/// SIN(number)
pub fn fn_sin(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, args.f64(0)?.sin())
}

/// COS(number)
pub fn fn_cos(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, args.f64(0)?.cos())
}

/// TAN(number)
pub fn fn_tan(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, args.f64(0)?.tan())
}

fn unit_interval(args: &Arguments<'_>) -> EvalResult<f64> {
    let x = args.f64(0)?;
    if !(-1.0..=1.0).contains(&x) {
        return Err(args.invalid(format!("{x} is outside [-1, 1]")));
    }
    Ok(x)
}

/// ASIN(number)
pub fn fn_asin(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, unit_interval(args)?.asin())
}

/// ACOS(number)
pub fn fn_acos(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, unit_interval(args)?.acos())
}

/// ATAN(number)
pub fn fn_atan(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, args.f64(0)?.atan())
}

/// ATAN2(x_num, y_num)
pub fn fn_atan2(args: &Arguments<'_>) -> EvalResult<Value> {
    let x = args.f64(0)?;
    let y = args.f64(1)?;
    if x == 0.0 && y == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    finite(args, y.atan2(x))
}

/// EXP(number)
pub fn fn_exp(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, args.f64(0)?.exp())
}

fn positive(args: &Arguments<'_>, index: usize) -> EvalResult<f64> {
    let x = args.f64(index)?;
    if x <= 0.0 {
        return Err(args.invalid(format!("logarithm of non-positive number {x}")));
    }
    Ok(x)
}

/// LN(number)
pub fn fn_ln(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, positive(args, 0)?.ln())
}

/// LOG10(number)
pub fn fn_log10(args: &Arguments<'_>) -> EvalResult<Value> {
    finite(args, positive(args, 0)?.log10())
}

/// LOG(number, [base])
pub fn fn_log(args: &Arguments<'_>) -> EvalResult<Value> {
    let x = positive(args, 0)?;
    let base = if args.len() > 1 { positive(args, 1)? } else { 10.0 };
    if base == 1.0 {
        return Err(EvalError::DivisionByZero);
    }
    finite(args, x.ln() / base.ln())
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::evaluate;
    use crate::value::Value;
    use rust_decimal::Decimal;

    fn assert_approx(formula: &str, expected: f64) {
        match evaluate(formula).unwrap() {
            Value::Double(x) => assert!(
                (x - expected).abs() < 1e-9,
                "{formula}: expected {expected}, got {x}"
            ),
            other => panic!("{formula}: expected Double, got {other:?}"),
        }
    }

    fn eval_err(formula: &str) -> EvalError {
        match evaluate(formula) {
            Err(crate::FormulaError::Eval(e)) => e,
            other => panic!("{formula}: expected evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn test_sum() {
        assert_eq!(evaluate("SUM(1,2,3,4,5)").unwrap(), Value::Int32(15));
        assert_eq!(evaluate("SUM(1,2.5)").unwrap(), Value::Double(3.5));
        assert!(matches!(
            eval_err("SUM(1,\"a\")"),
            EvalError::ArgumentType { position: 2, .. }
        ));
    }

    #[test]
    fn test_sign_abs() {
        assert_eq!(evaluate("SIGN(-7)").unwrap(), Value::Int32(-1));
        assert_eq!(evaluate("SIGN(0)").unwrap(), Value::Int32(0));
        assert_eq!(evaluate("SIGN(2.5)").unwrap(), Value::Int32(1));
        assert_eq!(evaluate("ABS(-7)").unwrap(), Value::Int32(7));
        assert_eq!(evaluate("ABS(-2.5)").unwrap(), Value::Double(2.5));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(evaluate("MIN(3,1,2)").unwrap(), Value::Int32(1));
        assert_eq!(evaluate("MAX(3,1,2)").unwrap(), Value::Int32(3));
        assert_eq!(evaluate("MAX(1,2.5)").unwrap(), Value::Double(2.5));
        assert_eq!(evaluate("MAX(3,2.5)").unwrap(), Value::Double(3.0));
        assert_eq!(evaluate("MAX(MIN(1,3),MIN(2,4))").unwrap(), Value::Int32(2));
        assert_eq!(
            evaluate("MAX(DATE(2022,1,1),DATE(2023,1,1))").unwrap().to_string(),
            "2023-01-01 00:00:00"
        );
        assert!(evaluate("MAX(1,DATE(2022,1,1))").is_err());
        assert!(evaluate("MIN(\"a\")").is_err());
    }

    #[test]
    fn test_round_trunc() {
        assert_eq!(evaluate("ROUND(2.5)").unwrap(), Value::Double(3.0));
        assert_eq!(evaluate("ROUND(-2.5)").unwrap(), Value::Double(-3.0));
        assert_approx("ROUND(3.14159,2)", 3.14);
        assert_eq!(evaluate("ROUND(1250,-2)").unwrap(), Value::Int32(1300));
        assert_eq!(evaluate("ROUND(-1250,-2)").unwrap(), Value::Int32(-1300));
        assert_eq!(evaluate("ROUND(1249,-2)").unwrap(), Value::Int32(1200));
        assert_eq!(evaluate("ROUND(7,2)").unwrap(), Value::Int32(7));
        assert_approx("ROUND(1234.5,-2)", 1200.0);

        assert_eq!(evaluate("TRUNC(2.9)").unwrap(), Value::Double(2.0));
        assert_eq!(evaluate("TRUNC(-2.9)").unwrap(), Value::Double(-2.0));
        assert_approx("TRUNC(3.14159,3)", 3.141);
        assert_eq!(evaluate("TRUNC(1299,-2)").unwrap(), Value::Int32(1200));
    }

    #[test]
    fn test_round_extreme_digits() {
        assert_eq!(evaluate("ROUND(2.5,-2147483648)").unwrap(), Value::Double(0.0));
        assert_eq!(evaluate("TRUNC(-2.5,-400)").unwrap(), Value::Double(0.0));
        assert_eq!(evaluate("ROUND(2.5,2147483647)").unwrap(), Value::Double(2.5));
        assert_eq!(evaluate("ROUND(1250,-2147483648)").unwrap(), Value::Int32(0));
    }

    #[test]
    fn test_round_decimal() {
        use crate::{EngineOptions, NumericOptions, ParserList};

        let numeric = NumericOptions::default()
            .with_decimal(true)
            .with_double(false);
        let parser = ParserList::with_options(EngineOptions::default().with_numeric(numeric));
        let expr = parser.parse_formula("ROUND(2.345,2)").unwrap();
        assert_eq!(expr.calc().unwrap(), Value::Decimal(Decimal::new(235, 2)));
        let expr = parser.parse_formula("TRUNC(2.345,2)").unwrap();
        assert_eq!(expr.calc().unwrap(), Value::Decimal(Decimal::new(234, 2)));
    }

    #[test]
    fn test_floor_ceiling() {
        assert_eq!(evaluate("FLOOR(2.7)").unwrap(), Value::Double(2.0));
        assert_eq!(evaluate("CEILING(2.2)").unwrap(), Value::Double(3.0));
        assert_eq!(evaluate("FLOOR(-2.5)").unwrap(), Value::Double(-3.0));
        assert_eq!(evaluate("CEILING(-2.5)").unwrap(), Value::Double(-2.0));
        assert_eq!(evaluate("FLOOR(17,5)").unwrap(), Value::Int32(15));
        assert_eq!(evaluate("CEILING(17,5)").unwrap(), Value::Int32(20));
        assert_eq!(evaluate("CEILING(15,5)").unwrap(), Value::Int32(15));
        assert_eq!(evaluate("FLOOR(-17,5)").unwrap(), Value::Int32(-20));
        assert_eq!(evaluate("CEILING(-17,5)").unwrap(), Value::Int32(-15));
        assert_eq!(eval_err("FLOOR(3,0)"), EvalError::DivisionByZero);
    }

    #[test]
    fn test_floor_ceiling_decimal() {
        use crate::{EngineOptions, FormulaError, NumericOptions, ParserList};

        let numeric = NumericOptions::default()
            .with_decimal(true)
            .with_double(false);
        let parser = ParserList::with_options(EngineOptions::default().with_numeric(numeric));
        assert_eq!(
            parser.evaluate("FLOOR(2.7,0.5)").unwrap(),
            Value::Decimal(Decimal::new(25, 1))
        );
        assert_eq!(
            parser.evaluate("FLOOR(79228162514264337593543950335,0.5)"),
            Err(FormulaError::Eval(EvalError::Overflow("FLOOR")))
        );
        assert_eq!(
            parser.evaluate("CEILING(79228162514264337593543950335,0.5)"),
            Err(FormulaError::Eval(EvalError::Overflow("CEILING")))
        );
    }

    #[test]
    fn test_power_sqrt() {
        assert_approx("POWER(2,10)", 1024.0);
        assert_approx("POWER(4,0.5)", 2.0);
        assert_approx("SQRT(16)", 4.0);
        assert!(matches!(eval_err("SQRT(-1)"), EvalError::InvalidArgument { .. }));
        assert_eq!(eval_err("POWER(0,-1)"), EvalError::DivisionByZero);
    }

    #[test]
    fn test_trig() {
        assert_approx("PI()", std::f64::consts::PI);
        assert_approx("DEGREES(PI())", 180.0);
        assert_approx("RADIANS(180)", std::f64::consts::PI);
        assert_approx("SIN(0)", 0.0);
        assert_approx("COS(0)", 1.0);
        assert_approx("TAN(0)", 0.0);
        assert_approx("ASIN(1)", std::f64::consts::FRAC_PI_2);
        assert_approx("ACOS(1)", 0.0);
        assert_approx("ATAN(1)", std::f64::consts::FRAC_PI_4);
        assert_approx("ATAN2(1,1)", std::f64::consts::FRAC_PI_4);
        assert_approx("ATAN2(-1,0)", std::f64::consts::PI);
        assert!(evaluate("ASIN(2)").is_err());
        assert_eq!(eval_err("ATAN2(0,0)"), EvalError::DivisionByZero);
    }

    #[test]
    fn test_logs() {
        assert_approx("EXP(0)", 1.0);
        assert_approx("LN(EXP(2))", 2.0);
        assert_approx("LOG10(1000)", 3.0);
        assert_approx("LOG(100)", 2.0);
        assert_approx("LOG(8,2)", 3.0);
        assert!(evaluate("LN(0)").is_err());
        assert!(evaluate("LOG(-1)").is_err());
        assert_eq!(eval_err("LOG(5,1)"), EvalError::DivisionByZero);
    }
}
