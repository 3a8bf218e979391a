//! Logical functions
//!
//! `IF`, `CHOOSE`, `AND` and `OR` evaluate only the arguments they need.

use super::Arguments;
use crate::error::EvalResult;
use crate::value::Value;

/// TRUE()
pub fn fn_true(_args: &Arguments<'_>) -> EvalResult<Value> {
    Ok(Value::Boolean(true))
}

/// FALSE()
pub fn fn_false(_args: &Arguments<'_>) -> EvalResult<Value> {
    Ok(Value::Boolean(false))
}

/// AND(logical1, ...)
pub fn fn_and(args: &Arguments<'_>) -> EvalResult<Value> {
    for index in 0..args.len() {
        if !args.boolean(index)? {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

/// OR(logical1, ...)
pub fn fn_or(args: &Arguments<'_>) -> EvalResult<Value> {
    for index in 0..args.len() {
        if args.boolean(index)? {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

/// NOT(logical)
pub fn fn_not(args: &Arguments<'_>) -> EvalResult<Value> {
    Ok(Value::Boolean(!args.boolean(0)?))
}

/// IF(condition, value_if_true, [value_if_false])
pub fn fn_if(args: &Arguments<'_>) -> EvalResult<Value> {
    if args.boolean(0)? {
        args.value(1)
    } else {
        Ok(args.optional(2)?.unwrap_or(Value::Boolean(false)))
    }
}

/// CHOOSE(index_num, value1, ...)
pub fn fn_choose(args: &Arguments<'_>) -> EvalResult<Value> {
    let index = args.i32(0)?;
    let choices = args.len().saturating_sub(1);
    match usize::try_from(index) {
        Ok(i) if (1..=choices).contains(&i) => args.value(i),
        _ => Err(args.invalid(format!("index {index} is outside 1..{choices}"))),
    }
}
