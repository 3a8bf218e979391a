//! Text functions
//!
//! Positions and lengths count characters, not bytes.

use super::Arguments;
use crate::error::{EvalError, EvalResult};
use crate::value::Value;

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

/// Optional non-negative character count at `index`, default 1
fn char_count(args: &Arguments<'_>, index: usize) -> EvalResult<usize> {
    if args.len() <= index {
        return Ok(1);
    }
    let n = args.i32(index)?;
    usize::try_from(n).map_err(|_| args.invalid(format!("character count {n} is negative")))
}

/// LEN(text)
pub fn fn_len(args: &Arguments<'_>) -> EvalResult<Value> {
    let s = args.text(0)?;
    i32::try_from(s.chars().count())
        .map(Value::Int32)
        .map_err(|_| EvalError::Overflow("LEN"))
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &Arguments<'_>) -> EvalResult<Value> {
    let s = args.text(0)?;
    let n = char_count(args, 1)?;
    Ok(Value::String(take_left(&s, n)))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &Arguments<'_>) -> EvalResult<Value> {
    let s = args.text(0)?;
    let n = char_count(args, 1)?;
    Ok(Value::String(take_right(&s, n)))
}

/// LOWER(text)
pub fn fn_lower(args: &Arguments<'_>) -> EvalResult<Value> {
    Ok(Value::String(args.text(0)?.to_lowercase()))
}

/// UPPER(text)
pub fn fn_upper(args: &Arguments<'_>) -> EvalResult<Value> {
    Ok(Value::String(args.text(0)?.to_uppercase()))
}

/// CONCATENATE(value1, ...)
///
/// Non-string values are joined in their display form.
pub fn fn_concatenate(args: &Arguments<'_>) -> EvalResult<Value> {
    let mut result = String::new();
    for value in args.values()? {
        match value {
            Value::String(s) => result.push_str(&s),
            other => result.push_str(&other.to_string()),
        }
    }
    Ok(Value::String(result))
}

/// REPLACE(old_text, start_num, num_chars, new_text)
pub fn fn_replace(args: &Arguments<'_>) -> EvalResult<Value> {
    let old = args.text(0)?;
    let start = args.i32(1)?;
    let count = args.i32(2)?;
    let new = args.text(3)?;

    if start < 1 {
        return Err(args.invalid(format!("start position {start} must be at least 1")));
    }
    if count < 0 {
        return Err(args.invalid(format!("character count {count} is negative")));
    }

    let skip = start as usize - 1;
    let mut result: String = old.chars().take(skip).collect();
    result.push_str(&new);
    result.extend(old.chars().skip(skip.saturating_add(count as usize)));
    Ok(Value::String(result))
}

/// SUBSTITUTE(text, old_text, new_text, [instance_num])
pub fn fn_substitute(args: &Arguments<'_>) -> EvalResult<Value> {
    let text = args.text(0)?;
    let old = args.text(1)?;
    let new = args.text(2)?;

    if old.is_empty() {
        return Ok(Value::String(text));
    }

    if args.len() <= 3 {
        return Ok(Value::String(text.replace(&old, &new)));
    }

    let instance = args.i32(3)?;
    if instance < 1 {
        return Err(args.invalid(format!("instance {instance} must be at least 1")));
    }

    match text.match_indices(&old).nth(instance as usize - 1) {
        Some((at, _)) => {
            let mut result = String::with_capacity(text.len() + new.len());
            result.push_str(&text[..at]);
            result.push_str(&new);
            result.push_str(&text[at + old.len()..]);
            Ok(Value::String(result))
        }
        None => Ok(Value::String(text)),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::value::{Value, ValueKind};
    use crate::{evaluate, FormulaError};

    fn text(formula: &str) -> String {
        match evaluate(formula).unwrap() {
            Value::String(s) => s,
            other => panic!("{formula}: expected String, got {other:?}"),
        }
    }

    #[test]
    fn test_len() {
        assert_eq!(evaluate("LEN(\"hello\")").unwrap(), Value::Int32(5));
        assert_eq!(evaluate("LEN(\"\")").unwrap(), Value::Int32(0));
        assert_eq!(evaluate("LEN(\"héllo\")").unwrap(), Value::Int32(5));
        assert!(matches!(
            evaluate("LEN(123)"),
            Err(FormulaError::Eval(EvalError::ArgumentType {
                actual: ValueKind::Int32,
                ..
            }))
        ));
    }

    #[test]
    fn test_left_right() {
        assert_eq!(text("LEFT(\"ABCD\",2)"), "AB");
        assert_eq!(text("LEFT(\"ABCD\")"), "A");
        assert_eq!(text("LEFT(\"ABCD\",5)"), "ABCD");
        assert_eq!(text("LEFT(\"\",2)"), "");
        assert_eq!(text("LEFT(\"ABCD\",0)"), "");
        assert_eq!(text("RIGHT(\"ABCD\",2)"), "CD");
        assert_eq!(text("RIGHT(\"ABCD\")"), "D");
        assert_eq!(text("RIGHT(\"ABCD\",10)"), "ABCD");
        assert_eq!(text("RIGHT(\"\",2)"), "");
        assert!(evaluate("LEFT(\"ABCD\",-1)").is_err());
    }

    #[test]
    fn test_case() {
        assert_eq!(text("LOWER(\"HeLLo\")"), "hello");
        assert_eq!(text("UPPER(\"HeLLo\")"), "HELLO");
    }

    #[test]
    fn test_concatenate() {
        assert_eq!(text("CONCATENATE(\"a\",\"b\",\"c\")"), "abc");
        assert_eq!(text("CONCATENATE(\"n=\",1+2,\" \",TRUE())"), "n=3 TRUE");
    }

    #[test]
    fn test_replace() {
        assert_eq!(text("REPLACE(\"abcdef\",3,2,\"XY\")"), "abXYef");
        assert_eq!(text("REPLACE(\"abc\",10,1,\"Z\")"), "abcZ");
        assert_eq!(text("REPLACE(\"abc\",1,0,\"Z\")"), "Zabc");
        assert!(evaluate("REPLACE(\"abc\",0,1,\"Z\")").is_err());
    }

    #[test]
    fn test_substitute() {
        assert_eq!(text("SUBSTITUTE(\"a-b-c\",\"-\",\"+\")"), "a+b+c");
        assert_eq!(text("SUBSTITUTE(\"a-b-c\",\"-\",\"+\",2)"), "a-b+c");
        assert_eq!(text("SUBSTITUTE(\"a-b-c\",\"-\",\"+\",3)"), "a-b-c");
        assert_eq!(text("SUBSTITUTE(\"abc\",\"\",\"x\")"), "abc");
        assert!(evaluate("SUBSTITUTE(\"abc\",\"a\",\"x\",0)").is_err());
    }
}
