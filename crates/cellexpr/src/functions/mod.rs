//! Built-in functions
//!
//! The catalog maps names to [`FunctionDef`]s. The function recognizer only
//! claims `NAME(...)` when `NAME` is registered here, so name validation and
//! recognition happen in one step; arity is checked at parse time.

pub mod date;
pub mod logical;
pub mod math;
pub mod text;

use crate::ast::Expression;
use crate::error::{EvalError, EvalResult};
use crate::value::{Value, ValueKind};
use ahash::AHashMap;
use chrono::{Duration, NaiveDateTime};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Function implementation signature
///
/// Arguments are handed over unevaluated so that functions such as `IF`
/// compute only the branch they select.
pub type FunctionImpl = fn(&Arguments<'_>) -> EvalResult<Value>;

/// Function definition
pub struct FunctionDef {
    /// Function name as registered
    pub name: String,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Arity in words, e.g. `2`, `1 to 3`, `1 or more`
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("{} or more", self.min_args),
        }
    }

    /// Evaluate a call with the given argument expressions
    pub fn call(&self, args: &[Expression]) -> EvalResult<Value> {
        (self.implementation)(&Arguments::new(&self.name, args))
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

/// Two definitions are the same function when name and arity agree
impl PartialEq for FunctionDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.min_args == other.min_args
            && self.max_args == other.max_args
    }
}

/// Lazily evaluated arguments of one call
pub struct Arguments<'a> {
    function: &'a str,
    exprs: &'a [Expression],
}

impl<'a> Arguments<'a> {
    pub fn new(function: &'a str, exprs: &'a [Expression]) -> Self {
        Self { function, exprs }
    }

    pub fn function(&self) -> &str {
        self.function
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Evaluate argument `index` (0-based)
    pub fn value(&self, index: usize) -> EvalResult<Value> {
        match self.exprs.get(index) {
            Some(expr) => expr.calc(),
            None => Err(self.invalid(format!("missing argument {}", index + 1))),
        }
    }

    /// Evaluate argument `index` if it was supplied
    pub fn optional(&self, index: usize) -> EvalResult<Option<Value>> {
        self.exprs.get(index).map(Expression::calc).transpose()
    }

    /// Evaluate every argument, left to right
    pub fn values(&self) -> EvalResult<Vec<Value>> {
        self.exprs.iter().map(Expression::calc).collect()
    }

    pub fn type_error(&self, index: usize, expected: &'static str, actual: ValueKind) -> EvalError {
        EvalError::ArgumentType {
            function: self.function.to_string(),
            position: index + 1,
            expected,
            actual,
        }
    }

    pub fn invalid(&self, message: impl Into<String>) -> EvalError {
        EvalError::invalid(self.function, message)
    }

    /// Argument `index` as any numeric value
    pub fn number(&self, index: usize) -> EvalResult<Value> {
        let value = self.value(index)?;
        if value.is_numeric() {
            Ok(value)
        } else {
            Err(self.type_error(index, "a number", value.kind()))
        }
    }

    pub fn f64(&self, index: usize) -> EvalResult<f64> {
        let value = self.value(index)?;
        value
            .as_f64()
            .ok_or_else(|| self.type_error(index, "a number", value.kind()))
    }

    /// Argument `index` as a whole number
    pub fn i32(&self, index: usize) -> EvalResult<i32> {
        let value = self.value(index)?;
        if !value.is_numeric() {
            return Err(self.type_error(index, "a whole number", value.kind()));
        }
        value.as_i32().ok_or_else(|| {
            self.invalid(format!(
                "argument {} must be a whole number, got {value}",
                index + 1
            ))
        })
    }

    pub fn text(&self, index: usize) -> EvalResult<String> {
        match self.value(index)? {
            Value::String(s) => Ok(s),
            other => Err(self.type_error(index, "a string", other.kind())),
        }
    }

    pub fn boolean(&self, index: usize) -> EvalResult<bool> {
        let value = self.value(index)?;
        value
            .as_bool()
            .ok_or_else(|| self.type_error(index, "a boolean", value.kind()))
    }

    pub fn date_time(&self, index: usize) -> EvalResult<NaiveDateTime> {
        let value = self.value(index)?;
        value
            .as_date_time()
            .ok_or_else(|| self.type_error(index, "a date", value.kind()))
    }

    pub fn duration(&self, index: usize) -> EvalResult<Duration> {
        let value = self.value(index)?;
        value
            .as_duration()
            .ok_or_else(|| self.type_error(index, "a duration", value.kind()))
    }
}

/// Function catalog
#[derive(Debug, Clone)]
pub struct FunctionCatalog {
    functions: AHashMap<String, Arc<FunctionDef>>,
    case_sensitive: bool,
}

impl FunctionCatalog {
    /// Create an empty catalog
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            functions: AHashMap::new(),
            case_sensitive,
        }
    }

    /// Create a catalog with all built-in functions
    pub fn with_builtins(case_sensitive: bool) -> Self {
        let mut catalog = Self::new(case_sensitive);

        catalog.register_math_functions();
        catalog.register_text_functions();
        catalog.register_logical_functions();
        catalog.register_date_functions();

        catalog
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn key<'n>(&self, name: &'n str) -> Cow<'n, str> {
        if self.case_sensitive {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(name.to_uppercase())
        }
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&Arc<FunctionDef>> {
        self.functions.get(self.key(name).as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function, replacing any previous one of the same name
    pub fn register(&mut self, def: FunctionDef) {
        let key = self.key(&def.name).into_owned();
        self.functions.insert(key, Arc::new(def));
    }

    /// Register `name` with its arity bounds (`max_args = None` is unbounded)
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) {
        self.register(FunctionDef {
            name: name.into(),
            min_args,
            max_args,
            implementation,
        });
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// All definitions, sorted by name
    pub fn definitions(&self) -> Vec<&Arc<FunctionDef>> {
        let mut defs: Vec<_> = self.functions.values().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    fn register_math_functions(&mut self) {
        self.add_function("SUM", 1, None, math::fn_sum);
        self.add_function("SIGN", 1, Some(1), math::fn_sign);
        self.add_function("ABS", 1, Some(1), math::fn_abs);
        self.add_function("MIN", 1, None, math::fn_min);
        self.add_function("MAX", 1, None, math::fn_max);

        // Rounding
        self.add_function("ROUND", 1, Some(2), math::fn_round);
        self.add_function("TRUNC", 1, Some(2), math::fn_trunc);
        self.add_function("FLOOR", 1, Some(2), math::fn_floor);
        self.add_function("CEILING", 1, Some(2), math::fn_ceiling);

        self.add_function("POWER", 2, Some(2), math::fn_power);
        self.add_function("SQRT", 1, Some(1), math::fn_sqrt);
        self.add_function("PI", 0, Some(0), math::fn_pi);
        self.add_function("DEGREES", 1, Some(1), math::fn_degrees);
        self.add_function("RADIANS", 1, Some(1), math::fn_radians);

        // Trigonometry
        self.add_function("SIN", 1, Some(1), math::fn_sin);
        self.add_function("COS", 1, Some(1), math::fn_cos);
        self.add_function("TAN", 1, Some(1), math::fn_tan);
        self.add_function("ASIN", 1, Some(1), math::fn_asin);
        self.add_function("ACOS", 1, Some(1), math::fn_acos);
        self.add_function("ATAN", 1, Some(1), math::fn_atan);
        self.add_function("ATAN2", 2, Some(2), math::fn_atan2);

        // Exponentials and logarithms
        self.add_function("EXP", 1, Some(1), math::fn_exp);
        self.add_function("LN", 1, Some(1), math::fn_ln);
        self.add_function("LOG10", 1, Some(1), math::fn_log10);
        self.add_function("LOG", 1, Some(2), math::fn_log);
    }

    fn register_text_functions(&mut self) {
        self.add_function("LEN", 1, Some(1), text::fn_len);
        self.add_function("LEFT", 1, Some(2), text::fn_left);
        self.add_function("RIGHT", 1, Some(2), text::fn_right);
        self.add_function("LOWER", 1, Some(1), text::fn_lower);
        self.add_function("UPPER", 1, Some(1), text::fn_upper);
        self.add_function("CONCATENATE", 1, None, text::fn_concatenate);
        self.add_function("REPLACE", 4, Some(4), text::fn_replace);
        self.add_function("SUBSTITUTE", 3, Some(4), text::fn_substitute);
    }

    fn register_logical_functions(&mut self) {
        self.add_function("TRUE", 0, Some(0), logical::fn_true);
        self.add_function("FALSE", 0, Some(0), logical::fn_false);
        self.add_function("AND", 1, None, logical::fn_and);
        self.add_function("OR", 1, None, logical::fn_or);
        self.add_function("NOT", 1, Some(1), logical::fn_not);
        self.add_function("IF", 2, Some(3), logical::fn_if);
        self.add_function("CHOOSE", 2, None, logical::fn_choose);
    }

    fn register_date_functions(&mut self) {
        self.add_function("DATE", 3, Some(3), date::fn_date);
        self.add_function("TIME", 3, Some(3), date::fn_time);
        self.add_function("YEAR", 1, Some(1), date::fn_year);
        self.add_function("MONTH", 1, Some(1), date::fn_month);
        self.add_function("DAY", 1, Some(1), date::fn_day);
        self.add_function("HOUR", 1, Some(1), date::fn_hour);
        self.add_function("MINUTE", 1, Some(1), date::fn_minute);
        self.add_function("SECOND", 1, Some(1), date::fn_second);
        self.add_function("WEEKDAY", 1, Some(1), date::fn_weekday);
        self.add_function("DATEDIF", 3, Some(3), date::fn_datedif);
        self.add_function("DAYS", 2, Some(2), date::fn_days);
    }
}

impl Default for FunctionCatalog {
    fn default() -> Self {
        Self::with_builtins(false)
    }
}
