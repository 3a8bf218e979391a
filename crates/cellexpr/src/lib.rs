//! # cellexpr
//!
//! Spreadsheet-style formula parser and evaluator.
//!
//! This crate provides:
//! - A multi-pass tokenizer built from independent recognizers
//! - Operator-precedence parsing with grouping and unary signs
//! - Typed values with strict cross-type operator semantics
//! - A catalog of built-in functions (math, text, logical, date/time)
//! - Parse errors pinned to the offending span of the formula
//!
//! ## Example
//!
//! ```rust
//! use cellexpr::{evaluate, parse_formula, Value};
//!
//! assert_eq!(evaluate("1+2*3").unwrap(), Value::Int32(7));
//!
//! let expr = parse_formula("MAX(MIN(1,3),MIN(2,4))").unwrap();
//! assert_eq!(expr.calc().unwrap(), Value::Int32(2));
//!
//! let err = parse_formula("MIN(1,,2)").unwrap_err();
//! assert_eq!(err.to_string(), "Missing argument 2 in call to MIN at positions 1-9");
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod options;
pub mod parser;
pub mod parsing_data;
pub mod token;
pub mod value;

pub use ast::{BinaryOperator, Expression, UnaryOperator};
pub use error::{EvalError, EvalResult, FormulaError, FormulaResult, ParseError, ParseErrorKind};
pub use functions::{Arguments, FunctionCatalog, FunctionDef};
pub use options::{EngineOptions, FunctionOptions, NumericOptions};
pub use parser::{default_pipeline, evaluate, parse_formula, ParserList, Recognizer};
pub use parsing_data::ParsingData;
pub use token::{Span, Token};
pub use value::{NumericKind, Value, ValueKind};
