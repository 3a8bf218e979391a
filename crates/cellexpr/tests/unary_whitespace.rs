//! Whitespace around unary signs
//!
//! A sign opening an expression may be separated from its operand. A sign
//! after a binary operator must touch that operator.

use cellexpr::{parse_formula, ParseErrorKind, Value};

const ACCEPTED: &[(&str, i32)] = &[
    ("-1", -1),
    ("- 1", -1),
    (" -1", -1),
    ("  -  1 + 2", 1),
    ("(-1)", -1),
    ("( - 1)", -1),
    ("(- 1) * 2", -2),
    ("MAX(- 1, -2)", -1),
    ("MAX( -1 ,- 2)", -1),
    ("2*-1", -2),
    ("2 *-1", -2),
    ("2*- 1", -2),
    ("2 *- 1", -2),
    ("2--1", 3),
    ("2 --1", 3),
    ("2 -- 1", 3),
    ("2+-(1+1)", 0),
    ("-(1+1)", -2),
    ("- (1+1)", -2),
    ("+1", 1),
    ("+ 1", 1),
    ("1++1", 2),
];

const REJECTED: &[(&str, ParseErrorKind)] = &[
    ("2* -1", ParseErrorKind::DuplicateOperator),
    ("2 * -1", ParseErrorKind::DuplicateOperator),
    ("2- -1", ParseErrorKind::DuplicateOperator),
    ("2 - - 1", ParseErrorKind::DuplicateOperator),
    ("--1", ParseErrorKind::DuplicateOperator),
    ("- -1", ParseErrorKind::DuplicateOperator),
    ("2---1", ParseErrorKind::DuplicateOperator),
    ("2*/1", ParseErrorKind::DuplicateOperator),
    ("2<>=1", ParseErrorKind::DuplicateOperator),
    ("*1", ParseErrorKind::MissingOperand),
    ("(/1)", ParseErrorKind::MissingOperand),
    ("= 1", ParseErrorKind::MissingOperand),
    ("1 -", ParseErrorKind::MissingOperand),
    ("1 +-", ParseErrorKind::MissingOperand),
    ("1+ +1", ParseErrorKind::DuplicateOperator),
];

#[test]
fn test_accepted_sign_placements() {
    for &(formula, expected) in ACCEPTED {
        let value = parse_formula(formula)
            .unwrap_or_else(|e| panic!("{formula:?} should parse: {e}"))
            .calc()
            .unwrap_or_else(|e| panic!("{formula:?} should evaluate: {e}"));
        assert_eq!(value, Value::Int32(expected), "{formula:?}");
    }
}

#[test]
fn test_rejected_sign_placements() {
    for &(formula, kind) in REJECTED {
        match parse_formula(formula) {
            Ok(expr) => panic!("{formula:?} should be rejected, parsed as {expr}"),
            Err(err) => assert_eq!(err.kind, kind, "{formula:?}: {err}"),
        }
    }
}
