//! Property tests and cross-thread use

use cellexpr::{default_pipeline, parse_formula, ParserList, Value};
use proptest::prelude::*;
use std::sync::Arc;

proptest! {
    #[test]
    fn reparsing_is_deterministic(a in -1000i32..1000, b in -1000i32..1000, c in 1i32..100) {
        let formula = format!("({a}+{b})*{c}-MAX({a},{b})/{c}");
        let parser = ParserList::standard();
        let first = parser.parse_formula(&formula).unwrap();
        let second = parser.parse_formula(&formula).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.calc().unwrap(), second.calc().unwrap());
    }

    #[test]
    fn integer_arithmetic_matches_rust(
        a in -1000i32..1000,
        b in -1000i32..1000,
        c in -1000i32..1000,
    ) {
        let value = parse_formula(&format!("{a}+{b}*{c}")).unwrap().calc().unwrap();
        prop_assert_eq!(value, Value::Int32(a + b * c));

        let value = parse_formula(&format!("{a}-{b}-{c}")).unwrap().calc().unwrap();
        prop_assert_eq!(value, Value::Int32(a - b - c));
    }

    #[test]
    fn comparisons_match_rust(a in any::<i32>(), b in any::<i32>()) {
        let value = parse_formula(&format!("{a}<{b}")).unwrap().calc().unwrap();
        prop_assert_eq!(value, Value::Boolean(a < b));

        let value = parse_formula(&format!("{a}>={b}")).unwrap().calc().unwrap();
        prop_assert_eq!(value, Value::Boolean(a >= b));
    }

    #[test]
    fn string_literals_survive(s in "[a-z \"(),+]{0,12}") {
        let formula = format!("\"{}\"", s.replace('"', "\"\""));
        let value = parse_formula(&formula).unwrap().calc().unwrap();
        prop_assert_eq!(value, Value::String(s));
    }
}

#[test]
fn test_shared_pipeline_and_tree_across_threads() {
    let pipeline = default_pipeline();
    let expr = Arc::new(pipeline.parse_formula("SUM(1,2,3)*(4-1)").unwrap());

    std::thread::scope(|scope| {
        for i in 0..4 {
            let expr = Arc::clone(&expr);
            scope.spawn(move || {
                assert_eq!(expr.calc().unwrap(), Value::Int32(18));
                let own = pipeline.parse_formula(&format!("{i}+1")).unwrap();
                assert_eq!(own.calc().unwrap(), Value::Int32(i + 1));
            });
        }
    });
}
