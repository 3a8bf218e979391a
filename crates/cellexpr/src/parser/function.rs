//! Function calls
//!
//! `NAME(arg, ...)` is claimed only when `NAME` is in the catalog, so an
//! unregistered name is left for the unknown-token sweep. Argument count and
//! empty arguments are checked while tokenizing; each argument is parsed by
//! the whole pipeline when the call is built.

use super::{
    glued_to_word, ident_end, is_ident_start, matching_paren, skip_string, Element, ParserList,
    Recognizer,
};
use crate::ast::Expression;
use crate::error::{EvalResult, ParseError, ParseErrorKind};
use crate::functions::{Arguments, FunctionCatalog, FunctionDef};
use crate::options::FunctionOptions;
use crate::parsing_data::ParsingData;
use crate::token::{RecognizerId, Span, Token};
use crate::value::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FunctionParser {
    catalog: FunctionCatalog,
    separators: Vec<String>,
}

impl FunctionParser {
    /// Recognizer over the builtin catalog
    pub fn new(options: FunctionOptions) -> Self {
        let catalog = FunctionCatalog::with_builtins(options.case_sensitive);
        Self::with_catalog(catalog, options.separators)
    }

    pub fn with_catalog(catalog: FunctionCatalog, separators: Vec<String>) -> Self {
        Self {
            catalog,
            separators,
        }
    }

    pub fn catalog(&self) -> &FunctionCatalog {
        &self.catalog
    }

    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        implementation: fn(&Arguments<'_>) -> EvalResult<Value>,
    ) {
        self.catalog.add_function(name, min_args, max_args, implementation);
    }

    /// Length of the longest separator starting at `pos`
    fn separator_at(&self, bytes: &[u8], pos: usize, end: usize) -> Option<usize> {
        self.separators
            .iter()
            .map(String::as_bytes)
            .filter(|sep| !sep.is_empty() && bytes[pos..end].starts_with(sep))
            .map(<[u8]>::len)
            .max()
    }

    /// Split the interior of a call at depth-0 separators
    ///
    /// A blank interior is zero arguments; otherwise every piece is one
    /// argument, blank pieces included.
    fn split_arguments(&self, text: &str, inner: Span) -> Vec<Span> {
        if text[inner.start..inner.end].trim().is_empty() {
            return Vec::new();
        }

        let bytes = text.as_bytes();
        let mut pieces = Vec::new();
        let mut piece_start = inner.start;
        let mut depth = 0usize;
        let mut pos = inner.start;

        while pos < inner.end {
            match bytes[pos] {
                b'"' => {
                    pos = skip_string(text, pos, inner.end);
                    continue;
                }
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ if depth == 0 => {
                    if let Some(len) = self.separator_at(bytes, pos, inner.end) {
                        pieces.push(Span::new(piece_start, pos));
                        pos += len;
                        piece_start = pos;
                        continue;
                    }
                }
                _ => {}
            }
            pos += 1;
        }
        pieces.push(Span::new(piece_start, inner.end));
        pieces
    }

    /// Claim the call whose name spans `start..name_end`; returns where
    /// scanning resumes
    fn claim_call(
        &self,
        data: &mut ParsingData<'_>,
        id: RecognizerId,
        def: &FunctionDef,
        start: usize,
        name_end: usize,
    ) -> usize {
        let text = data.text();
        let end = data.range().end;

        if name_end >= end || text.as_bytes()[name_end] != b'(' {
            let index = data.register(Token::new(Span::new(start, name_end), id));
            data.set_error(
                index,
                ParseErrorKind::MissingOpeningParenthesis,
                format!("Missing '(' after function {}", def.name),
            );
            return name_end;
        }

        let Some(close) = matching_paren(text, name_end, end) else {
            let index = data.register(Token::new(Span::new(start, end), id));
            data.set_error(
                index,
                ParseErrorKind::MissingClosingParenthesis,
                format!("Missing ')' in call to {}", def.name),
            );
            return end;
        };

        let index = data.register(Token::new(Span::new(start, close + 1), id));
        let args = self.split_arguments(text, Span::new(name_end + 1, close));
        if let Some(position) = args
            .iter()
            .position(|arg| text[arg.start..arg.end].trim().is_empty())
        {
            data.set_error(
                index,
                ParseErrorKind::MissingArgument,
                format!("Missing argument {} in call to {}", position + 1, def.name),
            );
        } else if !def.accepts(args.len()) {
            data.set_error(
                index,
                ParseErrorKind::WrongArgumentCount,
                format!(
                    "{} expects {} argument(s), got {}",
                    def.name,
                    def.arity(),
                    args.len()
                ),
            );
        }
        close + 1
    }
}

impl Default for FunctionParser {
    fn default() -> Self {
        Self::new(FunctionOptions::default())
    }
}

/// Whether an argument failed because two of its top-level operands touch,
/// which inside a call means a separator is missing
fn lacks_separator(data: &ParsingData<'_>, error: &ParseError) -> bool {
    error.kind == ParseErrorKind::MissingOperator
        && data
            .claimed_by(error.span.start)
            .map_or(false, |index| data.tokens()[index].span == error.span)
}

impl Recognizer for FunctionParser {
    fn name(&self) -> &'static str {
        "function"
    }

    fn parse(&self, data: &mut ParsingData<'_>, id: RecognizerId) {
        let text = data.text();
        let bytes = text.as_bytes();
        let range = data.range();
        let mut depth = 0usize;
        let mut pos = range.start;

        while pos < range.end {
            if let Some(claimed_end) = data.claimed_end(pos) {
                pos = claimed_end;
                continue;
            }
            match bytes[pos] {
                b'"' => {
                    pos = skip_string(text, pos, range.end);
                    continue;
                }
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b if is_ident_start(b) => {
                    let name_end = ident_end(bytes, pos, range.end);
                    if depth == 0 && !glued_to_word(text, range, pos) {
                        if let Some(def) = self.catalog.get(&text[pos..name_end]) {
                            pos = self.claim_call(data, id, def, pos, name_end);
                            continue;
                        }
                    }
                    pos = name_end;
                    continue;
                }
                _ => {}
            }
            pos += 1;
        }
    }

    fn create_element(
        &self,
        source: &str,
        token: &mut Token,
        pipeline: &ParserList,
    ) -> Result<Option<Element>, ParseError> {
        let span = token.span;
        let name_end = ident_end(source.as_bytes(), span.start, span.end);
        let name = &source[span.start..name_end];
        let def = self.catalog.get(name).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnknownToken,
                span,
                format!("Unknown function '{name}'"),
            )
        })?;

        let mut args = Vec::new();
        for arg in self.split_arguments(source, Span::new(name_end + 1, span.end - 1)) {
            let mut data = ParsingData::for_span(source, arg);
            match pipeline.run(&mut data) {
                Ok(expr) => args.push(expr),
                Err(error) if lacks_separator(&data, &error) => {
                    return Err(ParseError::new(
                        ParseErrorKind::MissingSeparator,
                        span,
                        format!("Missing separator between arguments of {}", def.name),
                    ));
                }
                Err(error) => return Err(error),
            }
        }

        let expr = Expression::Call {
            function: Arc::clone(def),
            args,
        };
        token.child = Some(expr.clone());
        Ok(Some(Element::Operand {
            expr,
            span,
            grouped: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EngineOptions;
    use crate::parse_formula;
    use pretty_assertions::assert_eq;

    fn kind_of(formula: &str) -> ParseErrorKind {
        parse_formula(formula).unwrap_err().kind
    }

    fn eval(formula: &str) -> Value {
        parse_formula(formula).unwrap().calc().unwrap()
    }

    #[test]
    fn test_calls() {
        assert_eq!(eval("MAX(MIN(1,3),MIN(2,4))"), Value::Int32(2));
        assert_eq!(eval("SUM(1, 2, 3)"), Value::Int32(6));
        assert_eq!(eval("PI()"), Value::Double(std::f64::consts::PI));
        assert_eq!(eval("PI( )"), Value::Double(std::f64::consts::PI));
        assert_eq!(eval("1+MAX(2,3)*2"), Value::Int32(7));
        assert_eq!(eval("-ABS(-4)"), Value::Int32(-4));
        assert_eq!(eval("max(1,2)"), Value::Int32(2));
    }

    #[test]
    fn test_display_uses_catalog_spelling() {
        assert_eq!(
            parse_formula("max( 1 ,min(2,3))").unwrap().to_string(),
            "MAX(1, MIN(2, 3))"
        );
    }

    #[test]
    fn test_separators_inside_strings_and_groups() {
        assert_eq!(eval("LEN(\"a,b\")"), Value::Int32(3));
        assert_eq!(eval("MAX((1),(2+3))"), Value::Int32(5));
        assert_eq!(eval("CONCATENATE(\"(\",\")\")"), Value::from("()"));
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(kind_of("MIN(1,2"), ParseErrorKind::MissingClosingParenthesis);
        assert_eq!(kind_of("MIN(1,,2)"), ParseErrorKind::MissingArgument);
        assert_eq!(kind_of("MIN(1,2,)"), ParseErrorKind::MissingArgument);
        assert_eq!(kind_of("MIN(,1)"), ParseErrorKind::MissingArgument);
        assert_eq!(kind_of("MIN(1 2)"), ParseErrorKind::MissingSeparator);
        assert_eq!(kind_of("MIN()"), ParseErrorKind::WrongArgumentCount);
        assert_eq!(kind_of("PI(1)"), ParseErrorKind::WrongArgumentCount);
        assert_eq!(kind_of("IF(TRUE(),1,2,3)"), ParseErrorKind::WrongArgumentCount);
        assert_eq!(kind_of("MIN"), ParseErrorKind::MissingOpeningParenthesis);
        assert_eq!(kind_of("MIN (1)"), ParseErrorKind::MissingOpeningParenthesis);
        assert_eq!(kind_of("NOSUCH(1)"), ParseErrorKind::UnknownToken);
    }

    #[test]
    fn test_error_attributed_to_call() {
        let err = parse_formula("1+MIN(1,,2)").unwrap_err();
        assert_eq!(err.span, Span::new(2, 11));
        assert_eq!(err.message, "Missing argument 2 in call to MIN");

        let err = parse_formula("MIN(1,2").unwrap_err();
        assert_eq!(err.span, Span::new(0, 7));

        let err = parse_formula("SQRT(1,2)").unwrap_err();
        assert_eq!(err.message, "SQRT expects 1 argument(s), got 2");
    }

    #[test]
    fn test_errors_inside_arguments() {
        // Errors nested in an argument keep their own location
        let err = parse_formula("MAX(1,2+)").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingOperand);
        assert_eq!(err.span, Span::new(7, 8));

        // Touching operands inside a nested group are not a separator problem
        assert_eq!(kind_of("MIN((1 2),3)"), ParseErrorKind::MissingOperator);
    }

    #[test]
    fn test_name_must_stand_alone() {
        assert_eq!(kind_of("XMAX(1,2)"), ParseErrorKind::UnknownToken);
        assert_eq!(kind_of("1MAX(1,2)"), ParseErrorKind::UnknownToken);
    }

    #[test]
    fn test_case_sensitive_catalog() {
        let options = FunctionOptions::default().with_case_sensitive(true);
        let parser = ParserList::with_options(EngineOptions::default().with_functions(options));
        assert!(parser.parse_formula("MAX(1,2)").is_ok());
        assert_eq!(
            parser.parse_formula("max(1,2)").unwrap_err().kind,
            ParseErrorKind::UnknownToken
        );
    }

    #[test]
    fn test_custom_separators() {
        let options = FunctionOptions::default().with_separators([";", "|"]);
        let parser = ParserList::with_options(EngineOptions::default().with_functions(options));
        let expr = parser.parse_formula("MAX(1;5|3)").unwrap();
        assert_eq!(expr.calc().unwrap(), Value::Int32(5));
        assert_eq!(
            parser.parse_formula("MAX(1,2)").unwrap_err().kind,
            ParseErrorKind::UnknownToken
        );
    }

    #[test]
    fn test_custom_function() {
        fn fn_double(args: &Arguments<'_>) -> EvalResult<Value> {
            Ok(Value::Int32(args.i32(0)? * 2))
        }

        let mut functions = FunctionParser::default();
        functions.add_function("DOUBLE", 1, Some(1), fn_double);
        assert!(functions.catalog().contains("double"));

        let mut parser = ParserList::new();
        parser.push(functions);
        parser.push(crate::parser::OperatorParser);
        parser.push(crate::parser::StringParser);
        parser.push(crate::parser::NumericParser::default());
        parser.push(crate::parser::SpaceParser);
        let expr = parser.parse_formula("DOUBLE(DOUBLE(3)) + 1").unwrap();
        assert_eq!(expr.calc().unwrap(), Value::Int32(13));
    }
}
