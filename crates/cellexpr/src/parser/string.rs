//! String literals

use super::{literal_element, Element, ParserList, Recognizer};
use crate::error::{ParseError, ParseErrorKind};
use crate::parsing_data::ParsingData;
use crate::token::{RecognizerId, Span, Token};
use crate::value::Value;

/// Claims double-quoted literals; `""` inside a literal is one quote
#[derive(Debug, Clone, Copy, Default)]
pub struct StringParser;

impl StringParser {
    /// Claim the literal opening at `start`; returns where scanning resumes
    fn claim_literal(
        &self,
        data: &mut ParsingData<'_>,
        id: RecognizerId,
        start: usize,
        end: usize,
    ) -> usize {
        let text = data.text();
        let mut value = String::new();
        let mut pos = start + 1;

        while let Some(offset) = text[pos..end].find('"') {
            let quote = pos + offset;
            value.push_str(&text[pos..quote]);
            if text[quote + 1..end].starts_with('"') {
                value.push('"');
                pos = quote + 2;
                continue;
            }
            let span = Span::new(start, quote + 1);
            data.register(Token::new(span, id).with_value(Value::String(value)));
            return quote + 1;
        }

        let index = data.register(Token::new(Span::new(start, end), id));
        data.set_error(
            index,
            ParseErrorKind::UnterminatedString,
            "Unterminated string literal",
        );
        end
    }
}

impl Recognizer for StringParser {
    fn name(&self) -> &'static str {
        "string"
    }

    fn parse(&self, data: &mut ParsingData<'_>, id: RecognizerId) {
        for span in data.unclaimed_spans() {
            let mut pos = span.start;
            while let Some(offset) = data.text()[pos..span.end].find('"') {
                pos = self.claim_literal(data, id, pos + offset, span.end);
            }
        }
    }

    fn create_element(
        &self,
        _source: &str,
        token: &mut Token,
        _pipeline: &ParserList,
    ) -> Result<Option<Element>, ParseError> {
        Ok(literal_element(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_formula;
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> Value {
        parse_formula(formula).unwrap().calc().unwrap()
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("\"hello\""), Value::from("hello"));
        assert_eq!(eval("\"\""), Value::from(""));
        assert_eq!(eval("\"say \"\"hi\"\"\""), Value::from("say \"hi\""));
        assert_eq!(eval("\"\"\"\""), Value::from("\""));
        assert_eq!(eval("\"a b\" + \"c\""), Value::from("a bc"));
        assert_eq!(eval("\"12\" + 3"), Value::from("123"));
    }

    #[test]
    fn test_unterminated() {
        let err = parse_formula("1 + \"abc").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert_eq!(err.span, Span::new(4, 8));

        let err = parse_formula("\"a\"\"").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn test_adjacent_literals_need_operator() {
        let err = parse_formula("\"a\" \"b\"").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingOperator);
    }
}
