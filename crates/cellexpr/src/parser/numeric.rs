//! Numeric literals

use super::{glued_to_word, literal_element, Element, ParserList, Recognizer};
use crate::error::{ParseError, ParseErrorKind};
use crate::options::NumericOptions;
use crate::parsing_data::ParsingData;
use crate::token::{RecognizerId, Span, Token};
use crate::value::Value;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Significant digits a `Single` holds exactly
const SINGLE_DIGITS: usize = 7;
/// Significant digits a `Double` holds exactly
const DOUBLE_DIGITS: usize = 15;

/// Claims digit runs and types them by the narrowest enabled kind
#[derive(Debug, Clone, Default)]
pub struct NumericParser {
    options: NumericOptions,
}

/// A scanned literal, normalized to `.` and stripped of group separators
struct Literal {
    end: usize,
    digits: String,
    fractional: bool,
}

impl NumericParser {
    pub fn new(options: NumericOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NumericOptions {
        &self.options
    }

    fn starts_literal(&self, rest: &str) -> bool {
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some(c) if c == self.options.decimal_separator => {
                chars.next().map_or(false, |c| c.is_ascii_digit())
            }
            _ => false,
        }
    }

    fn scan(&self, text: &str, start: usize, end: usize) -> Literal {
        let separator = self.options.decimal_separator;
        let mut literal = Literal {
            end: start,
            digits: String::new(),
            fractional: false,
        };
        let mut chars = text[start..end].char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            let next_is_digit = chars.peek().map_or(false, |(_, n)| n.is_ascii_digit());
            if c.is_ascii_digit() {
                literal.digits.push(c);
            } else if c == separator && !literal.fractional {
                literal.fractional = true;
                if literal.digits.is_empty() {
                    literal.digits.push('0');
                }
                literal.digits.push('.');
            } else if Some(c) == self.options.group_separator
                && !literal.fractional
                && literal.digits.ends_with(|d: char| d.is_ascii_digit())
                && next_is_digit
            {
                // grouping only
            } else {
                break;
            }
            literal.end = start + offset + c.len_utf8();
        }

        if literal.digits.ends_with('.') {
            literal.digits.push('0');
        }
        literal
    }

    /// End of a run of digits and decimal separators starting at `start`
    fn malformed_end(&self, text: &str, start: usize, end: usize) -> usize {
        text[start..end]
            .char_indices()
            .find(|&(_, c)| !c.is_ascii_digit() && c != self.options.decimal_separator)
            .map_or(end, |(offset, _)| start + offset)
    }

    /// Narrowest enabled kind that holds the literal
    fn classify(&self, literal: &Literal) -> Option<Value> {
        let options = &self.options;
        let digits = literal.digits.as_str();
        if literal.fractional && !options.allows_fraction() {
            return None;
        }

        if !literal.fractional && options.allow_int32 {
            if let Ok(n) = digits.parse::<i32>() {
                return Some(Value::Int32(n));
            }
        }

        let significant = significant_digits(digits);
        if options.allow_single && significant <= SINGLE_DIGITS {
            if let Ok(x) = digits.parse::<f32>() {
                return Some(Value::Single(x));
            }
        }
        if options.allow_double && significant <= DOUBLE_DIGITS {
            if let Ok(x) = digits.parse::<f64>() {
                return Some(Value::Double(x));
            }
        }
        if options.allow_decimal {
            if let Ok(d) = Decimal::from_str(digits) {
                return Some(Value::Decimal(d));
            }
        }

        // Nothing holds it exactly; the widest float takes it approximately
        if options.allow_double {
            digits.parse::<f64>().ok().map(Value::Double)
        } else if options.allow_single {
            digits.parse::<f32>().ok().map(Value::Single)
        } else {
            None
        }
    }

    fn scan_span(&self, data: &mut ParsingData<'_>, id: RecognizerId, span: Span) {
        let text = data.text();
        let range = data.range();
        let mut pos = span.start;

        while pos < span.end {
            let rest = &text[pos..span.end];
            let Some(c) = rest.chars().next() else {
                break;
            };

            if !self.starts_literal(rest) {
                pos += c.len_utf8();
                continue;
            }

            if glued_to_word(text, range, pos) {
                // The tail of a word such as `A1`; leave it for the unknown sweep
                pos += rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                continue;
            }

            let literal = self.scan(text, pos, span.end);
            let after = &text[literal.end..span.end];
            if literal.fractional && after.starts_with(self.options.decimal_separator) {
                let end = self.malformed_end(text, literal.end, span.end);
                let token_span = Span::new(pos, end);
                let index = data.register(Token::new(token_span, id));
                data.set_error(
                    index,
                    ParseErrorKind::MalformedNumber,
                    format!("Malformed number '{}'", &text[pos..end]),
                );
                pos = end;
                continue;
            }

            let token_span = Span::new(pos, literal.end);
            match self.classify(&literal) {
                Some(value) => {
                    data.register(Token::new(token_span, id).with_value(value));
                }
                None => {
                    let index = data.register(Token::new(token_span, id));
                    data.set_error(
                        index,
                        ParseErrorKind::DisallowedLiteralType,
                        format!(
                            "Numeric literal '{}' is not allowed by the enabled numeric types",
                            &text[pos..literal.end]
                        ),
                    );
                }
            }
            pos = literal.end;
        }
    }
}

/// Significant digits of a normalized literal; trailing fractional zeros do
/// not count
fn significant_digits(digits: &str) -> usize {
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let all = format!("{whole}{}", fraction.trim_end_matches('0'));
    all.trim_start_matches('0').len().max(1)
}

impl Recognizer for NumericParser {
    fn name(&self) -> &'static str {
        "numeric"
    }

    fn parse(&self, data: &mut ParsingData<'_>, id: RecognizerId) {
        for span in data.unclaimed_spans() {
            self.scan_span(data, id, span);
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
    use crate::options::EngineOptions;
    use crate::parse_formula;
    use pretty_assertions::assert_eq;

    fn parser(numeric: NumericOptions) -> ParserList {
        ParserList::with_options(EngineOptions::default().with_numeric(numeric))
    }

    fn literal(parser: &ParserList, formula: &str) -> Value {
        parser.parse_formula(formula).unwrap().calc().unwrap()
    }

    #[test]
    fn test_default_kinds() {
        let parser = ParserList::standard();
        assert_eq!(literal(&parser, "42"), Value::Int32(42));
        assert_eq!(literal(&parser, "2.5"), Value::Double(2.5));
        assert_eq!(literal(&parser, ".5"), Value::Double(0.5));
        assert_eq!(literal(&parser, "3."), Value::Double(3.0));
        assert_eq!(literal(&parser, "2147483647"), Value::Int32(i32::MAX));
        assert_eq!(literal(&parser, "2147483648"), Value::Double(2147483648.0));
        assert_eq!(literal(&parser, "007"), Value::Int32(7));
    }

    #[test]
    fn test_narrowest_enabled_kind() {
        let all = NumericOptions::default().with_single(true).with_decimal(true);
        let parser = parser(all);
        assert_eq!(literal(&parser, "1.5"), Value::Single(1.5));
        assert_eq!(literal(&parser, "1.23456789"), Value::Double(1.23456789));
        assert_eq!(
            literal(&parser, "1.2345678901234567"),
            Value::Decimal(Decimal::from_str("1.2345678901234567").unwrap())
        );
    }

    #[test]
    fn test_without_int32() {
        let parser = parser(NumericOptions::default().with_int32(false));
        assert_eq!(literal(&parser, "2"), Value::Double(2.0));
    }

    #[test]
    fn test_widest_float_fallback() {
        let parser = ParserList::standard();
        assert_eq!(
            literal(&parser, "0.12345678901234567"),
            Value::Double(0.12345678901234567)
        );
    }

    #[test]
    fn test_int32_only_rejects_fractions() {
        let parser = parser(NumericOptions::int32_only());
        assert_eq!(literal(&parser, "2*2"), Value::Int32(4));

        let err = parser.parse_formula("2*2.5").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DisallowedLiteralType);
        assert_eq!(err.span, Span::new(2, 5));

        let err = parser.parse_formula("3000000000").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DisallowedLiteralType);
    }

    #[test]
    fn test_malformed() {
        let err = parse_formula("1.2.3+1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedNumber);
        assert_eq!(err.span, Span::new(0, 5));
    }

    #[test]
    fn test_separators() {
        let numeric = NumericOptions::default()
            .with_decimal_separator(',')
            .with_group_separator(Some('.'));
        let parser = parser(numeric);
        assert_eq!(literal(&parser, "1.234,5"), Value::Double(1234.5));
        assert_eq!(literal(&parser, "1.000"), Value::Int32(1000));

        let grouped = self::parser(NumericOptions::default().with_group_separator(Some(' ')));
        assert_eq!(literal(&grouped, "1 000 + 1"), Value::Int32(1001));
    }

    #[test]
    fn test_word_tails_are_not_numbers() {
        let err = parse_formula("A1+1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownToken);
        assert_eq!(err.span, Span::new(0, 2));
    }

    #[test]
    fn test_significant_digits() {
        assert_eq!(significant_digits("0.00120"), 2);
        assert_eq!(significant_digits("1000"), 4);
        assert_eq!(significant_digits("100.0"), 3);
        assert_eq!(significant_digits("0"), 1);
    }
}
