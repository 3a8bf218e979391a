//! Whitespace
//!
//! Space tokens produce no element, but they occupy their span so that no
//! other token reaches across them.

use super::{Element, ParserList, Recognizer};
use crate::error::ParseError;
use crate::parsing_data::ParsingData;
use crate::token::{RecognizerId, Span, Token};

#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceParser;

impl Recognizer for SpaceParser {
    fn name(&self) -> &'static str {
        "space"
    }

    fn parse(&self, data: &mut ParsingData<'_>, id: RecognizerId) {
        for span in data.unclaimed_spans() {
            let mut run_start: Option<usize> = None;
            for (offset, c) in data.text()[span.start..span.end].char_indices() {
                let pos = span.start + offset;
                match (c.is_whitespace(), run_start) {
                    (true, None) => run_start = Some(pos),
                    (false, Some(start)) => {
                        data.register(Token::new(Span::new(start, pos), id));
                        run_start = None;
                    }
                    _ => {}
                }
            }
            if let Some(start) = run_start {
                data.register(Token::new(Span::new(start, span.end), id));
            }
        }
    }

    fn create_element(
        &self,
        _source: &str,
        _token: &mut Token,
        _pipeline: &ParserList,
    ) -> Result<Option<Element>, ParseError> {
        Ok(None)
    }
}
